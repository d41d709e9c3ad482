use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::UserEntity;

/// Player record as stored in the `users` collection, keyed by `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    pub entity_id: String,
    pub username: String,
    pub score: i64,
    #[serde(rename = "noOfGamesPlayed")]
    pub games_played: i64,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            entity_id: value.entity_id,
            username: value.username,
            score: value.score,
            games_played: value.games_played,
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            entity_id: value.entity_id,
            username: value.username,
            score: value.score,
            games_played: value.games_played,
        }
    }
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

/// Single-field update touching nothing but the score.
pub fn set_score(score: i64) -> Document {
    doc! {"$set": {"score": score}}
}
