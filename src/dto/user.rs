//! Request and response payloads of the player record API.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::UserEntity;
use crate::dto::validation::{validate_entity_id, validate_username};

/// Payload used to register a new player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
}

/// Player record as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub entity_id: String,
    pub username: String,
    pub score: i64,
    #[serde(rename = "noOfGamesPlayed")]
    pub games_played: i64,
}

impl From<UserEntity> for UserResponse {
    fn from(value: UserEntity) -> Self {
        Self {
            entity_id: value.entity_id,
            username: value.username,
            score: value.score,
            games_played: value.games_played,
        }
    }
}

/// Query string selecting the player whose score is requested.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ScoreQuery {
    /// Identifier returned when the player was created.
    #[serde(default)]
    #[validate(custom(function = "validate_entity_id"))]
    pub entity_id: String,
}

/// Current score of a single player.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScoreResponse {
    pub score: i64,
}

/// Request replacing the score of an existing player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    #[validate(custom(function = "validate_entity_id"))]
    pub entity_id: String,
    pub score: i64,
}
