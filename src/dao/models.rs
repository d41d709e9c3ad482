use serde::{Deserialize, Serialize};

/// Name of the single collection holding every player record.
pub const USERS_COLLECTION: &str = "users";

/// Player record persisted by the storage layer and shared across layers.
///
/// The serialized form is the record encoding stored under its key: exactly four
/// named fields, `entityId`, `username`, `score` and `noOfGamesPlayed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// Opaque identifier assigned at creation; the store key.
    pub entity_id: String,
    /// Display name chosen at creation.
    pub username: String,
    /// Current score, the only mutable field.
    pub score: i64,
    /// Number of games played by this player.
    #[serde(rename = "noOfGamesPlayed")]
    pub games_played: i64,
}

impl UserEntity {
    /// Build a fresh record with zeroed counters.
    pub fn new(entity_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            username: username.into(),
            score: 0,
            games_played: 0,
        }
    }
}
