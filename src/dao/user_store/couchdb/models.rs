use serde::{Deserialize, Serialize};

use crate::dao::models::{USERS_COLLECTION, UserEntity};

const ID_SEPARATOR: &str = "::";

/// Player record stored as a CouchDB document.
///
/// `_rev` is the version token CouchDB checks on every write: a `PUT` carrying a stale
/// revision is rejected with `409 Conflict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchUserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub user: UserEntity,
}

impl From<UserEntity> for CouchUserDocument {
    fn from(user: UserEntity) -> Self {
        Self {
            id: user_doc_id(&user.entity_id),
            rev: None,
            user,
        }
    }
}

impl From<CouchUserDocument> for UserEntity {
    fn from(doc: CouchUserDocument) -> Self {
        doc.user
    }
}

/// Document id of a player record, namespaced by the `users` collection.
pub fn user_doc_id(entity_id: &str) -> String {
    format!("{USERS_COLLECTION}{ID_SEPARATOR}{entity_id}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn doc_ids_live_in_the_users_namespace() {
        assert_eq!(user_doc_id("abc-123"), "users::abc-123");
    }

    #[test]
    fn fresh_documents_omit_the_revision() {
        let doc = CouchUserDocument::from(UserEntity::new("abc", "alice"));
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "_id": "users::abc",
                "entityId": "abc",
                "username": "alice",
                "score": 0,
                "noOfGamesPlayed": 0,
            })
        );
    }

    #[test]
    fn stored_documents_expose_their_revision() {
        let raw = json!({
            "_id": "users::abc",
            "_rev": "3-deadbeef",
            "entityId": "abc",
            "username": "alice",
            "score": 7,
            "noOfGamesPlayed": 1,
        });

        let doc: CouchUserDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.rev.as_deref(), Some("3-deadbeef"));
        assert_eq!(doc.user.score, 7);
        assert_eq!(UserEntity::from(doc).games_played, 1);
    }
}
