//! Player record repository: the single entry point for creating, reading and scoring
//! records, whatever backend is installed.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use crate::dao::{
    ids::IdGenerator,
    models::UserEntity,
    storage::{self, StorageError, StorageResult},
    user_store::UserStore,
};

/// Failures surfaced by [`UserRepository`].
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No record exists under the requested id.
    #[error("user `{id}` not found")]
    NotFound {
        /// Identifier that matched nothing.
        id: String,
    },
    /// The backend could not complete the operation.
    #[error(transparent)]
    Persistence(#[from] StorageError),
}

/// Record store operations over an injected backend and id source.
///
/// Every backend call is bounded by `timeout`; an expired call is reported as
/// [`StorageError::Timeout`] while the backend operation itself runs to completion.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
    ids: Arc<dyn IdGenerator>,
    timeout: Duration,
}

impl UserRepository {
    /// Bind the repository to a backend, an id source and a per-call deadline.
    pub fn new(store: Arc<dyn UserStore>, ids: Arc<dyn IdGenerator>, timeout: Duration) -> Self {
        Self {
            store,
            ids,
            timeout,
        }
    }

    /// Create a fresh record under a newly generated id.
    ///
    /// The record is written once with an insert-only primitive; on error the id is never
    /// handed out and nothing is readable under it.
    pub async fn create(&self, username: &str) -> Result<UserEntity, RepositoryError> {
        let user = UserEntity::new(self.ids.next_id(), username);
        self.bounded("insert_user", self.store.insert_user(user.clone()))
            .await?;
        debug!(entity_id = %user.entity_id, "user record created");
        Ok(user)
    }

    /// Fetch the record stored under `id`.
    pub async fn get(&self, id: &str) -> Result<UserEntity, RepositoryError> {
        self.bounded("find_user", self.store.find_user(id.to_owned()))
            .await?
            .ok_or_else(|| RepositoryError::NotFound { id: id.to_owned() })
    }

    /// Atomically replace the score of the record stored under `id`.
    pub async fn update_score(&self, id: &str, score: i64) -> Result<(), RepositoryError> {
        let updated = self
            .bounded("update_score", self.store.update_score(id.to_owned(), score))
            .await?;
        if !updated {
            return Err(RepositoryError::NotFound { id: id.to_owned() });
        }
        debug!(entity_id = %id, score, "user score updated");
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: BoxFuture<'static, StorageResult<T>>,
    ) -> StorageResult<T>
    where
        T: Send + 'static,
    {
        storage::bounded(operation, self.timeout, call).await
    }
}
