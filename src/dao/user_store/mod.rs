#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;
pub mod retry;

use std::{fmt, str::FromStr, sync::Arc};

use crate::dao::models::UserEntity;
use crate::dao::storage::{StorageError, StorageResult};
use futures::future::BoxFuture;
use serde::Deserialize;

use self::retry::RetryPolicy;

/// Abstraction over the persistence layer holding player records.
///
/// Implementations must make [`UserStore::update_score`] atomic per record: two concurrent
/// calls for the same id may never interleave a read and a write so that one of them is lost.
pub trait UserStore: Send + Sync {
    /// Insert a brand-new record; an existing record under the same id is never overwritten.
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the record stored under `id`, `None` when there is none.
    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Set the score of an existing record, returning `false` when no record matches `id`.
    fn update_score(&self, id: String, score: i64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection in place after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Release backend resources; the store must not be used afterwards.
    fn shutdown(&self) -> BoxFuture<'static, ()>;
}

/// Storage backends the service can run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map, lost on restart.
    Memory,
    /// MongoDB collection `users`.
    #[cfg(feature = "mongo-store")]
    Mongo,
    /// CouchDB database with `users::` documents.
    #[cfg(feature = "couch-store")]
    Couch,
}

impl StoreBackend {
    /// Lowercase name used in configuration and health reports.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            #[cfg(feature = "mongo-store")]
            StoreBackend::Mongo => "mongo",
            #[cfg(feature = "couch-store")]
            StoreBackend::Couch => "couch",
        }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        #[cfg(feature = "mongo-store")]
        {
            StoreBackend::Mongo
        }
        #[cfg(not(feature = "mongo-store"))]
        {
            StoreBackend::Memory
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            #[cfg(feature = "mongo-store")]
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            #[cfg(feature = "couch-store")]
            "couch" | "couchdb" => Ok(StoreBackend::Couch),
            other => Err(format!("unknown or disabled store backend `{other}`")),
        }
    }
}

/// Open a connection to the selected backend, reading its settings from the environment.
///
/// `retry` bounds the conflict retries of backends that update scores optimistically.
#[cfg_attr(not(feature = "couch-store"), allow(unused_variables))]
pub async fn connect(
    backend: StoreBackend,
    retry: RetryPolicy,
) -> Result<Arc<dyn UserStore>, StorageError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(memory::MemoryUserStore::new())),
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            let config = self::mongodb::MongoConfig::from_env().await?;
            let store = self::mongodb::MongoUserStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            let config = self::couchdb::CouchConfig::from_env();
            let store = self::couchdb::CouchUserStore::connect(config, retry).await?;
            Ok(Arc::new(store))
        }
    }
}
