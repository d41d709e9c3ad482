//! Process-local [`UserStore`] used for development and tests.

use std::{io, sync::Arc};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    models::UserEntity,
    storage::{StorageError, StorageResult},
    user_store::UserStore,
};

/// In-memory store keyed by entity id.
///
/// Score updates mutate the record in place while holding the shard write lock of its key,
/// so concurrent updates on one id are serialized and never read a stale copy.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, UserEntity>>,
}

impl MemoryUserStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, user: UserEntity) -> StorageResult<()> {
        match self.users.entry(user.entity_id.clone()) {
            Entry::Occupied(_) => Err(StorageError::unavailable(
                format!("record `{}` already exists", user.entity_id),
                io::Error::from(io::ErrorKind::AlreadyExists),
            )),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    fn set_score(&self, id: &str, score: i64) -> bool {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.score = score;
                true
            }
            None => false,
        }
    }
}

impl UserStore for MemoryUserStore {
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert(user) })
    }

    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.users.get(&id).map(|user| user.value().clone())) })
    }

    fn update_score(&self, id: String, score: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.set_score(&id, score)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}
