use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoUserDocument, doc_id, set_score},
};
use crate::dao::{
    models::{USERS_COLLECTION, UserEntity},
    storage::StorageResult,
    user_store::UserStore,
};

/// MongoDB-backed [`UserStore`].
///
/// Score updates are a single `$set` on the `score` field, which MongoDB applies atomically
/// at document level; no read precedes the write.
#[derive(Clone)]
pub struct MongoUserStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoUserStore {
    /// Establish a connection to MongoDB.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        Ok(Self { inner })
    }

    async fn collection(&self) -> Collection<MongoUserDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoUserDocument>(USERS_COLLECTION)
    }

    async fn insert_user(&self, user: UserEntity) -> MongoResult<()> {
        let id = user.entity_id.clone();
        let document: MongoUserDocument = user.into();
        self.collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::InsertUser { id, source })?;
        Ok(())
    }

    async fn find_user(&self, id: String) -> MongoResult<Option<UserEntity>> {
        let document = self
            .collection()
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::LoadUser { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn update_score(&self, id: String, score: i64) -> MongoResult<bool> {
        let result = self
            .collection()
            .await
            .update_one(doc_id(&id), set_score(score))
            .await
            .map_err(|source| MongoDaoError::UpdateScore { id, source })?;

        Ok(result.matched_count > 0)
    }

    async fn shutdown(&self) {
        let client = {
            let guard = self.inner.state.read().await;
            guard.client.clone()
        };
        client.shutdown().await;
    }
}

impl UserStore for MongoUserStore {
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await.map_err(Into::into) })
    }

    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(id).await.map_err(Into::into) })
    }

    fn update_score(&self, id: String, score: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_score(id, score).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        let store = self.clone();
        Box::pin(async move { store.shutdown().await })
    }
}
