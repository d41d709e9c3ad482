use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::dao::{
    models::UserEntity,
    storage::{StorageError, StorageResult},
    user_store::{
        UserStore,
        retry::{Attempt, RetryPolicy, retry_on_conflict},
    },
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchUserDocument, user_doc_id},
};

/// Result of a revision-checked document write.
enum WriteOutcome {
    Written,
    /// CouchDB answered `409`: the document exists or its revision moved on.
    Conflict,
}

/// CouchDB-backed [`UserStore`].
///
/// Score updates are optimistic: read the document with its `_rev`, write it back with that
/// revision, and start over when CouchDB reports a conflict, within the bounds of the
/// configured [`RetryPolicy`].
#[derive(Clone)]
pub struct CouchUserStore {
    client: Client,
    base_url: Url,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    retry: RetryPolicy,
}

impl CouchUserStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig, retry: RetryPolicy) -> CouchResult<Self> {
        let invalid = |reason: String| CouchDaoError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.base_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".into()));
        }

        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let auth = config
            .credentials
            .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass)));

        let store = Self {
            client,
            base_url,
            database: Arc::from(config.database),
            auth,
            retry,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some((user, pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    /// URL of the database, or of one document in it when `doc_id` is given.
    ///
    /// Both are appended as single percent-encoded path segments, so `/`, `?` or `..` inside
    /// an id never change which resource is addressed.
    fn url(&self, doc_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // Cannot fail: `connect` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.database).extend(doc_id);
        }
        url
    }

    fn request(&self, method: Method, doc_id: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.request(method, self.url(Some(doc_id))))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.url(None);

        let response = self
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means another instance created it first.
                if create.status().is_success()
                    || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<WriteOutcome>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Ok(WriteOutcome::Conflict),
            status if status.is_success() => Ok(WriteOutcome::Written),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn insert_user(&self, user: UserEntity) -> CouchResult<()> {
        let doc = CouchUserDocument::from(user);
        match self.put_document(&doc.id, &doc).await? {
            WriteOutcome::Written => Ok(()),
            WriteOutcome::Conflict => Err(CouchDaoError::DocumentExists { path: doc.id }),
        }
    }

    async fn find_user(&self, id: &str) -> CouchResult<Option<UserEntity>> {
        let doc = self
            .get_document::<CouchUserDocument>(&user_doc_id(id))
            .await?;
        Ok(doc.map(Into::into))
    }

    /// One optimistic read-modify-write cycle against the revision observed on read.
    async fn try_update_score(&self, id: &str, score: i64) -> CouchResult<Attempt<bool>> {
        let doc_id = user_doc_id(id);
        let Some(mut doc) = self.get_document::<CouchUserDocument>(&doc_id).await? else {
            return Ok(Attempt::Done(false));
        };

        doc.user.score = score;
        match self.put_document(&doc_id, &doc).await? {
            WriteOutcome::Written => Ok(Attempt::Done(true)),
            WriteOutcome::Conflict => Ok(Attempt::Conflict),
        }
    }

    async fn update_score(&self, id: String, score: i64) -> StorageResult<bool> {
        let entity_id = id.as_str();
        retry_on_conflict(&self.retry, entity_id, || async move {
            self.try_update_score(entity_id, score)
                .await
                .map_err(StorageError::from)
        })
        .await
    }

    async fn health_check(&self) -> CouchResult<()> {
        let url = self.url(None);
        let response = self
            .authorize(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: url.to_string(),
                status: response.status(),
            })
        }
    }
}

impl UserStore for CouchUserStore {
    fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_user(user).await.map_err(Into::into) })
    }

    fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_user(&id).await.map_err(Into::into) })
    }

    fn update_score(&self, id: String, score: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_score(id, score).await })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.health_check().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }

    fn shutdown(&self) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}
