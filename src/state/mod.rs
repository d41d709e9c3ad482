use std::{sync::Arc, time::Duration};

use tokio::sync::{RwLock, watch};

use crate::{
    dao::{
        ids::IdGenerator,
        user::UserRepository,
        user_store::{StoreBackend, UserStore},
    },
    error::ServiceError,
};

pub type SharedState = Arc<AppState>;

/// Central application state holding the installed storage backend.
pub struct AppState {
    user_store: RwLock<Option<Arc<dyn UserStore>>>,
    ids: Arc<dyn IdGenerator>,
    backend: StoreBackend,
    operation_timeout: Duration,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(
        backend: StoreBackend,
        ids: Arc<dyn IdGenerator>,
        operation_timeout: Duration,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            user_store: RwLock::new(None),
            ids,
            backend,
            operation_timeout,
            degraded: degraded_tx,
        })
    }

    /// Backend the service was configured with.
    pub fn backend(&self) -> StoreBackend {
        self.backend
    }

    /// Deadline applied to every storage call.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Obtain a handle to the current user store, if one is installed.
    pub async fn user_store(&self) -> Option<Arc<dyn UserStore>> {
        let guard = self.user_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new user store implementation and leave degraded mode.
    pub async fn install_user_store(&self, store: Arc<dyn UserStore>) {
        {
            let mut guard = self.user_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current user store, enter degraded mode and hand the store back so the
    /// caller can shut it down.
    pub async fn clear_user_store(&self) -> Option<Arc<dyn UserStore>> {
        let previous = {
            let mut guard = self.user_store.write().await;
            guard.take()
        };
        self.update_degraded(true);
        previous
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Return the installed store, or [`ServiceError::Degraded`] while storage is unhealthy.
    pub async fn require_user_store(&self) -> Result<Arc<dyn UserStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.user_store().await.ok_or(ServiceError::Degraded)
    }

    /// Record store bound to the installed backend.
    pub async fn users(&self) -> Result<UserRepository, ServiceError> {
        let store = self.require_user_store().await?;
        Ok(UserRepository::new(
            store,
            self.ids.clone(),
            self.operation_timeout,
        ))
    }
}
