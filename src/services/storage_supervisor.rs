use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{
        storage::{StorageError, bounded},
        user_store::UserStore,
    },
    state::SharedState,
};

/// Timing knobs of the supervision loop.
#[derive(Debug, Clone, Copy)]
pub struct SupervisorSettings {
    /// First pause between failed connection attempts.
    pub initial_delay: Duration,
    /// Ceiling for the doubling pause.
    pub max_delay: Duration,
    /// Pause between health checks of a healthy store.
    pub health_poll_interval: Duration,
    /// In-place reconnects tried before the store is dropped and rebuilt.
    pub max_reconnect_attempts: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
            health_poll_interval: Duration::from_secs(5),
            max_reconnect_attempts: 3,
        }
    }
}

/// Connect to the storage backend, install it into the shared state and keep watching it,
/// staying in degraded mode whenever it is unavailable.
///
/// When in-place reconnects are exhausted the store is dropped, shut down, and a fresh
/// connection is attempted with exponential backoff.
pub async fn run<F, Fut>(state: SharedState, settings: SupervisorSettings, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn UserStore>, StorageError>> + Send,
{
    let mut delay = settings.initial_delay;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_user_store(store.clone()).await;
                info!(backend = %state.backend(), "storage connection established; leaving degraded mode");
                delay = settings.initial_delay;

                watch_store(&state, &settings, store.as_ref()).await;

                if let Some(stale) = state.clear_user_store().await {
                    stale.shutdown().await;
                }
                sleep(delay).await;
                delay = (delay * 2).min(settings.max_delay);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(settings.max_delay);
            }
        }
    }
}

/// Poll the store until it fails and cannot be reconnected in place.
async fn watch_store(state: &SharedState, settings: &SupervisorSettings, store: &dyn UserStore) {
    loop {
        match bounded("health_check", state.operation_timeout(), store.health_check()).await {
            Ok(()) => {
                if state.is_degraded() {
                    info!("storage healthy again; leaving degraded mode");
                    state.update_degraded(false);
                }
                sleep(settings.health_poll_interval).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                if !reconnect(state, settings, store).await {
                    warn!("exhausted storage reconnect attempts; staying in degraded mode");
                    return;
                }
                state.update_degraded(false);
                sleep(settings.health_poll_interval).await;
            }
        }
    }
}

async fn reconnect(state: &SharedState, settings: &SupervisorSettings, store: &dyn UserStore) -> bool {
    let mut reconnect_delay = settings.initial_delay;

    for attempt in 0..settings.max_reconnect_attempts {
        match store.try_reconnect().await {
            Ok(()) => {
                info!("storage reconnection succeeded after health check failure");
                return true;
            }
            Err(reconnect_err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %reconnect_err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(settings.max_delay);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        sync::atomic::{AtomicBool, AtomicU32, Ordering},
    };

    use futures::future::BoxFuture;
    use tokio::time::timeout;

    use super::*;
    use crate::dao::{
        ids::UuidGenerator,
        models::UserEntity,
        storage::StorageResult,
        user_store::{StoreBackend, memory::MemoryUserStore},
    };
    use crate::state::AppState;

    const WAIT: Duration = Duration::from_secs(5);

    fn fast() -> SupervisorSettings {
        SupervisorSettings {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            health_poll_interval: Duration::from_millis(5),
            max_reconnect_attempts: 2,
        }
    }

    fn state() -> SharedState {
        AppState::new(
            StoreBackend::Memory,
            Arc::new(UuidGenerator),
            Duration::from_secs(1),
        )
    }

    async fn wait_degraded(state: &SharedState, expected: bool) {
        let mut watcher = state.degraded_watcher();
        timeout(WAIT, watcher.wait_for(|degraded| *degraded == expected))
            .await
            .expect("degraded flag did not change in time")
            .unwrap();
    }

    /// Memory store whose health can be switched off from the test.
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryUserStore,
        down: Arc<AtomicBool>,
        shutdowns: Arc<AtomicU32>,
    }

    impl FlakyStore {
        fn status(&self) -> StorageResult<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(StorageError::unavailable(
                    "backend down".into(),
                    io::Error::other("down"),
                ))
            } else {
                Ok(())
            }
        }
    }

    impl UserStore for FlakyStore {
        fn insert_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.insert_user(user)
        }
        fn find_user(&self, id: String) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
            self.inner.find_user(id)
        }
        fn update_score(&self, id: String, score: i64) -> BoxFuture<'static, StorageResult<bool>> {
            self.inner.update_score(id, score)
        }
        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            let status = self.status();
            Box::pin(async move { status })
        }
        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            let status = self.status();
            Box::pin(async move { status })
        }
        fn shutdown(&self) -> BoxFuture<'static, ()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    #[tokio::test]
    async fn retries_failed_connections_until_a_store_is_installed() {
        let state = state();
        let attempts = Arc::new(AtomicU32::new(0));

        let counter = attempts.clone();
        let task = tokio::spawn(run(state.clone(), fast(), move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(StorageError::unavailable(
                        "refused".into(),
                        io::Error::other("refused"),
                    ))
                } else {
                    Ok(Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>)
                }
            }
        }));

        wait_degraded(&state, false).await;
        assert!(attempts.load(Ordering::SeqCst) >= 3);
        assert!(state.users().await.is_ok());
        task.abort();
    }

    #[tokio::test]
    async fn enters_and_leaves_degraded_mode_with_backend_health() {
        let state = state();
        let store = FlakyStore::default();

        let installed = store.clone();
        let task = tokio::spawn(run(state.clone(), fast(), move || {
            let store = installed.clone();
            async move { Ok(Arc::new(store) as Arc<dyn UserStore>) }
        }));

        wait_degraded(&state, false).await;

        store.down.store(true, Ordering::SeqCst);
        wait_degraded(&state, true).await;
        assert!(matches!(
            state.users().await.err(),
            Some(crate::error::ServiceError::Degraded)
        ));

        store.down.store(false, Ordering::SeqCst);
        wait_degraded(&state, false).await;
        assert!(state.users().await.is_ok());
        task.abort();
    }

    #[tokio::test]
    async fn exhausted_reconnects_shut_the_stale_store_down() {
        let state = state();
        let store = FlakyStore::default();
        store.down.store(true, Ordering::SeqCst);

        let installed = store.clone();
        let task = tokio::spawn(run(state.clone(), fast(), move || {
            let store = installed.clone();
            async move { Ok(Arc::new(store) as Arc<dyn UserStore>) }
        }));

        timeout(WAIT, async {
            while store.shutdowns.load(Ordering::SeqCst) == 0 {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("stale store was never shut down");
        task.abort();
    }
}
