use std::{error::Error, time::Duration};

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::time::timeout;
use tracing::warn;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend failed or answered with something unusable.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// Human readable summary of the failure.
        message: String,
        /// Backend error that caused it.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The caller stopped waiting for the backend.
    #[error("storage operation `{operation}` timed out after {after:?}")]
    Timeout {
        /// Store operation that was waited on.
        operation: &'static str,
        /// Deadline that expired.
        after: Duration,
    },
    /// Optimistic writes kept hitting newer revisions.
    #[error("gave up updating `{id}` after {attempts} conflicting attempt(s)")]
    Conflict {
        /// Record the update targeted.
        id: String,
        /// Attempts made before giving up.
        attempts: u32,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Wait at most `after` for a backend call.
///
/// The call runs on its own task: once issued it always runs to completion, an expired
/// deadline only releases the caller with [`StorageError::Timeout`].
pub async fn bounded<T>(
    operation: &'static str,
    after: Duration,
    call: BoxFuture<'static, StorageResult<T>>,
) -> StorageResult<T>
where
    T: Send + 'static,
{
    let mut task = tokio::spawn(call);
    match timeout(after, &mut task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(StorageError::unavailable(
            format!("storage operation `{operation}` aborted"),
            join_err,
        )),
        Err(_) => {
            warn!(operation, ?after, "storage operation timed out; leaving it to finish");
            Err(StorageError::Timeout { operation, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use tokio::time::sleep;

    use super::*;

    #[tokio::test]
    async fn expired_deadline_leaves_the_call_running() {
        let landed = Arc::new(AtomicBool::new(false));
        let flag = landed.clone();
        let call: BoxFuture<'static, StorageResult<()>> = Box::pin(async move {
            sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = bounded("update_score", Duration::from_millis(10), call)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Timeout {
                operation: "update_score",
                ..
            }
        ));
        assert!(!landed.load(Ordering::SeqCst));

        sleep(Duration::from_millis(200)).await;
        assert!(landed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panicking_call_is_reported_as_unavailable() {
        let call: BoxFuture<'static, StorageResult<()>> = Box::pin(async { panic!("driver bug") });

        let err = bounded("find_user", Duration::from_secs(1), call)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn fast_calls_return_their_result() {
        let call: BoxFuture<'static, StorageResult<u8>> = Box::pin(async { Ok(7) });
        assert_eq!(
            bounded("find_user", Duration::from_secs(1), call)
                .await
                .unwrap(),
            7
        );
    }
}
