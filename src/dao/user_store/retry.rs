//! Bounded retry loop for optimistic read-modify-write cycles.

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::dao::storage::{StorageError, StorageResult};

/// Outcome of one optimistic write attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The write went through against the version observed at read time.
    Done(T),
    /// Another writer changed the record in between; read again and retry.
    Conflict,
}

/// Bounds applied to version-conflict retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made before giving up, the first one included.
    pub max_attempts: u32,
    /// Pause after the first failed attempt.
    pub initial_backoff: Duration,
    /// Ceiling for the doubling pause.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Pause following `current`: doubled, capped at `max_backoff`.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current * 2).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(200),
        }
    }
}

/// Run `attempt` until it reports [`Attempt::Done`], sleeping with jittered exponential
/// backoff between conflicts.
///
/// Only [`Attempt::Conflict`] is retried; any `Err` from `attempt` is returned as-is. Once
/// `policy.max_attempts` conflicts have been seen the loop gives up with
/// [`StorageError::Conflict`].
pub async fn retry_on_conflict<T, F, Fut>(
    policy: &RetryPolicy,
    id: &str,
    mut attempt: F,
) -> StorageResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StorageResult<Attempt<T>>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;

    for attempts in 1..=max_attempts {
        match attempt().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Conflict if attempts < max_attempts => {
                debug!(entity_id = %id, attempts, "version conflict; retrying");
                sleep(jittered(backoff)).await;
                backoff = policy.next_backoff(backoff);
            }
            Attempt::Conflict => break,
        }
    }

    warn!(entity_id = %id, attempts = max_attempts, "version conflicts exhausted retries");
    Err(StorageError::Conflict {
        id: id.to_owned(),
        attempts: max_attempts,
    })
}

/// Spread concurrent retries over `[backoff / 2, backoff]`.
fn jittered(backoff: Duration) -> Duration {
    let millis = backoff.as_millis() as u64;
    if millis < 2 {
        return backoff;
    }
    Duration::from_millis(rand::rng().random_range(millis / 2..=millis))
}
