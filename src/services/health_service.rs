use tracing::warn;

use crate::{dao::storage::bounded, dto::health::HealthResponse, state::SharedState};

/// Report whether a healthy storage backend is installed, logging connectivity issues.
///
/// The backend ping is bounded by the configured operation timeout.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let backend = state.backend().as_str();

    let store = match state.require_user_store().await {
        Ok(store) => store,
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            return HealthResponse::degraded(backend);
        }
    };

    match bounded("health_check", state.operation_timeout(), store.health_check()).await {
        Ok(()) => HealthResponse::ok(backend),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(backend)
        }
    }
}
