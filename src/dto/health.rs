use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: &'static str,
    /// Storage backend the service was configured with.
    pub backend: &'static str,
}

impl HealthResponse {
    /// The storage backend answered its health check.
    pub fn ok(backend: &'static str) -> Self {
        Self {
            status: "ok",
            backend,
        }
    }

    /// No healthy storage backend is installed.
    pub fn degraded(backend: &'static str) -> Self {
        Self {
            status: "degraded",
            backend,
        }
    }
}
