/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Storage connection supervision and degraded-mode tracking.
pub mod storage_supervisor;
/// Player record operations.
pub mod user_service;
