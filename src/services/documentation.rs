use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the scorekeeper API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::user::create_user,
        crate::routes::user::get_user,
        crate::routes::user::get_score,
        crate::routes::user::update_score,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::user::CreateUserRequest,
            crate::dto::user::UserResponse,
            crate::dto::user::ScoreResponse,
            crate::dto::user::UpdateScoreRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "user", description = "Player records and scores"),
    )
)]
pub struct ApiDoc;
