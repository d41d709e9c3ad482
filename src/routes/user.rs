use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::user::{CreateUserRequest, ScoreQuery, ScoreResponse, UpdateScoreRequest, UserResponse},
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Routes exposing player records and their scores.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/user", post(create_user))
        .route("/user/score", get(get_score).post(update_score))
        .route("/user/{entity_id}", get(get_user))
}

/// Register a new player and return the stored record.
#[utoipa::path(
    post,
    path = "/user",
    tag = "user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Missing or invalid username"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_user(
    State(state): State<SharedState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, AppError> {
    let Json(payload) = payload?;
    let user = user_service::create_user(&state, payload).await?;
    Ok(Json(user))
}

/// Fetch a full player record.
#[utoipa::path(
    get,
    path = "/user/{entity_id}",
    tag = "user",
    params(("entity_id" = String, Path, description = "Identifier returned at creation")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "No user with this identifier")
    )
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Path(entity_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = user_service::get_user(&state, &entity_id).await?;
    Ok(Json(user))
}

/// Read the current score of a player.
#[utoipa::path(
    get,
    path = "/user/score",
    tag = "user",
    params(ScoreQuery),
    responses(
        (status = 200, description = "Current score", body = ScoreResponse),
        (status = 400, description = "Missing entityId"),
        (status = 404, description = "No user with this identifier")
    )
)]
pub async fn get_score(
    State(state): State<SharedState>,
    query: Result<Query<ScoreQuery>, QueryRejection>,
) -> Result<Json<ScoreResponse>, AppError> {
    let Query(query) = query?;
    let score = user_service::get_score(&state, query).await?;
    Ok(Json(score))
}

/// Replace the score of a player, leaving every other field untouched.
#[utoipa::path(
    post,
    path = "/user/score",
    tag = "user",
    request_body = UpdateScoreRequest,
    responses(
        (status = 204, description = "Score updated"),
        (status = 400, description = "Malformed request"),
        (status = 404, description = "No user with this identifier")
    )
)]
pub async fn update_score(
    State(state): State<SharedState>,
    payload: Result<Json<UpdateScoreRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(payload) = payload?;
    user_service::update_score(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
