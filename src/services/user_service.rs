//! Business logic behind the player record routes: validate the request, then delegate to
//! the record store bound to the installed backend.

use tracing::info;
use validator::Validate;

use crate::{
    dto::user::{CreateUserRequest, ScoreQuery, ScoreResponse, UpdateScoreRequest, UserResponse},
    error::ServiceError,
    state::SharedState,
};

/// Register a new player with a zero score.
pub async fn create_user(
    state: &SharedState,
    request: CreateUserRequest,
) -> Result<UserResponse, ServiceError> {
    request.validate()?;

    let user = state.users().await?.create(&request.username).await?;
    info!(entity_id = %user.entity_id, "user created");
    Ok(user.into())
}

/// Fetch a full player record.
pub async fn get_user(state: &SharedState, entity_id: &str) -> Result<UserResponse, ServiceError> {
    let user = state.users().await?.get(entity_id).await?;
    Ok(user.into())
}

/// Fetch only the score of a player.
pub async fn get_score(
    state: &SharedState,
    query: ScoreQuery,
) -> Result<ScoreResponse, ServiceError> {
    query.validate()?;

    let user = state.users().await?.get(&query.entity_id).await?;
    Ok(ScoreResponse { score: user.score })
}

/// Replace the score of an existing player.
pub async fn update_score(
    state: &SharedState,
    request: UpdateScoreRequest,
) -> Result<(), ServiceError> {
    request.validate()?;

    let UpdateScoreRequest { entity_id, score } = request;
    state
        .users()
        .await?
        .update_score(&entity_id, score)
        .await?;
    Ok(())
}
