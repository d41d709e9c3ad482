use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod user;

/// Compose the record, health and documentation routes over the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(user::router())
        .merge(docs::router())
        .with_state(state)
}
