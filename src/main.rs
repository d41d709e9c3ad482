//! Scorekeeper binary entrypoint wiring configuration, storage supervision, and REST routes.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use scorekeeper_back::{
    config::AppConfig,
    dao::{ids::UuidGenerator, user_store},
    routes,
    services::storage_supervisor::{self, SupervisorSettings},
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    info!(backend = %config.backend, port = config.port, "configuration loaded");

    let app_state = AppState::new(
        config.backend,
        Arc::new(UuidGenerator),
        config.operation_timeout,
    );

    let backend = config.backend;
    let retry = config.score_update_retry;
    let supervisor = tokio::spawn(storage_supervisor::run(
        app_state.clone(),
        SupervisorSettings::default(),
        move || user_store::connect(backend, retry),
    ));

    let app = build_router(app_state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    supervisor.abort();
    if let Some(store) = app_state.clear_user_store().await {
        store.shutdown().await;
    }
    info!("server stopped");

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
