pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod pipelines;
pub mod problems;
pub mod routes;
pub mod state;

/// Build the application state the shell hands to every route call.
///
/// Initializes structured logging, restores the persisted attempt
/// history, and wires the Gemini client from the loaded settings.
pub async fn bootstrap() -> state::app::AppState {
    logging::init_logging();
    tracing::info!("Bagrut coach core starting");

    let state = state::app::AppState::new();
    let restored = routes::restore_history(&state).await;
    tracing::info!(entries = restored, "History restored");

    state
}
