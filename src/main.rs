use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coverquiz::{api, auth, broadcast, config::ServerConfig, state::AppState, ws};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coverquiz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting coverquiz...");

    let config = ServerConfig::from_env();
    let state = Arc::new(AppState::with_defaults(
        config.game_config(),
        config.access_codes.clone(),
    ));

    if let Some(path) = &config.songs_path {
        match state.load_songs_from_file(path).await {
            Ok(count) => tracing::info!("Loaded {} songs from {}", count, path.display()),
            Err(e) => tracing::warn!("{}; using the built-in catalog", e),
        }
    }
    state.create_game().await;

    // Background tasks: auto-grading and the answer timer
    broadcast::spawn_auto_grader(state.clone());
    broadcast::spawn_timer_watcher(state.clone());

    let gate = auth::AccessGate::new(state.clone(), config.access_gate_enabled);

    // State backup routes (admin PIN header)
    let admin_api_routes = Router::new()
        .route("/api/state/export", get(api::export_state))
        .route("/api/state/import", post(api::import_state))
        .route_layer(middleware::from_fn_with_state(
            gate.clone(),
            auth::admin_api_middleware,
        ));

    // WebSocket route with access code check
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            gate,
            auth::ws_access_middleware,
        ));

    let app = Router::new()
        .route("/api/songs", get(api::list_songs))
        .merge(ws_routes)
        .merge(admin_api_routes)
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
