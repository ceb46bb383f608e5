use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

#[cfg(test)]
mod test_support;

use config::AppConfig;
use database::connection::{ensure_indexes, get_db_client};
use services::chatbot_service::CustomResponses;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("⚙️ Configuration: {}", config.get_config_info());

    let db = get_db_client(&config).await?;
    if let Err(e) = ensure_indexes(&db).await {
        tracing::warn!("Failed to ensure indexes: {}", e);
    }

    let app_state = initialize_app_state(&config, &db).await?;
    let app = build_router(app_state);
    start_server(&config, app).await
}

async fn initialize_app_state(config: &AppConfig, db: &mongodb::Database) -> anyhow::Result<AppState> {
    let responses = CustomResponses::load(&config.custom_responses_path).await?;

    let app_state = match AppState::new(db, config, responses) {
        Ok(state) => {
            tracing::info!("✅ Mail, OTP and chatbot services initialized successfully");
            state
        }
        Err(e) => {
            tracing::error!("❌ Failed to initialize services: {}", e);
            return Err(e.into());
        }
    };

    // Expired and consumed codes are never matched again; clear the leftovers.
    match app_state.otp_service.purge_stale().await {
        Ok(0) => {}
        Ok(n) => tracing::info!("🧹 Purged {} stale OTP records", n),
        Err(e) => tracing::warn!("Failed to purge stale OTP records: {}", e),
    }

    Ok(app_state)
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .merge(routes::api_router(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn start_server(config: &AppConfig, app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("🚀 Server starting on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(e.into());
        }
    };
    axum::serve(listener, app).await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "🤖 ChatBot API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
