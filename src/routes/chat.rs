use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::chat_handlers;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Ask the bot
        .route("/chat", post(chat_handlers::chatbot))
        // Own conversation, oldest first
        .route("/chat/history", get(chat_handlers::chat_history))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
