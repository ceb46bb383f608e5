use axum::{routing::post, Router};

use crate::handlers::contact;
use crate::state::AppState;

pub mod auth;
pub mod auth_otp_routes;
pub mod chat;

/// Every `/api` route, with state applied.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api", chat::routes(state.clone()))
        .nest("/api", auth_otp_routes::auth_otp_routes()) // OTP routes
        .route("/api/contact", post(contact::contact_form))
        .with_state(state)
}
