use axum::{middleware, routing::post, Router};

use crate::handlers::auth;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/delete-account", post(auth::delete_account))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/signup", post(auth::signup))
        .route("/verify-otp", post(auth::verify_signup_otp))
        .route("/resend-otp", post(auth::resend_signup_otp))
        .route("/login", post(auth::login))
        .merge(protected)
}
