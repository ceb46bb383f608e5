use axum::{routing::post, Router};

use crate::{handlers::auth_otp, state::AppState};

pub fn auth_otp_routes() -> Router<AppState> {
    Router::new()
        // Request OTP for password reset
        .route("/auth/forgot-password", post(auth_otp::forgot_password))
        // Verify OTP, returns a short-lived reset token
        .route("/auth/reset-password-otp", post(auth_otp::verify_reset_otp))
        // Reset password with verified OTP
        .route("/auth/reset-password", post(auth_otp::reset_password))
        .route("/auth/resend-otp-password", post(auth_otp::resend_reset_otp))
}
