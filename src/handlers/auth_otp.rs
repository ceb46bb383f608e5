use axum::{extract::State, Json};
use bcrypt::hash;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::dtos::auth_dtos::{
    ForgotPasswordRequest, MessageResponse, OTPSentResponse, ResendOTPRequest, ResetOTPVerifiedResponse,
    ResetPasswordRequest, VerifyOTPRequest,
};
use crate::errors::{AppError, Result};
use crate::handlers::auth::auth_response;
use crate::models::otp::{OtpPayload, OtpPurpose};
use crate::models::user::AuthResponse;
use crate::state::AppState;

// 1. Forgot Password - Request OTP
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<OTPSentResponse>> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::AccountNotFound)?;
    let user_id = user
        .id_hex()
        .ok_or_else(|| AppError::internal_server_error("User ID not found"))?;

    let payload = OtpPayload::PendingReset {
        email: email.clone(),
        user_id,
    };
    state
        .otp_service
        .issue(payload, OtpPurpose::PasswordReset)
        .await?;

    Ok(Json(OTPSentResponse {
        success: true,
        message: "Password reset code sent to your email".to_string(),
        email,
    }))
}

// 2. Verify OTP
pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOTPRequest>,
) -> Result<Json<ResetOTPVerifiedResponse>> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    let payload = state
        .otp_service
        .verify(&email, req.otp_code.trim(), OtpPurpose::PasswordReset)
        .await?;

    let OtpPayload::PendingReset { user_id, .. } = payload else {
        return Err(AppError::internal_server_error("Reset OTP carried a signup payload"));
    };

    let user = state
        .users
        .find_by_id(&ObjectId::parse_str(&user_id)?)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    let reset_token = state.tokens.issue_reset(&user)?;
    Ok(Json(ResetOTPVerifiedResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
        reset_token,
    }))
}

// 3. Reset Password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>> {
    let claims = state.tokens.decode_reset(&req.reset_token)?;

    if req.new_password != req.confirm_password {
        return Err(AppError::invalid_data("Passwords do not match"));
    }
    req.validate()?;

    let user_id = ObjectId::parse_str(&claims.user_id)?;
    let hashed_password = hash(&req.new_password, state.bcrypt_cost)?;
    if !state
        .users
        .replace_password(&user_id, claims.password_version, &hashed_password)
        .await?
    {
        // Already spent on an earlier reset, or the account is gone.
        tracing::warn!("Rejected stale reset token for {}", claims.email);
        return Err(AppError::AuthError);
    }

    let user = state
        .users
        .find_by_id(&user_id)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    tracing::info!("🔑 Password reset for {}", user.username);
    auth_response(&state, &user)
}

// 4. Resend reset OTP
pub async fn resend_reset_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOTPRequest>,
) -> Result<Json<MessageResponse>> {
    let email = req.email.trim().to_lowercase();
    state
        .otp_service
        .resend(&email, OtpPurpose::PasswordReset)
        .await?;
    Ok(Json(MessageResponse::ok("A new password reset code has been sent")))
}
