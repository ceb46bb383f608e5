use std::collections::BTreeMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use bcrypt::{hash, verify};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use validator::Validate;

use crate::dtos::auth_dtos::{
    LoginRequest, MessageResponse, OTPSentResponse, ResendOTPRequest, SignupRequest, VerifyOTPRequest,
};
use crate::errors::{AppError, Result};
use crate::models::otp::{OtpPayload, OtpPurpose};
use crate::models::user::{AuthResponse, Claims, User, UserResponse};
use crate::state::AppState;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn auth_response(state: &AppState, user: &User) -> Result<Json<AuthResponse>> {
    let token = state.tokens.issue_session(user)?;
    Ok(Json(AuthResponse {
        success: true,
        user: UserResponse {
            id: user.id_hex().unwrap_or_default(),
            username: user.username.clone(),
            email: user.email.clone(),
        },
        token,
    }))
}

// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(mut req): Json<SignupRequest>,
) -> Result<Response> {
    req.username = req.username.trim().to_string();
    req.email = normalize_email(&req.email);
    req.validate()?;
    let username = req.username.clone();
    let email = req.email.clone();

    let mut errors = BTreeMap::new();
    if req.password1 != req.password2 {
        errors.insert("password2", "Passwords do not match");
    }
    if state.users.find_by_username(&username).await?.is_some() {
        errors.insert("username", "Username already exists");
    }
    if state.users.find_by_email(&email).await?.is_some() {
        errors.insert("email", "Email already exists");
    }
    if !errors.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errors": errors })),
        )
            .into_response());
    }

    let password_hash = hash(&req.password1, state.bcrypt_cost)?;
    let payload = OtpPayload::PendingSignup {
        username,
        email: email.clone(),
        password_hash,
    };

    if let Err(e) = state.otp_service.issue(payload, OtpPurpose::Signup).await {
        tracing::error!("Failed to start signup for {}: {}", email, e);
        return Err(e);
    }

    Ok(Json(OTPSentResponse {
        success: true,
        message: "Verification code sent to your email".to_string(),
        email,
    })
    .into_response())
}

// POST /api/auth/verify-otp
pub async fn verify_signup_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOTPRequest>,
) -> Result<Json<AuthResponse>> {
    req.validate()?;
    let email = normalize_email(&req.email);

    let payload = state
        .otp_service
        .verify(&email, req.otp_code.trim(), OtpPurpose::Signup)
        .await?;

    let OtpPayload::PendingSignup {
        username,
        email,
        password_hash,
    } = payload
    else {
        return Err(AppError::internal_server_error("Signup OTP carried a reset payload"));
    };

    // The code is already spent here; a failed insert means the user signs up again.
    let user = match state.users.insert(User::new(username, email, password_hash)).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Account creation failed after OTP verification: {}", e);
            return Err(e);
        }
    };

    tracing::info!("👤 Created account {}", user.username);
    auth_response(&state, &user)
}

// POST /api/auth/resend-otp
pub async fn resend_signup_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOTPRequest>,
) -> Result<Json<MessageResponse>> {
    let email = normalize_email(&req.email);
    state.otp_service.resend(&email, OtpPurpose::Signup).await?;
    Ok(Json(MessageResponse::ok("A new verification code has been sent")))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .users
        .find_by_username(payload.username.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    auth_response(&state, &user)
}

// POST /api/auth/logout
pub async fn logout(Extension(claims): Extension<Claims>) -> Json<MessageResponse> {
    // Tokens are stateless; the client drops its copy.
    tracing::info!("👋 {} logged out", claims.username);
    Json(MessageResponse::ok("Logged out"))
}

// POST /api/auth/delete-account
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessageResponse>> {
    let user_id = ObjectId::parse_str(&claims.sub)?;

    let removed = state.chats.delete_for_user(&claims.sub).await?;
    if !state.users.delete(&user_id).await? {
        return Err(AppError::DocumentNotFound);
    }

    tracing::info!("🗑️ Deleted account {} and {} messages", claims.username, removed);
    Ok(Json(MessageResponse::ok("Account deleted")))
}
