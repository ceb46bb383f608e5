use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password1: String,

    pub password2: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOTPRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 6, message = "OTP must be 6 digits"))]
    pub otp_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOTPRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub reset_token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,

    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct OTPSentResponse {
    pub success: bool,
    pub message: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ResetOTPVerifiedResponse {
    pub success: bool,
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
