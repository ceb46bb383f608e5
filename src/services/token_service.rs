use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, Result};
use crate::models::otp::{OtpPurpose, OTP_VALIDITY_MINUTES};
use crate::models::user::{Claims, ResetClaims, User};

const SESSION_HOURS: i64 = 24;

#[derive(Clone)]
pub struct TokenService {
    jwt_secret: String,
}

impl TokenService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    fn expiry(&self, lifetime: Duration) -> Result<usize> {
        Ok(Utc::now()
            .checked_add_signed(lifetime)
            .ok_or_else(|| AppError::internal_server_error("Failed to calculate expiration"))?
            .timestamp() as usize)
    }

    pub fn issue_session(&self, user: &User) -> Result<String> {
        let claims = Claims {
            sub: user
                .id_hex()
                .ok_or_else(|| AppError::internal_server_error("User ID not found"))?,
            username: user.username.clone(),
            email: user.email.clone(),
            exp: self.expiry(Duration::hours(SESSION_HOURS))?,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    pub fn decode_session(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    /// Short-lived proof that a password-reset OTP was verified. It is bound to
    /// the user's current password version, so one reset spends it.
    pub fn issue_reset(&self, user: &User) -> Result<String> {
        let claims = ResetClaims {
            user_id: user
                .id_hex()
                .ok_or_else(|| AppError::internal_server_error("User ID not found"))?,
            email: user.email.clone(),
            password_version: user.password_version,
            purpose: OtpPurpose::PasswordReset.as_str().to_string(),
            exp: self.expiry(Duration::minutes(OTP_VALIDITY_MINUTES))?,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::internal_server_error(format!("Token generation failed: {}", e)))
    }

    pub fn decode_reset(&self, token: &str) -> Result<ResetClaims> {
        let data = decode::<ResetClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.purpose != OtpPurpose::PasswordReset.as_str() {
            return Err(AppError::Unauthorized);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn user() -> User {
        let mut user = User::new("alice".into(), "a@x.com".into(), "hash".into());
        user._id = Some(ObjectId::new());
        user
    }

    #[test]
    fn session_round_trips_identity() {
        let tokens = TokenService::new("k".into());
        let user = user();
        let claims = tokens.decode_session(&tokens.issue_session(&user).unwrap()).unwrap();
        assert_eq!(Some(claims.sub), user.id_hex());
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let token = TokenService::new("one".into()).issue_session(&user()).unwrap();
        let err = TokenService::new("two".into()).decode_session(&token).unwrap_err();
        assert!(matches!(err, AppError::AuthError));
    }

    #[test]
    fn session_token_is_not_a_reset_token() {
        let tokens = TokenService::new("k".into());
        let session = tokens.issue_session(&user()).unwrap();
        assert!(tokens.decode_reset(&session).is_err());
    }

    #[test]
    fn reset_token_is_bound_to_the_password_version() {
        let tokens = TokenService::new("k".into());
        let mut user = user();
        user.password_version = 3;
        let claims = tokens.decode_reset(&tokens.issue_reset(&user).unwrap()).unwrap();
        assert_eq!(claims.password_version, 3);
        assert_eq!(Some(claims.user_id), user.id_hex());
    }

    #[test]
    fn user_without_id_cannot_get_a_session() {
        let tokens = TokenService::new("k".into());
        let user = User::new("bob".into(), "b@x.com".into(), "hash".into());
        assert!(tokens.issue_session(&user).is_err());
    }
}
