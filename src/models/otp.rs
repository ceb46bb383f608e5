use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// How long a freshly issued or resent code stays usable.
pub const OTP_VALIDITY_MINUTES: i64 = 10;
pub const OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Signup,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Signup => "signup",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

/// The pending action an OTP unlocks once verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OtpPayload {
    PendingSignup {
        username: String,
        email: String,
        password_hash: String,
    },
    PendingReset {
        email: String,
        user_id: String,
    },
}

impl OtpPayload {
    pub fn email(&self) -> &str {
        match self {
            OtpPayload::PendingSignup { email, .. } => email,
            OtpPayload::PendingReset { email, .. } => email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub payload: OtpPayload,
    pub code: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    pub is_used: bool,
    pub purpose: OtpPurpose,
}

impl OtpRecord {
    pub fn new(payload: OtpPayload, code: String, purpose: OtpPurpose, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            payload,
            code,
            created_at: now,
            is_used: false,
            purpose,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= Duration::minutes(OTP_VALIDITY_MINUTES)
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_payload() -> OtpPayload {
        OtpPayload::PendingSignup {
            username: "alice".into(),
            email: "a@x.com".into(),
            password_hash: "$2b$04$hash".into(),
        }
    }

    #[test]
    fn validity_window_is_strict() {
        let t0 = Utc::now();
        let record = OtpRecord::new(signup_payload(), "123456".into(), OtpPurpose::Signup, t0);

        assert!(record.is_valid(t0 + Duration::seconds(9 * 60 + 59)));
        assert!(!record.is_valid(t0 + Duration::minutes(10)));
        assert!(!record.is_valid(t0 + Duration::seconds(10 * 60 + 1)));
    }

    #[test]
    fn used_record_is_never_valid() {
        let t0 = Utc::now();
        let mut record = OtpRecord::new(signup_payload(), "123456".into(), OtpPurpose::Signup, t0);
        record.is_used = true;
        assert!(!record.is_valid(t0));
    }

    #[test]
    fn payload_is_stored_as_tagged_document_with_nested_email() {
        let reset = OtpPayload::PendingReset {
            email: "b@x.com".into(),
            user_id: "65f0c0ffee".into(),
        };
        let doc = bson::to_document(&reset).unwrap();
        assert_eq!(doc.get_str("kind").unwrap(), "pending_reset");
        assert_eq!(doc.get_str("email").unwrap(), "b@x.com");
        assert_eq!(reset.email(), "b@x.com");
    }

    #[test]
    fn purpose_strings_match_serialised_form() {
        for purpose in [OtpPurpose::Signup, OtpPurpose::PasswordReset] {
            let value = serde_json::to_value(purpose).unwrap();
            assert_eq!(value, serde_json::Value::String(purpose.as_str().to_string()));
        }
    }
}
