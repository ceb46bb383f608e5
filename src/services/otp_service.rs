use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, Rng};

use crate::database::otp_store::OtpStore;
use crate::errors::{AppError, Result};
use crate::models::otp::{OtpPayload, OtpPurpose, OtpRecord, OTP_LENGTH, OTP_VALIDITY_MINUTES};
use crate::services::email_service::{EmailMessage, Mailer};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of uniformly distributed decimal digits.
pub trait CodeGenerator: Send + Sync {
    fn digit(&self) -> u8;
}

/// Draws digits from the operating system CSPRNG.
pub struct OsDigits;

impl CodeGenerator for OsDigits {
    fn digit(&self) -> u8 {
        OsRng.gen_range(0..10)
    }
}

#[derive(Clone)]
pub struct OTPService {
    store: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    from_email: String,
}

impl OTPService {
    pub fn new(
        store: Arc<dyn OtpStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeGenerator>,
        from_email: String,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            codes,
            from_email,
        }
    }

    // Generate 6-digit OTP
    pub fn generate_otp(&self) -> String {
        (0..OTP_LENGTH)
            .map(|_| char::from(b'0' + self.codes.digit() % 10))
            .collect()
    }

    /// Replaces any earlier code for the same email and purpose, stores a fresh
    /// one and mails it. A mail failure fails the whole call.
    pub async fn issue(&self, payload: OtpPayload, purpose: OtpPurpose) -> Result<OtpRecord> {
        let email = payload.email().to_string();

        let removed = self.store.delete_for(&email, purpose).await?;
        if removed > 0 {
            tracing::debug!("Removed {} earlier {} OTP(s) for {}", removed, purpose.as_str(), email);
        }

        let code = self.generate_otp();
        let record = self
            .store
            .insert(OtpRecord::new(payload, code, purpose, self.clock.now()))
            .await?;

        let (subject, body) = match purpose {
            OtpPurpose::Signup => (
                "Your ChatBot Verification Code",
                format!(
                    "Your OTP code is: {}. It will expire in {} minutes.",
                    record.code, OTP_VALIDITY_MINUTES
                ),
            ),
            OtpPurpose::PasswordReset => (
                "Password Reset Verification Code",
                format!(
                    "Your OTP code for password reset is: {}. It will expire in {} minutes.",
                    record.code, OTP_VALIDITY_MINUTES
                ),
            ),
        };
        self.notify(&email, subject, body).await?;

        tracing::info!("🔐 Issued {} OTP for {}", purpose.as_str(), email);
        Ok(record)
    }

    /// Refreshes the pending record in place: new code, restarted window, same id.
    pub async fn resend(&self, email: &str, purpose: OtpPurpose) -> Result<OtpRecord> {
        let mut record = self
            .store
            .find_pending(email, purpose)
            .await?
            .ok_or(AppError::OtpNotFound)?;
        let id = record
            .id
            .ok_or_else(|| AppError::internal_server_error("Stored OTP has no id"))?;

        record.code = self.generate_otp();
        record.created_at = self.clock.now();
        self.store.refresh(&id, &record.code, record.created_at).await?;

        let body = format!(
            "Your new OTP code is: {}. It will expire in {} minutes.",
            record.code, OTP_VALIDITY_MINUTES
        );
        self.notify(record.payload.email(), "Your ChatBot Verification Code", body)
            .await?;

        tracing::info!("🔁 Resent {} OTP for {}", purpose.as_str(), email);
        Ok(record)
    }

    /// Consumes a matching code and hands back its payload.
    ///
    /// The record is burned before the caller acts on the payload; if that
    /// follow-up fails the user has to start over.
    pub async fn verify(&self, email: &str, code: &str, purpose: OtpPurpose) -> Result<OtpPayload> {
        let record = self
            .store
            .find_unused_match(email, purpose, code)
            .await?
            .ok_or(AppError::InvalidOtp)?;

        if !record.is_valid(self.clock.now()) {
            tracing::info!("⌛ Expired {} OTP presented for {}", purpose.as_str(), email);
            return Err(AppError::ExpiredOtp);
        }

        let id = record
            .id
            .ok_or_else(|| AppError::internal_server_error("Stored OTP has no id"))?;
        if !self.store.mark_used(&id).await? {
            // Lost the race against a concurrent verification of the same code.
            return Err(AppError::InvalidOtp);
        }

        tracing::info!("✅ Verified {} OTP for {}", purpose.as_str(), email);
        Ok(record.payload)
    }

    /// Drops used and expired records.
    pub async fn purge_stale(&self) -> Result<u64> {
        let cutoff = self.clock.now() - Duration::minutes(OTP_VALIDITY_MINUTES);
        self.store.purge_stale(cutoff).await
    }

    async fn notify(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let email = EmailMessage {
            subject: subject.to_string(),
            body,
            from: self.from_email.clone(),
            to: vec![to.to_string()],
        };
        self.mailer.send(&email).await
    }
}
