use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Outbound mail. Implementations must surface delivery failures to the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<()>;
}

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let creds = Credentials::new(
            config.email_host_user.clone(),
            config.email_host_password.clone(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.email_host)?
            .port(config.email_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &EmailMessage) -> Result<()> {
        if email.to.is_empty() {
            return Err(AppError::email("No recipients"));
        }

        let mut builder = Message::builder()
            .from(email.from.parse()?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN);
        for to in &email.to {
            builder = builder.to(to.parse()?);
        }
        let message = builder.body(email.body.clone())?;

        self.mailer.send(message).await?;
        tracing::info!("📧 Sent '{}' to {:?}", email.subject, email.to);
        Ok(())
    }
}
