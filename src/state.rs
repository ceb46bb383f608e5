use std::sync::Arc;

use mongodb::Database;

use crate::config::AppConfig;
use crate::database::chat_store::{ChatStore, MongoChatStore};
use crate::database::otp_store::MongoOtpStore;
use crate::database::user_store::{MongoUserStore, UserStore};
use crate::errors::Result;
use crate::services::chatbot_service::{ChatbotService, CustomResponses};
use crate::services::email_service::{Mailer, SmtpMailer};
use crate::services::gemini_service::GeminiService;
use crate::services::otp_service::{OTPService, OsDigits, SystemClock};
use crate::services::token_service::TokenService;
use crate::services::weather_service::OpenWeatherService;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
    pub otp_service: Arc<OTPService>,
    pub chatbot: Arc<ChatbotService>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenService,
    pub from_email: String,
    pub contact_email: String,
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Wires the MongoDB stores, SMTP mailer and the external chatbot APIs.
    pub fn new(db: &Database, config: &AppConfig, responses: CustomResponses) -> Result<Self> {
        let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(config)?);

        let otp_service = OTPService::new(
            Arc::new(MongoOtpStore::new(db)),
            mailer.clone(),
            Arc::new(SystemClock),
            Arc::new(OsDigits),
            config.default_from_email.clone(),
        );

        let chatbot = ChatbotService::new(
            responses,
            Arc::new(OpenWeatherService::new(config.openweather_api_key.clone())),
            Arc::new(GeminiService::new(config.gemini_api_key.clone())),
        )?;

        Ok(AppState {
            users: Arc::new(MongoUserStore::new(db)),
            chats: Arc::new(MongoChatStore::new(db)),
            otp_service: Arc::new(otp_service),
            chatbot: Arc::new(chatbot),
            mailer,
            tokens: TokenService::new(config.jwt_secret.clone()),
            from_email: config.default_from_email.clone(),
            contact_email: config.contact_email.clone(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
    }
}
