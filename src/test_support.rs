//! Collaborator doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::database::memory::{MemoryChatStore, MemoryOtpStore, MemoryUserStore};
use crate::errors::{AppError, Result};
use crate::services::chatbot_service::{ChatbotService, CustomResponses, LanguageModel, WeatherProvider};
use crate::services::email_service::{EmailMessage, Mailer};
use crate::services::otp_service::{Clock, CodeGenerator, OTPService};
use crate::services::token_service::TokenService;
use crate::state::AppState;

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// The code inside the most recent mail body.
    pub fn last_code(&self) -> String {
        let sent = self.sent();
        let body = &sent.last().expect("no mail sent").body;
        body.chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &EmailMessage) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::email("connection refused"));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for MockClock {
    fn default() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl MockClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Hands out the digits of the given codes in order, wrapping around.
pub struct ScriptedDigits {
    digits: Vec<u8>,
    next: AtomicUsize,
}

impl ScriptedDigits {
    pub fn new(codes: &[&str]) -> Self {
        let digits = codes
            .iter()
            .flat_map(|code| code.bytes().map(|b| b - b'0'))
            .collect();
        Self {
            digits,
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for ScriptedDigits {
    fn digit(&self) -> u8 {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.digits[i % self.digits.len()]
    }
}

#[derive(Default)]
pub struct StubModel {
    pub prompts: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::external_api("model unavailable"));
        }
        Ok(format!("model says: {}", prompt))
    }
}

#[derive(Default)]
pub struct StubWeather {
    pub cities: Mutex<Vec<String>>,
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn current_weather(&self, city: &str) -> String {
        self.cities.lock().unwrap().push(city.to_string());
        format!("Weather in {}: clear sky", city)
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub otps: Arc<MemoryOtpStore>,
    pub clock: Arc<MockClock>,
    pub model: Arc<StubModel>,
}

pub fn test_app(responses: CustomResponses) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let otps = Arc::new(MemoryOtpStore::default());
    let clock = Arc::new(MockClock::default());
    let model = Arc::new(StubModel::default());

    let otp_service = OTPService::new(
        otps.clone(),
        mailer.clone(),
        clock.clone(),
        Arc::new(ScriptedDigits::new(&["123456", "654321"])),
        "bot@example.com".to_string(),
    );
    let chatbot = ChatbotService::new(responses, Arc::new(StubWeather::default()), model.clone())
        .expect("chatbot patterns compile");

    let state = AppState {
        users: Arc::new(MemoryUserStore::default()),
        chats: Arc::new(MemoryChatStore::default()),
        otp_service: Arc::new(otp_service),
        chatbot: Arc::new(chatbot),
        mailer: mailer.clone(),
        tokens: TokenService::new("test-secret".to_string()),
        from_email: "bot@example.com".to_string(),
        contact_email: "owner@example.com".to_string(),
        bcrypt_cost: 4,
    };

    TestApp {
        state,
        mailer,
        otps,
        clock,
        model,
    }
}
