use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::errors::{AppError, Result};

pub const CITY_PROMPT: &str =
    "Please specify a city for weather information. For example: 'weather in London'";
pub const MODEL_FALLBACK: &str =
    "I'm having trouble processing your request right now. Please try again in a moment.";

/// Canned answers keyed by lower-cased question, in file order.
#[derive(Debug, Clone, Default)]
pub struct CustomResponses {
    entries: Vec<(String, String)>,
}

impl CustomResponses {
    /// Parses `question:answer` lines. Lines without a colon are ignored and a
    /// repeated question keeps its first position but takes the later answer.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();
        for line in text.lines() {
            let Some((question, answer)) = line.trim().split_once(':') else {
                continue;
            };
            let question = question.trim().to_lowercase();
            let answer = answer.trim().to_string();
            match entries.iter_mut().find(|(q, _)| *q == question) {
                Some(entry) => entry.1 = answer,
                None => entries.push((question, answer)),
            }
        }
        Self { entries }
    }

    /// A missing file yields an empty table.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let responses = Self::parse(&text);
                tracing::info!("📚 Loaded {} custom responses from {}", responses.len(), path.display());
                Ok(responses)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("Custom responses file {} not found, continuing without it", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn exact(&self, message: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| q == message)
            .map(|(_, a)| a.as_str())
    }

    fn contained_in(&self, message: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(q, _)| message.contains(q.as_str()))
            .map(|(_, a)| a.as_str())
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Always produces a user-facing sentence, including for lookup failures.
    async fn current_weather(&self, city: &str) -> String;
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub struct ChatbotService {
    responses: CustomResponses,
    weather: Arc<dyn WeatherProvider>,
    model: Arc<dyn LanguageModel>,
    weather_keywords: Regex,
    city: Regex,
}

impl ChatbotService {
    pub fn new(
        responses: CustomResponses,
        weather: Arc<dyn WeatherProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| AppError::configuration(format!("Bad chatbot pattern: {}", e)))
        };
        Ok(Self {
            responses,
            weather,
            model,
            weather_keywords: compile(r"weather|temperature|forecast|humidity|wind")?,
            city: compile(r"(?:in|at|for)\s+([a-zA-Z\s]+)$")?,
        })
    }

    /// Custom answers win, then weather questions, then the language model.
    pub async fn reply(&self, message: &str) -> String {
        let lowered = message.to_lowercase();
        let lowered = lowered.trim();

        if let Some(answer) = self.responses.exact(lowered) {
            return answer.to_string();
        }
        if let Some(answer) = self.responses.contained_in(lowered) {
            return answer.to_string();
        }

        if self.weather_keywords.is_match(lowered) {
            return match self.city.captures(lowered).and_then(|c| c.get(1)) {
                Some(city) => self.weather.current_weather(city.as_str().trim()).await,
                None => CITY_PROMPT.to_string(),
            };
        }

        match self.model.generate(message).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Language model request failed: {}", e);
                MODEL_FALLBACK.to_string()
            }
        }
    }
}
