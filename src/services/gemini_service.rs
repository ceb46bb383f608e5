use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::services::chatbot_service::LanguageModel;

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Clone)]
pub struct GeminiService {
    api_key: String,
    client: Client,
}

impl GeminiService {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

/// Pulls the first candidate's first text part out of a `generateContent` reply.
pub fn extract_text(body: &Value) -> Result<String> {
    body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::external_api("Gemini response had no text candidate"))
}

#[async_trait]
impl LanguageModel for GeminiService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .client
            .post(GEMINI_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;
        extract_text(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_candidate_text() {
        let body = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Hello!" }, { "text": "ignored" }] } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        });
        assert_eq!(extract_text(&body).unwrap(), "Hello!");
    }

    #[test]
    fn missing_candidates_is_an_external_api_error() {
        let err = extract_text(&json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
