// config.rs
use std::env;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub gemini_api_key: String,
    pub openweather_api_key: String,
    pub email_host: String,
    pub email_port: u16,
    pub email_host_user: String,
    pub email_host_password: String,
    pub default_from_email: String,
    pub contact_email: String,
    pub custom_responses_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::configuration(format!("{} must be set", key)))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let email_host_user = or_default("EMAIL_HOST_USER", "");
        let default_from_email = lookup("DEFAULT_FROM_EMAIL").unwrap_or_else(|| email_host_user.clone());
        let contact_email = lookup("CONTACT_EMAIL").unwrap_or_else(|| email_host_user.clone());

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_name: or_default("DATABASE_NAME", "chatbot"),
            host: or_default("HOST", "0.0.0.0"),
            port: or_default("PORT", "10000")
                .parse()
                .map_err(|_| AppError::configuration("PORT must be a number"))?,
            jwt_secret: required("JWT_SECRET")?,
            gemini_api_key: or_default("GEMINI_API_KEY", ""),
            openweather_api_key: or_default("OPENWEATHER_API_KEY", ""),
            email_host: or_default("EMAIL_HOST", "smtp.gmail.com"),
            email_port: or_default("EMAIL_PORT", "587")
                .parse()
                .map_err(|_| AppError::configuration("EMAIL_PORT must be a number"))?,
            email_host_user,
            email_host_password: or_default("EMAIL_HOST_PASSWORD", ""),
            default_from_email,
            contact_email,
            custom_responses_path: or_default("CUSTOM_RESPONSES_PATH", "responses.txt"),
        })
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "database_name": self.database_name,
            "host": self.host,
            "port": self.port,
            "email_host": self.email_host,
            "email_port": self.email_port,
            "gemini_key_set": !self.gemini_api_key.is_empty(),
            "openweather_key_set": !self.openweather_api_key.is_empty(),
            "custom_responses_path": self.custom_responses_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mongodb://localhost:27017"),
            ("JWT_SECRET", "s3cret"),
            ("EMAIL_HOST_USER", "bot@example.com"),
        ]))
        .unwrap();

        assert_eq!(config.port, 10000);
        assert_eq!(config.email_port, 587);
        assert_eq!(config.database_name, "chatbot");
        assert_eq!(config.default_from_email, "bot@example.com");
        assert_eq!(config.contact_email, "bot@example.com");
        assert_eq!(config.custom_responses_path, "responses.txt");
    }

    #[test]
    fn missing_secret_is_a_configuration_error() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "mongodb://localhost")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "mongodb://localhost"),
            ("JWT_SECRET", "x"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));
    }
}
