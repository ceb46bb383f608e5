use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::services::chatbot_service::WeatherProvider;

const OPENWEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

#[derive(Clone)]
pub struct OpenWeatherService {
    api_key: String,
    client: Client,
}

impl OpenWeatherService {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }

    async fn fetch(&self, city: &str) -> reqwest::Result<Value> {
        self.client
            .get(OPENWEATHER_URL)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await?
            .json::<Value>()
            .await
    }
}

const WEATHER_UNAVAILABLE: &str = "Sorry, I'm having trouble getting weather information right now.";

/// Renders an OpenWeather current-weather body. `cod` is numeric on success and
/// a string such as `"404"` otherwise.
pub fn format_weather(city: &str, data: &Value) -> String {
    if data["cod"].as_i64() != Some(200) {
        return format!("Could not find weather information for {}.", city);
    }

    match weather_fields(data) {
        Some((description, temp, humidity, wind)) => format!(
            "Weather in {}: {}, Temperature: {}°C, Humidity: {}%, Wind: {} m/s",
            city, description, temp, humidity, wind
        ),
        None => {
            tracing::warn!("Incomplete weather payload for {}", city);
            WEATHER_UNAVAILABLE.to_string()
        }
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn weather_fields(data: &Value) -> Option<(&str, &Value, &Value, &Value)> {
    let description = data.get("weather")?.get(0)?.get("description")?.as_str()?;
    let main = data.get("main")?;
    let temp = present(main.get("temp"))?;
    let humidity = present(main.get("humidity"))?;
    let wind = present(data.get("wind")?.get("speed"))?;
    Some((description, temp, humidity, wind))
}

#[async_trait]
impl WeatherProvider for OpenWeatherService {
    async fn current_weather(&self, city: &str) -> String {
        match self.fetch(city).await {
            Ok(data) => format_weather(city, &data),
            Err(e) => {
                tracing::error!("Weather lookup for {} failed: {}", city, e);
                WEATHER_UNAVAILABLE.to_string()
            }
        }
    }
}
