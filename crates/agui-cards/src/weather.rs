//! `get_weather` card.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::payload::{self, num_field};

static LEGACY_FORMAT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"Weather in ([^:]+):\s*(\d+)°C,\s*(.+)$").ok());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherData {
    pub location: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: String,
}

/// Icon and background for a weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherTheme {
    pub icon: &'static str,
    pub gradient: &'static str,
}

const DEFAULT_THEME: WeatherTheme = WeatherTheme {
    icon: "🌡️",
    gradient: "linear-gradient(135deg, #667eea 0%, #764ba2 100%)",
};

impl WeatherTheme {
    pub fn for_condition(condition: &str) -> Self {
        let (icon, gradient) = match condition {
            "sunny" => ("☀️", "linear-gradient(135deg, #f6d365 0%, #fda085 100%)"),
            "cloudy" => ("☁️", "linear-gradient(135deg, #bdc3c7 0%, #2c3e50 100%)"),
            "partly cloudy" => ("⛅", "linear-gradient(135deg, #89f7fe 0%, #66a6ff 100%)"),
            "rainy" => ("🌧️", "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)"),
            "snowy" => ("❄️", "linear-gradient(135deg, #e6e9f0 0%, #eef1f5 100%)"),
            "stormy" => ("⛈️", "linear-gradient(135deg, #373b44 0%, #4286f4 100%)"),
            "foggy" => ("🌫️", "linear-gradient(135deg, #d7d2cc 0%, #304352 100%)"),
            _ => return DEFAULT_THEME,
        };
        Self { icon, gradient }
    }
}

impl Default for WeatherTheme {
    fn default() -> Self {
        DEFAULT_THEME
    }
}

impl WeatherData {
    pub fn theme(&self) -> WeatherTheme {
        WeatherTheme::for_condition(&self.condition)
    }

    /// Parses a weather tool result.
    ///
    /// Accepts a JSON object (or a string holding one) with numeric `temperature` and string
    /// `condition`. A result carrying `error` is rejected. Strings that are not JSON fall back
    /// to the older `Weather in Paris: 22°C, sunny` text.
    pub fn parse(result: &Value) -> Option<Self> {
        if let Value::String(text) = result {
            if serde_json::from_str::<Value>(text).is_err() {
                return Self::parse_legacy(text);
            }
        }
        let data = payload::object_of(result)?;
        if data.get("error").is_some_and(truthy) {
            return None;
        }
        let temperature = data.get("temperature").and_then(Value::as_f64)?;
        let condition = data.get("condition").and_then(Value::as_str)?;
        Some(Self {
            location: data
                .get("location")
                .filter(|v| truthy(v))
                .map(payload::text_of)
                .unwrap_or_default(),
            temperature,
            humidity: num_field(&data, "humidity").unwrap_or(0.0),
            wind_speed: num_field(&data, "wind_speed").unwrap_or(0.0),
            condition: condition.to_string(),
        })
    }

    fn parse_legacy(text: &str) -> Option<Self> {
        let caps = LEGACY_FORMAT.as_ref()?.captures(text)?;
        Some(Self {
            location: caps[1].to_string(),
            temperature: caps[2].parse().ok()?,
            humidity: 0.0,
            wind_speed: 0.0,
            condition: caps[3].trim().to_lowercase(),
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}
