//! `get_current_time` card: digital readout, analog hand angles and a long date.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::payload;

static TIMESTAMP: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})(?:\s+|T)(\d{2}):(\d{2}):(\d{2})").ok());

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockReading {
    /// `YYYY-MM-DD` as found in the result.
    pub date: String,
    /// `HH:MM:SS`.
    pub time: String,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// Rotation in degrees of each clock hand, clockwise from 12.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HandAngles {
    pub hour: f64,
    pub minute: f64,
    pub second: f64,
}

impl ClockReading {
    /// Finds the first `YYYY-MM-DD HH:MM:SS` (or `T`-separated) timestamp in the result text.
    pub fn parse(result: &Value) -> Option<Self> {
        let text = payload::text_of(result);
        let caps = TIMESTAMP.as_ref()?.captures(&text)?;
        Some(Self {
            date: caps[1].to_string(),
            time: format!("{}:{}:{}", &caps[2], &caps[3], &caps[4]),
            hours: caps[2].parse().ok()?,
            minutes: caps[3].parse().ok()?,
            seconds: caps[4].parse().ok()?,
        })
    }

    pub fn hand_angles(&self) -> HandAngles {
        HandAngles {
            hour: f64::from(self.hours % 12) * 30.0 + f64::from(self.minutes) * 0.5,
            minute: f64::from(self.minutes) * 6.0,
            second: f64::from(self.seconds) * 6.0,
        }
    }

    /// "Thursday, December 4, 2025". Falls back to the raw date when it is not a real
    /// calendar day.
    pub fn long_date(&self) -> String {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map(|d| d.format("%A, %B %-d, %Y").to_string())
            .unwrap_or_else(|_| self.date.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_sentence_with_timestamp() {
        let r = ClockReading::parse(&json!("Current date and time: 2025-12-04 18:30:45")).unwrap();
        assert_eq!(r.date, "2025-12-04");
        assert_eq!(r.time, "18:30:45");
        assert_eq!((r.hours, r.minutes, r.seconds), (18, 30, 45));
        assert_eq!(r.long_date(), "Thursday, December 4, 2025");
    }

    #[test]
    fn accepts_iso_separator() {
        let r = ClockReading::parse(&json!("2024-02-29T07:05:09Z")).unwrap();
        assert_eq!(r.time, "07:05:09");
        assert_eq!(r.long_date(), "Thursday, February 29, 2024");
    }

    #[test]
    fn hand_angles() {
        let r = ClockReading::parse(&json!("2025-12-04 15:30:10")).unwrap();
        let a = r.hand_angles();
        assert_eq!(a.hour, 105.0);
        assert_eq!(a.minute, 180.0);
        assert_eq!(a.second, 60.0);
    }

    #[test]
    fn impossible_date_keeps_raw_text() {
        let r = ClockReading::parse(&json!("2025-13-45 10:00:00")).unwrap();
        assert_eq!(r.long_date(), "2025-13-45");
        assert!(ClockReading::parse(&json!("half past four")).is_none());
    }
}
