//! Tools the browser executes itself rather than the agent backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload;

/// Result returned to the agent by `set_background_color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackgroundColorOutcome {
    Applied { ok: bool, color: String },
    Rejected { ok: bool, error: String },
}

impl BackgroundColorOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Handler for `set_background_color`: accepts any non-blank CSS colour string.
pub fn set_background_color(args: &Value) -> BackgroundColorOutcome {
    let color = args
        .get("color")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if color.is_empty() {
        BackgroundColorOutcome::Rejected {
            ok: false,
            error: "Missing color".to_string(),
        }
    } else {
        BackgroundColorOutcome::Applied {
            ok: true,
            color: color.to_string(),
        }
    }
}

/// Human-in-the-loop prompt shown before the agent may call `get_weather`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherApproval {
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub approved: bool,
}

impl WeatherApproval {
    pub fn from_args(args: &Value) -> Self {
        Self {
            location: payload::arg(args, "location")
                .unwrap_or_else(|| "(unknown location)".to_string()),
        }
    }

    pub fn prompt(&self) -> String {
        format!("Fetch weather for: {}?", self.location)
    }

    pub fn approve(&self) -> ApprovalResponse {
        ApprovalResponse { approved: true }
    }

    pub fn deny(&self) -> ApprovalResponse {
        ApprovalResponse { approved: false }
    }
}
