use serde::{Deserialize, Serialize};

/// Lifecycle of a tool call as reported by the chat runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolStatus {
    InProgress,
    Executing,
    Pending,
    Complete,
    Error,
}

impl ToolStatus {
    /// Lenient parse of the runtime's status strings. Unknown values count as in progress.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "complete" => Self::Complete,
            "executing" => Self::Executing,
            "pending" => Self::Pending,
            "error" => Self::Error,
            _ => Self::InProgress,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Complete => "✓",
            Self::Error => "✗",
            _ => "⏳",
        }
    }
}

/// What a card shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum CardView<T> {
    /// Tool still running (in progress, executing or pending).
    Pending,
    /// Result parsed into the card's shape.
    Ready(T),
    /// Result present but not in the expected shape: show the raw text.
    Raw(String),
    /// The tool or the runtime reported a failure.
    Error(String),
}

impl<T> CardView<T> {
    /// Resolves a card from status and result. `parse` only runs on complete results; a
    /// complete call without a result shows an empty raw view.
    pub fn resolve(
        status: ToolStatus,
        result: Option<&serde_json::Value>,
        parse: impl FnOnce(&serde_json::Value) -> Option<T>,
    ) -> Self {
        match status {
            ToolStatus::Error => Self::Error(
                result
                    .map(crate::payload::text_of)
                    .unwrap_or_else(|| "Tool call failed".to_string()),
            ),
            ToolStatus::Complete => match result {
                Some(value) if !crate::payload::is_empty(value) => match parse(value) {
                    Some(parsed) => Self::Ready(parsed),
                    None => {
                        tracing::debug!(target: "agui::cards", "Tool result did not match card shape; showing raw text");
                        Self::Raw(crate::payload::text_of(value))
                    }
                },
                _ => Self::Raw(String::new()),
            },
            _ => Self::Pending,
        }
    }
}
