use serde::Serialize;
use serde_json::Value;

use crate::payload;

/// Outcome of the `calculate` tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Calculation {
    Answer { expression: String, value: String },
    Failed { message: String },
}

impl Calculation {
    /// `Result: <expr> = <value>` or a message starting with `Error`. Anything else is `None`.
    pub fn parse(result: &Value) -> Option<Self> {
        let text = payload::text_of(result);
        let text = text.trim();
        if text.starts_with("Error") {
            return Some(Self::Failed {
                message: text.to_string(),
            });
        }
        // The expression itself may contain '=' (e.g. "2 == 2"); the value is after the last one.
        let (expression, value) = text.strip_prefix("Result:")?.rsplit_once('=')?;
        let (expression, value) = (expression.trim(), value.trim());
        if expression.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self::Answer {
            expression: expression.to_string(),
            value: value.to_string(),
        })
    }
}
