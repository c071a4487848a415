use serde::Serialize;
use serde_json::Value;

use crate::payload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl Quote {
    /// `✨ <text>\n— <author>`. Anything else is left to the raw view.
    pub fn parse(result: &Value) -> Option<Self> {
        let raw = payload::text_of(result);
        let body = raw.trim().strip_prefix('✨')?;
        let (text, author) = body.rsplit_once('\n')?;
        let author = author.trim().strip_prefix('—')?.trim();
        let text = text.trim();
        if text.is_empty() || author.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            author: author.to_string(),
        })
    }
}

/// `tell_bedtime_story` result: shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Story {
    pub theme: Option<String>,
    pub text: String,
}
