//! Shared agent state edited from the preferences panel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Nl,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    #[default]
    Regular,
    Pirate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPreferences {
    pub language: Language,
    pub style: ReplyStyle,
}

impl AgentPreferences {
    /// Reads preferences from arbitrary shared state. Missing or unknown values fall back to
    /// the defaults; the flag reports whether any fallback was needed.
    pub fn normalize(state: &Value) -> (Self, bool) {
        let language = state
            .get("language")
            .and_then(|v| Language::deserialize(v).ok());
        let style = state
            .get("style")
            .and_then(|v| ReplyStyle::deserialize(v).ok());
        let changed = language.is_none() || style.is_none();
        (
            Self {
                language: language.unwrap_or_default(),
                style: style.unwrap_or_default(),
            },
            changed,
        )
    }

    /// Applies a partial update such as `{"style": "pirate"}`; invalid values are ignored.
    pub fn merge(&self, update: &Value) -> Self {
        Self {
            language: update
                .get("language")
                .and_then(|v| Language::deserialize(v).ok())
                .unwrap_or(self.language),
            style: update
                .get("style")
                .and_then(|v| ReplyStyle::deserialize(v).ok())
                .unwrap_or(self.style),
        }
    }

    pub fn description(&self) -> String {
        let language = match self.language {
            Language::Nl => "De assistent antwoordt in het Nederlands.",
            Language::En => "The assistant replies in English.",
        };
        match self.style {
            ReplyStyle::Pirate => format!("{language} (Pirate style)"),
            ReplyStyle::Regular => language.to_string(),
        }
    }
}
