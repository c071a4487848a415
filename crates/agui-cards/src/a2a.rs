//! `a2a_consult` card: a drafting agent and a critic agent working on one answer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub draft: Option<String>,
    #[serde(default)]
    pub critique: Option<String>,
    #[serde(default, rename = "final")]
    pub final_answer: Option<String>,
}

impl Consultation {
    pub fn parse(result: &Value) -> Option<Self> {
        match result {
            Value::Null => None,
            Value::Object(_) => Self::from_object(result),
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(value @ Value::Object(_)) => Self::from_object(&value),
                Ok(_) => None,
                Err(_) => Some(Self::answer(text.clone())),
            },
            other => Some(Self::answer(other.to_string())),
        }
    }

    // Fields of unexpected types are dropped rather than failing the whole card.
    fn from_object(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            question: field("question"),
            goal: field("goal"),
            draft: field("draft"),
            critique: field("critique"),
            final_answer: field("final"),
        })
    }

    fn answer(text: String) -> Self {
        Self {
            final_answer: Some(text),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_fields_are_read() {
        let c = Consultation::parse(&json!({
            "question": "Name a cat",
            "goal": null,
            "draft": "Tom",
            "critique": "Too common",
            "final": "Ziggy",
        }))
        .unwrap();
        assert_eq!(c.goal, None);
        assert_eq!(c.final_answer.as_deref(), Some("Ziggy"));
    }

    #[test]
    fn plain_text_is_the_final_answer() {
        let c = Consultation::parse(&json!("Just use Ziggy.")).unwrap();
        assert_eq!(c.final_answer.as_deref(), Some("Just use Ziggy."));
        assert_eq!(c.draft, None);
    }

    #[test]
    fn json_non_object_is_nothing() {
        assert!(Consultation::parse(&json!("[1,2]")).is_none());
        assert!(Consultation::parse(&json!("42")).is_none());
    }
}
