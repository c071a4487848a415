//! `search_catalog` card.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Numbers and strings both occur.
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub punch_line: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub debug_keys: Option<Vec<String>>,
}

impl Product {
    pub fn title(&self) -> &str {
        [&self.name, &self.product_id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("(Unnamed product)")
    }

    /// Price as shown on the card, e.g. `$12.5`.
    pub fn price_label(&self) -> Option<String> {
        match self.price.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(format!("${s}")),
            other => Some(format!("${other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSearch {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<Product>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CatalogSearch {
    /// JSON string or object. A string that is not JSON is treated as an error message;
    /// JSON of the wrong shape gives `None`.
    pub fn parse(result: &Value) -> Option<Self> {
        match result {
            Value::Null => None,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => Self::from_json(value),
                Err(_) => Some(Self::failed(text.clone())),
            },
            Value::Object(_) => Self::from_json(result.clone()),
            other => Some(Self::failed(other.to_string())),
        }
    }

    fn from_json(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    pub fn query_label(&self) -> &str {
        self.query
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or("(unknown)")
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
