use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Utility offering residential rates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilitySummary {
    pub name: String,
    /// EIA id
    pub utility_id: String,
}

/// Rate plan listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePlanSummary {
    /// Display name (plan name, falling back to its label)
    pub name: String,
    /// OpenEI label, used as `getpage` when fetching the full tariff
    pub label: String,
    pub description: String,
    /// Epoch seconds
    pub effective_date: Option<i64>,
    /// Epoch seconds
    pub end_date: Option<i64>,
    pub source: String,
    pub uri: String,
}

/// Full-detail tariff document as returned by the rate database.
///
/// Kept as loose JSON; the parser treats anything of the wrong shape as
/// absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTariff(Value);

impl RawTariff {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Non-empty text of a string or number field
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(json_text).filter(|s| !s.is_empty())
    }

    pub fn array(&self, key: &str) -> &[Value] {
        self.get(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// String or number rendered as text
pub(crate) fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer from a number or numeric string
pub(crate) fn json_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
