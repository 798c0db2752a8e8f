//! Upstream message records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::format::parse_timestamp;

pub const CHAT_ID: &str = "CHAT ID";
pub const CREATED_DATE: &str = "CREATED DATE";
pub const FIRST_NAME: &str = "F Name";
pub const USERNAME: &str = "USERNAME";
pub const USER_MESSAGE: &str = "USER MESSAGE";
pub const BOT_MESSAGE: &str = "RUMIE MESSAGE";
pub const CATEGORY: &str = "Category";
pub const RECORD_ID: &str = "R-ID";

pub const UNKNOWN_USER: &str = "Unknown User";

/// One row from the webhook. The shape is owned upstream, so the raw JSON is
/// kept as-is and only the fields the viewer needs are read out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageRecord(Value);

impl MessageRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Strings, numbers and `true` identify things upstream. Numbers key by
    /// their shortest text, so `42`, `42.0` and `"42"` are the same id.
    fn id_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => number_key(n),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }

    /// Chat identifier, or `None` when missing or falsy
    pub fn chat_id(&self) -> Option<String> {
        self.id_field(CHAT_ID)
    }

    pub fn record_id(&self) -> Option<String> {
        self.id_field(RECORD_ID)
    }

    pub fn created_raw(&self) -> Option<&str> {
        self.str_field(CREATED_DATE)
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.created_raw().and_then(parse_timestamp)
    }

    pub fn sender_name(&self) -> &str {
        self.str_field(FIRST_NAME)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_USER)
    }

    pub fn username(&self) -> Option<&str> {
        self.str_field(USERNAME).filter(|s| !s.is_empty())
    }

    pub fn user_message(&self) -> &str {
        self.str_field(USER_MESSAGE).unwrap_or("")
    }

    pub fn bot_message(&self) -> &str {
        self.str_field(BOT_MESSAGE).unwrap_or("")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_field(CATEGORY).filter(|s| !s.is_empty())
    }
}

/// Zero is falsy; integral floats drop their fraction
fn number_key(n: &serde_json::Number) -> Option<String> {
    if n.is_i64() || n.is_u64() {
        return (n.as_f64() != Some(0.0)).then(|| n.to_string());
    }
    let f = n.as_f64()?;
    if f == 0.0 {
        None
    } else if f.fract() == 0.0 && f.abs() < 1e15 {
        Some(format!("{f:.0}"))
    } else {
        Some(n.to_string())
    }
}

impl From<Value> for MessageRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
