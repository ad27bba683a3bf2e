use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::time;

/// A contact-form submission as stored in the inbox.
///
/// `id` and `timestamp` are assigned by the store at creation and never
/// change afterwards; only `read` is mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Text(String),
    Native { seconds: i64, nanoseconds: u32 },
}

/// Accepts either an RFC 3339 string or a native `{seconds, nanoseconds}`
/// timestamp object.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match TimestampRepr::deserialize(deserializer)? {
        TimestampRepr::Text(raw) => time::from_rfc3339(&raw).map_err(D::Error::custom),
        TimestampRepr::Native {
            seconds,
            nanoseconds,
        } => time::from_unix_parts(seconds, nanoseconds)
            .ok_or_else(|| D::Error::custom("timestamp out of range")),
    }
}
