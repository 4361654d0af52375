//! Note record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Number of key characters shown in listings and command output.
pub const SHORT_KEY_LEN: usize = 10;

/// A single managed unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Generated identifier, immutable for the note lifetime.
    pub key: String,
    /// Optional unique alias for `key`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub tag: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    /// Cumulative time spent inside editor sessions.
    #[serde(default, with = "duration_nanos")]
    pub time_spent: Duration,
    /// Incremented on every content change.
    #[serde(default)]
    pub version: u32,
}

impl Note {
    pub fn new(key: impl Into<String>, content: impl Into<String>, tag: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            tag,
            content: content.into(),
            created_at: now,
            last_update: now,
            time_spent: Duration::ZERO,
            version: 1,
        }
    }

    /// First characters of the key, used when printing.
    pub fn short_key(&self) -> &str {
        short_key(&self.key)
    }

    /// Tag when set, otherwise the short key.
    pub fn label(&self) -> &str {
        self.tag.as_deref().unwrap_or_else(|| self.short_key())
    }

    pub fn key_tag(&self) -> KeyTag {
        KeyTag {
            key: self.key.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// Pointer to a note by key with the tag it had when recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTag {
    pub key: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_as_none"
    )]
    pub tag: Option<String>,
}

pub fn short_key(key: &str) -> &str {
    match key.char_indices().nth(SHORT_KEY_LEN) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

// Older files store untagged notes as `"tag": ""`.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|tag| !tag.is_empty()))
}

mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = i64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos.max(0) as u64))
    }
}
