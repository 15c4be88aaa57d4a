use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::numbers::percent_from_f64;

/// Storage key of a level. Its position in a list defines the level's rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource name of the level payload inside a store.
    #[must_use]
    pub fn resource(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LevelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LevelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A player's best known completion or progress on a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub user: String,
    #[serde(deserialize_with = "percent")]
    pub percent: u8,
    #[serde(default, deserialize_with = "null_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_default")]
    pub mobile: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hz: Option<u32>,
}

impl Record {
    #[must_use]
    pub const fn is_completion(&self) -> bool {
        self.percent >= 100
    }
}

/// A loaded level with its records sorted by descending percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub author: String,
    pub creators: Vec<String>,
    pub verifier: String,
    pub verification: String,
    pub percent_to_qualify: u8,
    pub records: Vec<Record>,
    /// Key this level was loaded under.
    pub path: LevelId,
    /// Label of the store that served the payload.
    pub source: String,
    /// Served by a store other than the first search path. Display only.
    pub fallback: bool,
    /// Fields the engine does not consume, kept for presentation layers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelPayload {
    #[serde(default, deserialize_with = "level_number")]
    id: Option<u64>,
    name: String,
    #[serde(default, deserialize_with = "null_default")]
    author: String,
    #[serde(default, deserialize_with = "null_default")]
    creators: Vec<String>,
    verifier: String,
    #[serde(default, deserialize_with = "null_default")]
    verification: String,
    #[serde(
        default = "default_percent_to_qualify",
        deserialize_with = "percent_or_full"
    )]
    percent_to_qualify: u8,
    #[serde(default)]
    records: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

const fn default_percent_to_qualify() -> u8 {
    100
}

/// Keys the engine writes itself when a level is serialised.
const ENGINE_KEYS: [&str; 3] = ["path", "source", "fallback"];

/// Treat an explicit `null` like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Percentages may be written as integers or floats; clamped to `0..=100`.
fn percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(percent_from_f64)
}

fn percent_or_full<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?
        .map_or_else(default_percent_to_qualify, percent_from_f64))
}

fn level_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        Other(Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(number)) => Some(number),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        Some(Raw::Other(_)) | None => None,
    })
}

impl Level {
    /// Decode a level payload.
    ///
    /// A `records` field that is missing or not an array yields no records, and
    /// individual entries that do not decode are dropped. Only a payload without
    /// the level's own shape is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not JSON or lack `name` / `verifier`.
    pub fn from_payload(
        bytes: &[u8],
        path: LevelId,
        source: &str,
        fallback: bool,
    ) -> Result<Self, serde_json::Error> {
        let mut payload: LevelPayload = serde_json::from_slice(bytes)?;
        for key in ENGINE_KEYS {
            payload.extra.remove(key);
        }
        let mut records = decode_records(&path, payload.records);
        records.sort_by(|a, b| b.percent.cmp(&a.percent));

        Ok(Self {
            id: payload.id,
            name: payload.name,
            author: payload.author,
            creators: payload.creators,
            verifier: payload.verifier,
            verification: payload.verification,
            percent_to_qualify: payload.percent_to_qualify,
            records,
            path,
            source: source.to_string(),
            fallback,
            extra: payload.extra,
        })
    }
}

fn decode_records(path: &LevelId, raw: Value) -> Vec<Record> {
    let Value::Array(entries) = raw else {
        if !raw.is_null() {
            log::warn!("Level {path} has a non-array records field; treating it as empty.");
        }
        return Vec::new();
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Record>(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                log::warn!("Dropping record #{} of level {path}: {err}", index + 1);
                None
            }
        })
        .collect()
}
