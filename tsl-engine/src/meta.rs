//! Optional list metadata: the editor roster and level packs.
//!
//! Neither resource is required for the leaderboard, so failures degrade to
//! `None` / an empty set instead of an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::level::LevelId;
use crate::list::describe_attempts;
use crate::loader::LevelLoader;

/// A member of the list team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editor {
    #[serde(default)]
    pub role: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A themed bundle of levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub levels: Vec<LevelId>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    })
}

/// Load the editor roster, or `None` when no store has a usable one.
pub async fn fetch_editors(loader: &LevelLoader, name: &str) -> Option<Vec<Editor>> {
    let resource = format!("{name}.json");
    loader
        .resolve(&resource, |bytes, _, _| {
            serde_json::from_slice::<Vec<Editor>>(bytes).map_err(|err| err.to_string())
        })
        .await
        .ok()
}

/// Load the level packs, logging and returning nothing on failure.
pub async fn fetch_packs(loader: &LevelLoader, name: &str) -> Vec<Pack> {
    let resource = format!("{name}.json");
    loader
        .resolve(&resource, |bytes, _, _| {
            serde_json::from_slice::<Vec<Pack>>(bytes).map_err(|err| err.to_string())
        })
        .await
        .unwrap_or_else(|attempts| {
            log::error!("Failed to load {resource}: {}", describe_attempts(&attempts));
            Vec::new()
        })
}
