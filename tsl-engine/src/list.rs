//! Ordered list loading with concurrent, isolated level fetches.

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;

use crate::level::{Level, LevelId};
use crate::loader::{LevelFailure, LevelLoader, LevelSlot, ProbeFailure};

/// The identifier array itself could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("list {list} is unavailable: {}", describe_attempts(.attempts))]
    Unavailable {
        list: String,
        attempts: Vec<ProbeFailure>,
    },
    #[error("list {list} has no search paths to load from")]
    NoSearchPaths { list: String },
}

pub(crate) fn describe_attempts(attempts: &[ProbeFailure]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.store, attempt.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Snapshot of a list after every level fetch has settled.
///
/// Slot `i` always holds rank `i + 1`, loaded or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedList {
    pub name: String,
    pub slots: Vec<LevelSlot>,
}

impl LoadedList {
    #[must_use]
    pub fn from_slots(name: impl Into<String>, slots: Vec<LevelSlot>) -> Self {
        Self {
            name: name.into(),
            slots,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Loaded levels with their 1-based rank.
    pub fn levels(&self) -> impl Iterator<Item = (usize, &Level)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().ok().map(|level| (index + 1, level)))
    }

    /// Failed positions with their 1-based rank.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &LevelFailure)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().err().map(|failure| (index + 1, failure)))
    }

    /// True when every position loaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Result::is_ok)
    }
}

/// Loads a named identifier array, then every level on it.
#[derive(Debug, Clone)]
pub struct ListLoader {
    levels: LevelLoader,
}

impl ListLoader {
    #[must_use]
    pub const fn new(levels: LevelLoader) -> Self {
        Self { levels }
    }

    #[must_use]
    pub const fn level_loader(&self) -> &LevelLoader {
        &self.levels
    }

    /// Fetch `<name>.json` and load every level it names.
    ///
    /// Level fetches are issued together on the current task and collected by
    /// position, so rank never depends on which fetch finishes first. A level
    /// failure only fills its own slot.
    ///
    /// # Errors
    ///
    /// Returns an error if no store yields a JSON array of identifiers.
    pub async fn load_list(&self, name: &str) -> Result<LoadedList, ListError> {
        let ids = self.load_ids(name).await.inspect_err(|err| {
            log::error!("Failed to load list {name}: {err}");
        })?;

        let slots: Vec<LevelSlot> =
            join_all(ids.iter().map(|id| self.levels.load_level(id))).await;
        for (rank, failure) in slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().err().map(|f| (index + 1, f)))
        {
            log::error!("Failed to load level #{rank} {}.", failure.id);
        }

        Ok(LoadedList::from_slots(name, slots))
    }

    async fn load_ids(&self, name: &str) -> Result<Vec<LevelId>, ListError> {
        if self.levels.stores().is_empty() {
            return Err(ListError::NoSearchPaths {
                list: name.to_string(),
            });
        }
        let resource = format!("{name}.json");
        self.levels
            .resolve(&resource, |bytes, _, _| {
                serde_json::from_slice::<Vec<LevelId>>(bytes)
                    .map_err(|err| format!("malformed list: {err}"))
            })
            .await
            .map_err(|attempts| ListError::Unavailable {
                list: name.to_string(),
                attempts,
            })
    }
}
