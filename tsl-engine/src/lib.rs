//! TSL List Engine
//!
//! Platform-agnostic list aggregation and scoring for a ranked level list.
//! This crate loads the ordered list and every level's records from one or more
//! stores, scores each verification, completion and progress entry by rank, and
//! folds them into a single player leaderboard. Rendering is left to callers.

pub mod config;
pub mod leaderboard;
pub mod level;
pub mod list;
pub mod loader;
pub mod meta;
pub mod numbers;
pub mod roulette;
pub mod score;
pub mod store;

use std::sync::Arc;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, ListKind};
pub use leaderboard::{
    Leaderboard, PlayerAggregate, ScoreEntry, aggregate, aggregate_with_policy,
};
pub use level::{Level, LevelId, Record};
pub use list::{ListError, ListLoader, LoadedList};
pub use loader::{LevelFailure, LevelLoader, LevelSlot, ProbeFailure};
pub use meta::{Editor, Pack};
pub use roulette::{RouletteError, RouletteLevel, RouletteOptions, RouletteRun};
pub use score::{ScoringPolicy, round, score, score_with_policy};
pub use store::{DirStore, FetchError, MemoryStore, Store};

/// Entry point for consumers: configuration plus the stores it resolves to.
#[derive(Debug, Clone)]
pub struct ListEngine {
    config: EngineConfig,
    lists: ListLoader,
}

impl ListEngine {
    /// Create an engine reading every search path as a local directory.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let stores: Vec<Arc<dyn Store>> = config
            .search_paths
            .iter()
            .map(|path| Arc::new(DirStore::new(path)) as Arc<dyn Store>)
            .collect();
        Self::with_stores(config, stores)
    }

    /// Create an engine over caller supplied stores, in priority order.
    #[must_use]
    pub fn with_stores(config: EngineConfig, stores: Vec<Arc<dyn Store>>) -> Self {
        let levels = LevelLoader::new(stores, config.fetch_timeout());
        Self {
            config,
            lists: ListLoader::new(levels),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load a list and all of its levels.
    ///
    /// # Errors
    ///
    /// Returns an error if the list's identifier array cannot be loaded.
    pub async fn load_list(&self, kind: &ListKind) -> Result<LoadedList, ListError> {
        self.lists.load_list(self.config.list_file(kind)).await
    }

    /// Aggregate a loaded list with the configured scoring policy.
    #[must_use]
    pub fn aggregate(&self, list: &LoadedList) -> Leaderboard {
        aggregate_with_policy(list, &self.config.scoring)
    }

    /// Load and aggregate a list.
    ///
    /// An unavailable list yields an empty leaderboard with no errors; use
    /// [`Self::load_list`] to tell that apart from an empty list.
    pub async fn leaderboard(&self, kind: &ListKind) -> Leaderboard {
        match self.load_list(kind).await {
            Ok(list) => self.aggregate(&list),
            Err(_) => Leaderboard::default(),
        }
    }

    pub async fn editors(&self) -> Option<Vec<Editor>> {
        meta::fetch_editors(self.lists.level_loader(), &self.config.editors_file).await
    }

    pub async fn packs(&self) -> Vec<Pack> {
        meta::fetch_packs(self.lists.level_loader(), &self.config.packs_file).await
    }

    /// Load the main list and draw a roulette run from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is unavailable, partially broken, or no pool
    /// is selected.
    pub async fn roulette(
        &self,
        options: RouletteOptions,
        seed: u64,
    ) -> Result<RouletteRun, RouletteError> {
        let list = self.load_list(&ListKind::Main).await?;
        RouletteRun::start(&list, options, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(store: MemoryStore) -> ListEngine {
        let store: Arc<dyn Store> = Arc::new(store);
        ListEngine::with_stores(EngineConfig::default(), vec![store])
    }

    #[tokio::test]
    async fn leaderboard_is_neutral_when_list_is_unavailable() {
        let engine = engine(MemoryStore::new("mem"));
        assert_eq!(engine.leaderboard(&ListKind::Main).await, Leaderboard::default());
        assert!(engine.load_list(&ListKind::Main).await.is_err());
        assert!(matches!(
            engine.roulette(RouletteOptions::default(), 1).await,
            Err(RouletteError::List(_))
        ));
    }

    #[tokio::test]
    async fn challenge_list_uses_its_own_file() {
        let store = MemoryStore::new("mem")
            .with("_list.json", r#"["main"]"#)
            .with("_clist.json", r#"["challenge"]"#)
            .with("main.json", r#"{ "name": "Main", "verifier": "A" }"#)
            .with("challenge.json", r#"{ "name": "Challenge", "verifier": "B" }"#);
        let engine = engine(store);

        let main = engine.leaderboard(&ListKind::Main).await;
        let challenge = engine.leaderboard(&ListKind::Challenge).await;
        assert_eq!(main.players[0].user, "A");
        assert_eq!(challenge.players[0].user, "B");
        assert_eq!(challenge.players[0].verified[0].level, "Challenge");
    }

    #[test]
    fn new_maps_search_paths_to_directories() {
        let config = EngineConfig {
            search_paths: vec!["/nonexistent/a".to_string(), "/nonexistent/b".to_string()],
            ..EngineConfig::default()
        };
        let engine = ListEngine::new(config);
        let labels: Vec<&str> = engine
            .lists
            .level_loader()
            .stores()
            .iter()
            .map(|store| store.label())
            .collect();
        assert_eq!(labels, ["/nonexistent/a", "/nonexistent/b"]);
    }
}
