//! Per-level loading across an ordered chain of stores.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::level::{Level, LevelId};
use crate::store::{FetchError, Store};

/// One store's reason for not producing a usable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub store: String,
    pub reason: String,
}

/// A level that no store could provide. Carried as data, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelFailure {
    pub id: LevelId,
    pub attempts: Vec<ProbeFailure>,
}

impl fmt::Display for LevelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if self.attempts.is_empty() {
            return write!(f, " (no search paths configured)");
        }
        let reasons: Vec<String> = self
            .attempts
            .iter()
            .map(|attempt| format!("{}: {}", attempt.store, attempt.reason))
            .collect();
        write!(f, " ({})", reasons.join("; "))
    }
}

/// Outcome for one list position.
pub type LevelSlot = Result<Level, LevelFailure>;

/// Probes stores in priority order and keeps the first well-formed payload.
#[derive(Clone)]
pub struct LevelLoader {
    stores: Vec<Arc<dyn Store>>,
    timeout: Duration,
}

impl fmt::Debug for LevelLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.stores.iter().map(|store| store.label()).collect();
        f.debug_struct("LevelLoader")
            .field("stores", &labels)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LevelLoader {
    #[must_use]
    pub fn new(stores: Vec<Arc<dyn Store>>, timeout: Duration) -> Self {
        Self { stores, timeout }
    }

    #[must_use]
    pub fn stores(&self) -> &[Arc<dyn Store>] {
        &self.stores
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load one level, falling back through the search paths.
    ///
    /// Unreachable, timed out, non-JSON or wrongly shaped payloads all count as a
    /// failed probe; the level fails only once every store has been tried.
    pub async fn load_level(&self, id: &LevelId) -> LevelSlot {
        let resource = id.resource();
        self.resolve(&resource, |bytes, store, index| {
            Level::from_payload(bytes, id.clone(), store.label(), index > 0)
                .map_err(|err| format!("malformed level payload: {err}"))
        })
        .await
        .map_err(|attempts| LevelFailure {
            id: id.clone(),
            attempts,
        })
    }

    /// Fetch `resource` from the first store whose payload `decode` accepts.
    ///
    /// `decode` receives the bytes, the store and the store's position in the
    /// search order.
    pub(crate) async fn resolve<T, F>(
        &self,
        resource: &str,
        decode: F,
    ) -> Result<T, Vec<ProbeFailure>>
    where
        F: Fn(&[u8], &dyn Store, usize) -> Result<T, String>,
    {
        let mut attempts = Vec::new();
        for (index, store) in self.stores.iter().enumerate() {
            let outcome = self
                .probe(store.as_ref(), resource)
                .await
                .map_err(|err| err.to_string())
                .and_then(|bytes| decode(&bytes, store.as_ref(), index));
            match outcome {
                Ok(value) => {
                    if index > 0 {
                        log::debug!("{resource} served by fallback {}", store.label());
                    }
                    return Ok(value);
                }
                Err(reason) => {
                    log::debug!("{resource} unavailable from {}: {reason}", store.label());
                    attempts.push(ProbeFailure {
                        store: store.label().to_string(),
                        reason,
                    });
                }
            }
        }
        Err(attempts)
    }

    async fn probe(&self, store: &dyn Store, resource: &str) -> Result<Vec<u8>, FetchError> {
        match tokio::time::timeout(self.timeout, store.fetch(resource)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Timeout {
                resource: resource.to_string(),
                elapsed: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct StalledStore;

    #[async_trait]
    impl Store for StalledStore {
        fn label(&self) -> &str {
            "stalled"
        }

        async fn fetch(&self, _resource: &str) -> Result<Vec<u8>, FetchError> {
            std::future::pending().await
        }
    }

    const LEVEL: &str = r#"{ "name": "Alpha", "verifier": "V", "records": [
        { "user": "low", "percent": 40 }, { "user": "high", "percent": 100 }
    ] }"#;

    fn loader(stores: Vec<Arc<dyn Store>>) -> LevelLoader {
        LevelLoader::new(stores, Duration::from_millis(50))
    }

    #[tokio::test]
    async fn primary_store_wins() {
        let primary: Arc<dyn Store> = Arc::new(MemoryStore::new("primary").with("alpha.json", LEVEL));
        let level = loader(vec![primary]).load_level(&"alpha".into()).await.unwrap();
        assert_eq!(level.name, "Alpha");
        assert_eq!(level.source, "primary");
        assert!(!level.fallback);
        assert_eq!(level.records[0].user, "high");
    }

    #[tokio::test]
    async fn falls_back_past_missing_and_malformed_payloads() {
        let broken: Arc<dyn Store> = Arc::new(MemoryStore::new("broken").with("alpha.json", "{ nope"));
        let empty: Arc<dyn Store> = Arc::new(MemoryStore::new("empty"));
        let backup: Arc<dyn Store> = Arc::new(MemoryStore::new("backup").with("alpha.json", LEVEL));
        let level = loader(vec![broken, empty, backup])
            .load_level(&"alpha".into())
            .await
            .unwrap();
        assert_eq!(level.source, "backup");
        assert!(level.fallback);
    }

    #[tokio::test]
    async fn exhausting_every_store_is_a_failure_value() {
        let broken: Arc<dyn Store> = Arc::new(MemoryStore::new("broken").with("alpha.json", "[]"));
        let empty: Arc<dyn Store> = Arc::new(MemoryStore::new("empty"));
        let failure = loader(vec![broken, empty])
            .load_level(&"alpha".into())
            .await
            .unwrap_err();
        assert_eq!(failure.id.as_str(), "alpha");
        assert_eq!(failure.attempts.len(), 2);
        assert_eq!(failure.attempts[0].store, "broken");
        assert!(failure.attempts[0].reason.contains("malformed"));
        assert!(failure.to_string().starts_with("alpha ("));
    }

    #[tokio::test]
    async fn stalled_store_times_out_and_falls_back() {
        let stalled: Arc<dyn Store> = Arc::new(StalledStore);
        let backup: Arc<dyn Store> = Arc::new(MemoryStore::new("backup").with("alpha.json", LEVEL));
        let level = loader(vec![stalled.clone(), backup])
            .load_level(&"alpha".into())
            .await
            .unwrap();
        assert_eq!(level.source, "backup");

        let failure = loader(vec![stalled])
            .load_level(&"alpha".into())
            .await
            .unwrap_err();
        assert!(failure.attempts[0].reason.contains("timed out"));
    }

    #[test]
    fn no_stores_fails_without_attempts() {
        let failure = tokio_test::block_on(loader(Vec::new()).load_level(&"alpha".into()))
            .unwrap_err();
        assert!(failure.attempts.is_empty());
        assert!(failure.to_string().contains("no search paths"));
    }
}
