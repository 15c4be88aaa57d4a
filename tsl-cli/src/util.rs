use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tsl_engine::{DirStore, Store};

use crate::http::HttpStore;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn is_remote(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Map search paths to stores: URLs become HTTP stores, anything else a directory.
pub fn build_stores(paths: &[String], timeout: Duration) -> Result<Vec<Arc<dyn Store>>> {
    paths
        .iter()
        .map(|path| -> Result<Arc<dyn Store>> {
            if is_remote(path) {
                Ok(Arc::new(HttpStore::new(path, timeout)?))
            } else {
                Ok(Arc::new(DirStore::new(path)))
            }
        })
        .collect()
}
