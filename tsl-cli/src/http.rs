use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tsl_engine::{FetchError, Store};

/// A search path served over HTTP, e.g. `https://example.com/data`.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base, resource.trim_start_matches('/'))
    }
}

#[async_trait]
impl Store for HttpStore {
    fn label(&self) -> &str {
        &self.base
    }

    async fn fetch(&self, resource: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.url(resource);
        let http_error = |reason: String| FetchError::Http {
            resource: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| http_error(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { resource: url });
        }
        if !status.is_success() {
            return Err(http_error(format!("HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|err| http_error(err.to_string()))
    }
}
