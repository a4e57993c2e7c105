use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// A translation candidate for a single word.
#[derive(Debug, Clone, Deserialize)]
pub struct LookupResult {
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("no translation found")]
    Empty,
}

/// Boundary to the external translation service. The service is unreliable:
/// callers must treat every error here as recoverable.
#[async_trait::async_trait]
pub trait LookupProvider: Send + Sync {
    async fn lookup(&self, word: &str) -> Result<LookupResult, LookupError>;
}

#[derive(Debug, Clone)]
pub struct LookupConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct HttpLookupProvider {
    config: LookupConfig,
    client: reqwest::Client,
}

impl HttpLookupProvider {
    pub fn from_env() -> Self {
        let endpoint = env_string("LOOKUP_API_ENDPOINT");
        let api_key = env_string("LOOKUP_API_KEY");
        let timeout = Duration::from_millis(
            env_string("LOOKUP_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config: LookupConfig {
                endpoint,
                api_key,
                timeout,
            },
            client,
        }
    }

    pub fn is_available(&self) -> bool {
        self.config
            .endpoint
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty())
    }
}

#[async_trait::async_trait]
impl LookupProvider for HttpLookupProvider {
    async fn lookup(&self, word: &str) -> Result<LookupResult, LookupError> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(LookupError::NotConfigured("LOOKUP_API_ENDPOINT"))?;

        let mut request = self
            .client
            .get(endpoint.trim_end_matches('/'))
            .query(&[("entry", word)]);
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::HttpStatus { status, body });
        }

        let result: LookupResult = response.json().await?;
        if result.meaning.trim().is_empty() {
            return Err(LookupError::Empty);
        }

        Ok(result)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
