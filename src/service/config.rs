//! Service configuration.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection and batching settings for the external services.
///
/// Model lists are in priority order; [`GeminiClient::connect`](super::GeminiClient::connect)
/// picks the first one the account can use.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_models: Vec<String>,
    pub vision_models: Vec<String>,
    pub embedding_model: String,
    /// Maximum vision calls in flight
    pub concurrency: usize,
    /// Retries after a rate-limited call
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub backoff_base: Duration,
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Configuration with defaults and the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_models: vec![
                "gemini-1.5-flash-latest".to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-pro".to_string(),
            ],
            vision_models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-pro-vision".to_string(),
            ],
            embedding_model: "embedding-001".to_string(),
            concurrency: 5,
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Read the configuration from the environment.
    ///
    /// Fails with [`Error::MissingCredential`] when no API key is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingCredential(API_KEY_VAR))?;

        let mut config = Self::new(api_key.trim());
        if let Some(url) = lookup("DOCALIGN_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(models) = lookup("DOCALIGN_TEXT_MODELS") {
            config.text_models = parse_model_list(&models);
        }
        if let Some(models) = lookup("DOCALIGN_VISION_MODELS") {
            config.vision_models = parse_model_list(&models);
        }
        if let Some(model) = lookup("DOCALIGN_EMBEDDING_MODEL") {
            config.embedding_model = normalize_model(&model);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_text_models<S: Into<String>>(mut self, models: impl IntoIterator<Item = S>) -> Self {
        self.text_models = models.into_iter().map(|m| normalize_model(&m.into())).collect();
        self
    }

    pub fn with_vision_models<S: Into<String>>(mut self, models: impl IntoIterator<Item = S>) -> Self {
        self.vision_models = models.into_iter().map(|m| normalize_model(&m.into())).collect();
        self
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = normalize_model(&model.into());
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_base: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Strip the `models/` resource prefix.
pub(crate) fn normalize_model(name: &str) -> String {
    name.trim().trim_start_matches("models/").to_string()
}

fn parse_model_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(normalize_model)
        .filter(|m| !m.is_empty())
        .collect()
}
