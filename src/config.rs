//! Runtime configuration.
//!
//! The only external configuration surface is the provider credential in
//! the environment; everything else ships as defaults. This is a
//! straight-through batch job, not an interactive CLI.

use std::env;

use crate::error::{AppError, AppResult};

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_MODEL: &str = "OPENAI_MODEL";

const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LISTINGS_PATH: &str = "./listings.csv";
const DEFAULT_LISTINGS_PER_CATEGORY: usize = 3;
const DEFAULT_TOP_K: usize = 3;

/// Completion-endpoint settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
}

/// Embedding model and store-directory settings.
#[derive(Debug, Clone)]
pub struct VectorConfig {
    pub store_path: String,
    pub table_name: String,
    pub embedding_model: String,
    pub vector_size: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            store_path: "./listing_index".to_string(),
            table_name: "listings".to_string(),
            embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
            vector_size: 384,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub vector: VectorConfig,
    pub listings_path: String,
    pub listings_per_category: usize,
    pub top_k: usize,
}

impl AppConfig {
    /// Builds the run configuration from the environment. The provider key
    /// is required; base URL and model may be overridden.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var(ENV_API_KEY)
            .map_err(|_| AppError::Config(format!("{ENV_API_KEY} is not set")))?;
        if api_key.trim().is_empty() {
            return Err(AppError::Config(format!("{ENV_API_KEY} is empty")));
        }

        let base_url = env::var(ENV_BASE_URL)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let model =
            env::var(ENV_MODEL).unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                base_url,
                model,
            },
            vector: VectorConfig::default(),
            listings_path: DEFAULT_LISTINGS_PATH.to_string(),
            listings_per_category: DEFAULT_LISTINGS_PER_CATEGORY,
            top_k: DEFAULT_TOP_K,
        })
    }
}
