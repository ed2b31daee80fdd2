//! Crate-wide error type.
//!
//! One `AppError` enum covers every stage of the pipeline; there is no
//! recovery path, so every variant terminates the run when it reaches
//! `main`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("configuration error: {0}")]
    Config(String),

    /// Transport- or status-level failure talking to the completion
    /// endpoint.
    #[error("llm request failed: {0}")]
    LlmService(String),

    /// A structured completion that does not decode into the declared
    /// field set, or decodes with empty fields.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Context-attaching conversions for errors from the underlying services.
pub trait ResultExt<T> {
    fn config_err(self, msg: &str) -> AppResult<T>;

    fn llm_err(self, msg: &str) -> AppResult<T>;

    fn embedding_err(self, msg: &str) -> AppResult<T>;

    fn store_err(self, msg: &str) -> AppResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn config_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Config(format!("{}: {}", msg, e)))
    }

    fn llm_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::LlmService(format!("{}: {}", msg, e)))
    }

    fn embedding_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Embedding(format!("{}: {}", msg, e)))
    }

    fn store_err(self, msg: &str) -> AppResult<T> {
        self.map_err(|e| AppError::Store(format!("{}: {}", msg, e)))
    }
}
