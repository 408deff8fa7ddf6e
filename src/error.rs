//! Error types for the cheatsmith core
//!
//! All errors use thiserror for structured error handling.
//! Every failure surfaces to the caller as a transient, non-fatal error;
//! nothing in this crate retries automatically.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cloud backend error: {0}")]
    Remote(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Cheatsheet not found: {0}")]
    CheatsheetNotFound(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("AI provider rate limit reached, please try again later")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, AppError>;
