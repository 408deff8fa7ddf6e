//! Application configuration constants
//!
//! Central location for configuration constants, defaults, and
//! validation boundaries used throughout the application.

// ===== Local Store =====

/// Filename of the local SQLite database inside the data directory
pub const DATABASE_FILENAME: &str = "cheatsmith.db";

/// Fixed key under which the singleton AppConfig row is stored
pub const APP_CONFIG_KEY: &str = "app_config";

// ===== Entry Defaults =====

/// Language tag applied to entries that do not specify one
pub const DEFAULT_LANGUAGE: &str = "javascript";

// ===== Validation Boundaries =====

/// Maximum length for a cheatsheet title.
/// Prevents excessively long values from being stored.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length for an entry's syntax term
pub const MAX_SYNTAX_LENGTH: usize = 500;

/// Maximum length for an entry's category label
pub const MAX_CATEGORY_LENGTH: usize = 100;

// ===== AI Provider =====

/// Generative text endpoint; the API key is appended as a query parameter
pub const AI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Request timeout for AI generation calls in seconds
pub const AI_REQUEST_TIMEOUT_SECS: u64 = 30;

// ===== Cloud Backend =====

/// Request timeout for cloud backend calls in seconds
pub const REMOTE_REQUEST_TIMEOUT_SECS: u64 = 15;
