//! Database models
//!
//! Rust structs representing the persisted entities. The same models are
//! used for the local SQLite store and the cloud backend; serde handles
//! the wire representation for the latter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named collection of syntax reference entries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cheatsheet {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Non-null marks the cheatsheet as trashed but not physically removed
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Visual grouping an entry renders under.
///
/// Rendering-only: `position` is one cheatsheet-wide sequence shared
/// across all three formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DisplayFormat {
    Card,
    Table,
    Compact,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        DisplayFormat::Card
    }
}

impl DisplayFormat {
    /// Stored/wire representation, matching the serde rename
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayFormat::Card => "card",
            DisplayFormat::Table => "table",
            DisplayFormat::Compact => "compact",
        }
    }
}

/// One syntax reference record belonging to a cheatsheet
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SyntaxEntry {
    pub id: String,
    pub cheatsheet_id: String,
    pub syntax: String,
    pub category: String,
    pub description: Option<String>,
    pub example: Option<String>,
    pub notes: Option<String>,
    pub language: String,
    pub display_format: DisplayFormat,
    /// Display order within the owning cheatsheet, zero-based
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which side of the soft-delete divide a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Active,
    Trash,
}

/// Create cheatsheet request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheatsheetRequest {
    pub title: String,
    pub description: Option<String>,
}

/// Update cheatsheet request; `None` fields retain their prior values
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCheatsheetRequest {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Create entry request.
///
/// `position` is computed by the caller as max existing position + 1
/// (or 0 for an empty cheatsheet) so appends always sort last.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryRequest {
    pub cheatsheet_id: String,
    pub syntax: String,
    pub category: String,
    pub description: Option<String>,
    pub example: Option<String>,
    pub notes: Option<String>,
    pub language: Option<String>,
    pub display_format: Option<DisplayFormat>,
    pub position: i64,
}

/// Update entry request; `None` fields retain their prior values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryRequest {
    pub id: String,
    pub syntax: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub notes: Option<String>,
    pub language: Option<String>,
    pub display_format: Option<DisplayFormat>,
}

/// One (entry id, new position) assignment in a reorder batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPosition {
    pub id: String,
    pub position: i64,
}

/// Credentials required to construct the cloud backend adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    pub url: String,
    pub anon_key: String,
}

/// Active persistence mode, derived from AppConfig once at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// On-device persistence only, no account
    Guest,
    /// User-supplied hosted backend with authenticated identity
    Cloud(RemoteCredentials),
}

/// Singleton application configuration.
///
/// Stored in the local config table under a fixed key regardless of the
/// active mode, so mode selection always bootstraps from local state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote_anon_key: Option<String>,
    #[serde(default)]
    pub ai_api_key: Option<String>,
}

impl AppConfig {
    /// Derive the persistence mode: cloud iff both remote credentials are set
    pub fn mode(&self) -> Mode {
        match (&self.remote_url, &self.remote_anon_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Mode::Cloud(RemoteCredentials {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key: key.clone(),
                })
            }
            _ => Mode::Guest,
        }
    }

    /// Whether AI-assisted generation is available
    pub fn ai_enabled(&self) -> bool {
        self.ai_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
