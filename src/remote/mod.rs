//! Cloud backend adapter
//!
//! Translates the storage interface into authenticated REST requests
//! against a hosted relational backend (PostgREST-style: one route per
//! table, filters as query parameters). Row-level security on the server
//! scopes every row to its owning user; the client additionally filters
//! cheatsheet reads by user id and stamps it on inserts, but entry
//! visibility is enforced transitively server-side only.

pub mod auth;

pub use auth::{AuthClient, Session};

use crate::config::REMOTE_REQUEST_TIMEOUT_SECS;
use crate::database::models::*;
use crate::error::{AppError, Result};
use crate::storage::SheetStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

const CHEATSHEETS_TABLE: &str = "cheatsheets";
const ENTRIES_TABLE: &str = "syntax_entries";

/// Error body returned by the table endpoints
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
}

/// Store adapter for the hosted backend
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    auth: AuthClient,
}

impl RemoteStore {
    /// Construct the adapter; requires both connection credentials.
    pub fn new(credentials: &RemoteCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REMOTE_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: credentials.url.clone(),
            anon_key: credentials.anon_key.clone(),
            auth: AuthClient::new(credentials)?,
        })
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// Identity of the signed-in user, if any.
    ///
    /// Read live from the auth subscription, so a sign-in or sign-out is
    /// reflected on the next operation without any polling.
    pub fn current_user_id(&self) -> Option<String> {
        self.auth.session().map(|s| s.user_id)
    }

    fn user_id(&self) -> Result<String> {
        self.current_user_id()
            .ok_or_else(|| AppError::Auth("not signed in".to_string()))
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Attach the api key and the strongest available bearer token
    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self
            .auth
            .session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone());

        req.header("apikey", self.anon_key.as_str())
            .bearer_auth(bearer)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<RemoteErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("request failed with status {}", status));

        Err(AppError::Remote(message))
    }

    /// PATCH rows matching `filter`, returning the updated representation
    async fn patch_rows(
        &self,
        table: &str,
        filter: (&str, String),
        body: &Value,
    ) -> Result<Vec<Value>> {
        let response = self
            .authed(self.http.patch(self.table_url(table)))
            .query(&[filter])
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;

        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Ok(rows)
    }
}

/// Insert payload for a cheatsheet row, stamped with the owner's identity
fn cheatsheet_insert(req: &CreateCheatsheetRequest, user_id: &str) -> Value {
    let now = Utc::now();
    json!({
        "id": Uuid::new_v4().to_string(),
        "user_id": user_id,
        "title": req.title,
        "description": req.description,
        "created_at": now,
        "updated_at": now,
        "deleted_at": null,
    })
}

/// Insert payload for an entry row (position computed by the caller)
fn entry_insert(req: &CreateEntryRequest) -> Value {
    let now = Utc::now();
    json!({
        "id": Uuid::new_v4().to_string(),
        "cheatsheet_id": req.cheatsheet_id,
        "syntax": req.syntax,
        "category": req.category,
        "description": req.description,
        "example": req.example,
        "notes": req.notes,
        "language": req.language.as_deref().unwrap_or(crate::config::DEFAULT_LANGUAGE),
        "display_format": req.display_format.unwrap_or_default().as_str(),
        "position": req.position,
        "created_at": now,
        "updated_at": now,
    })
}

/// Patch payload for a partial cheatsheet update; unset fields are omitted
fn cheatsheet_patch(req: &UpdateCheatsheetRequest) -> Value {
    let mut patch = serde_json::Map::new();
    patch.insert("updated_at".to_string(), json!(Utc::now()));
    if let Some(title) = &req.title {
        patch.insert("title".to_string(), json!(title));
    }
    if let Some(description) = &req.description {
        patch.insert("description".to_string(), json!(description));
    }
    Value::Object(patch)
}

/// Patch payload for a partial entry update; unset fields are omitted
fn entry_patch(req: &UpdateEntryRequest) -> Value {
    let mut patch = serde_json::Map::new();
    patch.insert("updated_at".to_string(), json!(Utc::now()));
    if let Some(syntax) = &req.syntax {
        patch.insert("syntax".to_string(), json!(syntax));
    }
    if let Some(category) = &req.category {
        patch.insert("category".to_string(), json!(category));
    }
    if let Some(description) = &req.description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(example) = &req.example {
        patch.insert("example".to_string(), json!(example));
    }
    if let Some(notes) = &req.notes {
        patch.insert("notes".to_string(), json!(notes));
    }
    if let Some(language) = &req.language {
        patch.insert("language".to_string(), json!(language));
    }
    if let Some(format) = req.display_format {
        patch.insert("display_format".to_string(), json!(format.as_str()));
    }
    Value::Object(patch)
}

#[async_trait]
impl SheetStore for RemoteStore {
    async fn list_cheatsheets(&self, view: View) -> Result<Vec<Cheatsheet>> {
        let user_id = self.user_id()?;
        let deleted_filter = match view {
            View::Active => "is.null",
            View::Trash => "not.is.null",
        };

        let response = self
            .authed(self.http.get(self.table_url(CHEATSHEETS_TABLE)))
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", user_id)),
                ("deleted_at", deleted_filter.to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        let sheets: Vec<Cheatsheet> = Self::check(response).await?.json().await?;
        Ok(sheets)
    }

    async fn get_cheatsheet(&self, id: &str) -> Result<Cheatsheet> {
        let response = self
            .authed(self.http.get(self.table_url(CHEATSHEETS_TABLE)))
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))])
            .send()
            .await?;

        let mut sheets: Vec<Cheatsheet> = Self::check(response).await?.json().await?;
        sheets
            .pop()
            .ok_or_else(|| AppError::CheatsheetNotFound(id.to_string()))
    }

    async fn create_cheatsheet(&self, req: CreateCheatsheetRequest) -> Result<Cheatsheet> {
        let user_id = self.user_id()?;

        let response = self
            .authed(self.http.post(self.table_url(CHEATSHEETS_TABLE)))
            .header("Prefer", "return=representation")
            .json(&cheatsheet_insert(&req, &user_id))
            .send()
            .await?;

        let mut sheets: Vec<Cheatsheet> = Self::check(response).await?.json().await?;
        sheets
            .pop()
            .ok_or_else(|| AppError::Remote("insert returned no row".to_string()))
    }

    async fn update_cheatsheet(&self, req: UpdateCheatsheetRequest) -> Result<Cheatsheet> {
        let rows = self
            .patch_rows(
                CHEATSHEETS_TABLE,
                ("id", format!("eq.{}", req.id)),
                &cheatsheet_patch(&req),
            )
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::CheatsheetNotFound(req.id.clone()))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn soft_delete_cheatsheet(&self, id: &str) -> Result<()> {
        let now = Utc::now();
        let rows = self
            .patch_rows(
                CHEATSHEETS_TABLE,
                ("id", format!("eq.{}", id)),
                &json!({ "deleted_at": now, "updated_at": now }),
            )
            .await?;

        if rows.is_empty() {
            return Err(AppError::CheatsheetNotFound(id.to_string()));
        }

        tracing::debug!("Soft deleted cheatsheet: {}", id);
        Ok(())
    }

    async fn restore_cheatsheet(&self, id: &str) -> Result<()> {
        let rows = self
            .patch_rows(
                CHEATSHEETS_TABLE,
                ("id", format!("eq.{}", id)),
                &json!({ "deleted_at": null, "updated_at": Utc::now() }),
            )
            .await?;

        if rows.is_empty() {
            return Err(AppError::CheatsheetNotFound(id.to_string()));
        }

        tracing::debug!("Restored cheatsheet: {}", id);
        Ok(())
    }

    async fn purge_cheatsheet(&self, id: &str) -> Result<()> {
        // No cross-table transaction on the REST surface. Entries go
        // first: if the second request fails we are left with an empty
        // cheatsheet, never with orphaned entries.
        let response = self
            .authed(self.http.delete(self.table_url(ENTRIES_TABLE)))
            .query(&[("cheatsheet_id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::check(response).await?;

        let response = self
            .authed(self.http.delete(self.table_url(CHEATSHEETS_TABLE)))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::check(response).await?;

        tracing::debug!("Purged cheatsheet: {}", id);
        Ok(())
    }

    async fn list_entries(&self, cheatsheet_id: &str) -> Result<Vec<SyntaxEntry>> {
        let response = self
            .authed(self.http.get(self.table_url(ENTRIES_TABLE)))
            .query(&[
                ("select", "*".to_string()),
                ("cheatsheet_id", format!("eq.{}", cheatsheet_id)),
                ("order", "position.asc,created_at.asc".to_string()),
            ])
            .send()
            .await?;

        let entries: Vec<SyntaxEntry> = Self::check(response).await?.json().await?;
        Ok(entries)
    }

    async fn create_entry(&self, req: CreateEntryRequest) -> Result<SyntaxEntry> {
        let response = self
            .authed(self.http.post(self.table_url(ENTRIES_TABLE)))
            .header("Prefer", "return=representation")
            .json(&entry_insert(&req))
            .send()
            .await?;

        let mut entries: Vec<SyntaxEntry> = Self::check(response).await?.json().await?;
        entries
            .pop()
            .ok_or_else(|| AppError::Remote("insert returned no row".to_string()))
    }

    async fn update_entry(&self, req: UpdateEntryRequest) -> Result<SyntaxEntry> {
        let rows = self
            .patch_rows(
                ENTRIES_TABLE,
                ("id", format!("eq.{}", req.id)),
                &entry_patch(&req),
            )
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EntryNotFound(req.id.clone()))?;
        Ok(serde_json::from_value(row)?)
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        let response = self
            .authed(self.http.delete(self.table_url(ENTRIES_TABLE)))
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;
        Self::check(response).await?;

        tracing::debug!("Deleted entry: {}", id);
        Ok(())
    }

    async fn reorder_entries(
        &self,
        cheatsheet_id: &str,
        positions: &[EntryPosition],
    ) -> Result<()> {
        // The backend offers no batch primitive; each assignment is one
        // PATCH. The first failure aborts the remaining updates and is
        // surfaced as a single aggregate error.
        let now = Utc::now();

        for (applied, assignment) in positions.iter().enumerate() {
            let result = self
                .patch_rows(
                    ENTRIES_TABLE,
                    ("id", format!("eq.{}", assignment.id)),
                    &json!({ "position": assignment.position, "updated_at": now }),
                )
                .await
                .and_then(|rows| {
                    if rows.is_empty() {
                        Err(AppError::EntryNotFound(assignment.id.clone()))
                    } else {
                        Ok(())
                    }
                });

            if let Err(e) = result {
                return Err(AppError::Remote(format!(
                    "reorder aborted after {} of {} updates: {}",
                    applied,
                    positions.len(),
                    e
                )));
            }
        }

        tracing::debug!(
            "Reordered {} entries in cheatsheet: {}",
            positions.len(),
            cheatsheet_id
        );
        Ok(())
    }
}
