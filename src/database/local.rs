//! Local store
//!
//! SQLite-backed implementation of the storage interface, plus the
//! singleton config row. This is the guest-mode backend and the
//! bootstrap source for mode selection in every mode.

use super::models::*;
use crate::config::APP_CONFIG_KEY;
use crate::error::{AppError, Result};
use crate::storage::SheetStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Local SQLite store
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the singleton AppConfig, or the default when none is stored yet
    pub async fn load_config(&self) -> Result<AppConfig> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM config WHERE key = ?")
            .bind(APP_CONFIG_KEY)
            .fetch_optional(&self.pool)
            .await?;

        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(AppConfig::default()),
        }
    }

    /// Persist the singleton AppConfig (upsert under the fixed key)
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;

        sqlx::query(
            r#"
            INSERT INTO config (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(APP_CONFIG_KEY)
        .bind(&json)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Saved app config");
        Ok(())
    }
}

#[async_trait]
impl SheetStore for LocalStore {
    async fn list_cheatsheets(&self, view: View) -> Result<Vec<Cheatsheet>> {
        let sql = match view {
            View::Active => {
                "SELECT * FROM cheatsheets WHERE deleted_at IS NULL ORDER BY created_at DESC"
            }
            View::Trash => {
                "SELECT * FROM cheatsheets WHERE deleted_at IS NOT NULL ORDER BY created_at DESC"
            }
        };

        let sheets = sqlx::query_as::<_, Cheatsheet>(sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(sheets)
    }

    async fn get_cheatsheet(&self, id: &str) -> Result<Cheatsheet> {
        let sheet = sqlx::query_as::<_, Cheatsheet>("SELECT * FROM cheatsheets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::CheatsheetNotFound(id.to_string()))?;

        Ok(sheet)
    }

    async fn create_cheatsheet(&self, req: CreateCheatsheetRequest) -> Result<Cheatsheet> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let sheet = sqlx::query_as::<_, Cheatsheet>(
            r#"
            INSERT INTO cheatsheets (id, title, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created cheatsheet: {}", id);
        Ok(sheet)
    }

    async fn update_cheatsheet(&self, req: UpdateCheatsheetRequest) -> Result<Cheatsheet> {
        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE cheatsheets SET updated_at = ?".to_string();
        let mut params: Vec<String> = vec![now.to_rfc3339()];

        if let Some(title) = &req.title {
            query.push_str(", title = ?");
            params.push(title.clone());
        }

        if let Some(description) = &req.description {
            query.push_str(", description = ?");
            params.push(description.clone());
        }

        query.push_str(" WHERE id = ?");
        params.push(req.id.clone());

        let mut q = sqlx::query(&query);
        for param in &params {
            q = q.bind(param);
        }

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::CheatsheetNotFound(req.id));
        }

        self.get_cheatsheet(&req.id).await
    }

    async fn soft_delete_cheatsheet(&self, id: &str) -> Result<()> {
        let now = Utc::now();

        let rows = sqlx::query("UPDATE cheatsheets SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::CheatsheetNotFound(id.to_string()));
        }

        tracing::debug!("Soft deleted cheatsheet: {}", id);
        Ok(())
    }

    async fn restore_cheatsheet(&self, id: &str) -> Result<()> {
        let now = Utc::now();

        let rows =
            sqlx::query("UPDATE cheatsheets SET deleted_at = NULL, updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if rows == 0 {
            return Err(AppError::CheatsheetNotFound(id.to_string()));
        }

        tracing::debug!("Restored cheatsheet: {}", id);
        Ok(())
    }

    async fn purge_cheatsheet(&self, id: &str) -> Result<()> {
        // Entries first, then the parent row, in one transaction.
        // The FK cascade would cover the entries anyway; the explicit
        // order keeps the operation safe on engines without it.
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM syntax_entries WHERE cheatsheet_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query("DELETE FROM cheatsheets WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::CheatsheetNotFound(id.to_string()));
        }

        tx.commit().await?;

        tracing::debug!("Purged cheatsheet: {}", id);
        Ok(())
    }

    async fn list_entries(&self, cheatsheet_id: &str) -> Result<Vec<SyntaxEntry>> {
        let entries = sqlx::query_as::<_, SyntaxEntry>(
            r#"
            SELECT * FROM syntax_entries
            WHERE cheatsheet_id = ?
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(cheatsheet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn create_entry(&self, req: CreateEntryRequest) -> Result<SyntaxEntry> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let language = req
            .language
            .unwrap_or_else(|| crate::config::DEFAULT_LANGUAGE.to_string());
        let display_format = req.display_format.unwrap_or_default();

        let entry = sqlx::query_as::<_, SyntaxEntry>(
            r#"
            INSERT INTO syntax_entries
                (id, cheatsheet_id, syntax, category, description, example, notes,
                 language, display_format, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.cheatsheet_id)
        .bind(&req.syntax)
        .bind(&req.category)
        .bind(&req.description)
        .bind(&req.example)
        .bind(&req.notes)
        .bind(&language)
        .bind(display_format)
        .bind(req.position)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(
            "Created entry: {} in cheatsheet: {} at position {}",
            id,
            req.cheatsheet_id,
            req.position
        );
        Ok(entry)
    }

    async fn update_entry(&self, req: UpdateEntryRequest) -> Result<SyntaxEntry> {
        let now = Utc::now();

        // Build dynamic update query
        let mut query = "UPDATE syntax_entries SET updated_at = ?".to_string();
        let mut params: Vec<String> = vec![now.to_rfc3339()];

        if let Some(syntax) = &req.syntax {
            query.push_str(", syntax = ?");
            params.push(syntax.clone());
        }
        if let Some(category) = &req.category {
            query.push_str(", category = ?");
            params.push(category.clone());
        }
        if let Some(description) = &req.description {
            query.push_str(", description = ?");
            params.push(description.clone());
        }
        if let Some(example) = &req.example {
            query.push_str(", example = ?");
            params.push(example.clone());
        }
        if let Some(notes) = &req.notes {
            query.push_str(", notes = ?");
            params.push(notes.clone());
        }
        if let Some(language) = &req.language {
            query.push_str(", language = ?");
            params.push(language.clone());
        }
        if let Some(format) = req.display_format {
            query.push_str(", display_format = ?");
            params.push(format.as_str().to_string());
        }

        query.push_str(" WHERE id = ?");
        params.push(req.id.clone());

        let mut q = sqlx::query(&query);
        for param in &params {
            q = q.bind(param);
        }

        let rows_affected = q.execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::EntryNotFound(req.id));
        }

        let entry = sqlx::query_as::<_, SyntaxEntry>("SELECT * FROM syntax_entries WHERE id = ?")
            .bind(&req.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(entry)
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM syntax_entries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::EntryNotFound(id.to_string()));
        }

        tracing::debug!("Deleted entry: {}", id);
        Ok(())
    }

    async fn reorder_entries(
        &self,
        cheatsheet_id: &str,
        positions: &[EntryPosition],
    ) -> Result<()> {
        let now = Utc::now();

        // All assignments commit together or not at all
        let mut tx = self.pool.begin().await?;

        for assignment in positions {
            let rows = sqlx::query(
                r#"
                UPDATE syntax_entries SET position = ?, updated_at = ?
                WHERE id = ? AND cheatsheet_id = ?
                "#,
            )
            .bind(assignment.position)
            .bind(now)
            .bind(&assignment.id)
            .bind(cheatsheet_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows == 0 {
                return Err(AppError::EntryNotFound(assignment.id.clone()));
            }
        }

        tx.commit().await?;

        tracing::debug!(
            "Reordered {} entries in cheatsheet: {}",
            positions.len(),
            cheatsheet_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_store() -> LocalStore {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        LocalStore::new(pool)
    }

    fn sheet_req(title: &str) -> CreateCheatsheetRequest {
        CreateCheatsheetRequest {
            title: title.to_string(),
            description: None,
        }
    }

    fn entry_req(cheatsheet_id: &str, syntax: &str, position: i64) -> CreateEntryRequest {
        CreateEntryRequest {
            cheatsheet_id: cheatsheet_id.to_string(),
            syntax: syntax.to_string(),
            category: "General".to_string(),
            description: None,
            example: None,
            notes: None,
            language: None,
            display_format: None,
            position,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_cheatsheet() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("JS Basics")).await.unwrap();
        assert_eq!(sheet.title, "JS Basics");
        assert!(sheet.deleted_at.is_none());

        let fetched = store.get_cheatsheet(&sheet.id).await.unwrap();
        assert_eq!(fetched.id, sheet.id);
        assert_eq!(fetched.title, sheet.title);
    }

    #[tokio::test]
    async fn test_get_missing_cheatsheet() {
        let store = create_test_store().await;

        let result = store.get_cheatsheet("no-such-id").await;
        assert!(matches!(result, Err(AppError::CheatsheetNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_cheatsheet_partial() {
        let store = create_test_store().await;

        let sheet = store
            .create_cheatsheet(CreateCheatsheetRequest {
                title: "Original".to_string(),
                description: Some("Keep me".to_string()),
            })
            .await
            .unwrap();

        let updated = store
            .update_cheatsheet(UpdateCheatsheetRequest {
                id: sheet.id.clone(),
                title: Some("Renamed".to_string()),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description.as_deref(), Some("Keep me"));
        assert!(updated.updated_at >= sheet.updated_at);
    }

    #[tokio::test]
    async fn test_views_are_exclusive() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Trash me")).await.unwrap();

        let active = store.list_cheatsheets(View::Active).await.unwrap();
        let trash = store.list_cheatsheets(View::Trash).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(trash.len(), 0);

        store.soft_delete_cheatsheet(&sheet.id).await.unwrap();

        let active = store.list_cheatsheets(View::Active).await.unwrap();
        let trash = store.list_cheatsheets(View::Trash).await.unwrap();
        assert_eq!(active.len(), 0);
        assert_eq!(trash.len(), 1);

        store.restore_cheatsheet(&sheet.id).await.unwrap();

        let active = store.list_cheatsheets(View::Active).await.unwrap();
        let trash = store.list_cheatsheets(View::Trash).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(trash.len(), 0);
    }

    #[tokio::test]
    async fn test_soft_delete_then_restore_preserves_fields() {
        let store = create_test_store().await;

        let sheet = store
            .create_cheatsheet(CreateCheatsheetRequest {
                title: "Round trip".to_string(),
                description: Some("desc".to_string()),
            })
            .await
            .unwrap();

        store.soft_delete_cheatsheet(&sheet.id).await.unwrap();
        // Soft delete is idempotent
        store.soft_delete_cheatsheet(&sheet.id).await.unwrap();
        store.restore_cheatsheet(&sheet.id).await.unwrap();

        let restored = store.get_cheatsheet(&sheet.id).await.unwrap();
        assert_eq!(restored.title, sheet.title);
        assert_eq!(restored.description, sheet.description);
        assert_eq!(restored.created_at, sheet.created_at);
        assert!(restored.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = create_test_store().await;

        for i in 1..=3 {
            store
                .create_cheatsheet(sheet_req(&format!("Sheet {}", i)))
                .await
                .unwrap();
            // Distinct timestamps so ordering is deterministic
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let sheets = store.list_cheatsheets(View::Active).await.unwrap();
        assert_eq!(sheets.len(), 3);
        assert_eq!(sheets[0].title, "Sheet 3");
        assert_eq!(sheets[2].title, "Sheet 1");
    }

    #[tokio::test]
    async fn test_create_entry_defaults() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Defaults")).await.unwrap();
        let entry = store
            .create_entry(entry_req(&sheet.id, "Array.map()", 0))
            .await
            .unwrap();

        assert_eq!(entry.language, "javascript");
        assert_eq!(entry.display_format, DisplayFormat::Card);
        assert_eq!(entry.position, 0);
    }

    #[tokio::test]
    async fn test_update_entry_partial() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Partial")).await.unwrap();
        let entry = store
            .create_entry(entry_req(&sheet.id, "let x = 1", 0))
            .await
            .unwrap();

        let updated = store
            .update_entry(UpdateEntryRequest {
                id: entry.id.clone(),
                description: Some("Binds a variable".to_string()),
                display_format: Some(DisplayFormat::Table),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.syntax, "let x = 1");
        assert_eq!(updated.description.as_deref(), Some("Binds a variable"));
        assert_eq!(updated.display_format, DisplayFormat::Table);
        assert_eq!(updated.position, 0);
    }

    #[tokio::test]
    async fn test_purge_cascades_to_entries() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Purge")).await.unwrap();
        for i in 0..3 {
            store
                .create_entry(entry_req(&sheet.id, &format!("s{}", i), i))
                .await
                .unwrap();
        }

        store.purge_cheatsheet(&sheet.id).await.unwrap();

        let entries = store.list_entries(&sheet.id).await.unwrap();
        assert!(entries.is_empty());

        let result = store.get_cheatsheet(&sheet.id).await;
        assert!(matches!(result, Err(AppError::CheatsheetNotFound(_))));
    }

    #[tokio::test]
    async fn test_reorder_applies_dense_positions() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Reorder")).await.unwrap();
        let a = store.create_entry(entry_req(&sheet.id, "a", 0)).await.unwrap();
        let b = store.create_entry(entry_req(&sheet.id, "b", 1)).await.unwrap();
        let c = store.create_entry(entry_req(&sheet.id, "c", 2)).await.unwrap();

        store
            .reorder_entries(
                &sheet.id,
                &[
                    EntryPosition { id: c.id.clone(), position: 0 },
                    EntryPosition { id: a.id.clone(), position: 1 },
                    EntryPosition { id: b.id.clone(), position: 2 },
                ],
            )
            .await
            .unwrap();

        let entries = store.list_entries(&sheet.id).await.unwrap();
        let order: Vec<&str> = entries.iter().map(|e| e.syntax.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);

        let positions: Vec<i64> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_reorder_unknown_entry_rolls_back() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Rollback")).await.unwrap();
        let a = store.create_entry(entry_req(&sheet.id, "a", 0)).await.unwrap();

        let result = store
            .reorder_entries(
                &sheet.id,
                &[
                    EntryPosition { id: a.id.clone(), position: 5 },
                    EntryPosition { id: "ghost".to_string(), position: 0 },
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::EntryNotFound(_))));

        // First assignment must not have leaked through
        let entries = store.list_entries(&sheet.id).await.unwrap();
        assert_eq!(entries[0].position, 0);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let store = create_test_store().await;

        let sheet = store.create_cheatsheet(sheet_req("Delete")).await.unwrap();
        let entry = store.create_entry(entry_req(&sheet.id, "rm", 0)).await.unwrap();

        store.delete_entry(&entry.id).await.unwrap();

        let entries = store.list_entries(&sheet.id).await.unwrap();
        assert!(entries.is_empty());

        let result = store.delete_entry(&entry.id).await;
        assert!(matches!(result, Err(AppError::EntryNotFound(_))));
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let store = create_test_store().await;

        // Default config when nothing is stored
        let config = store.load_config().await.unwrap();
        assert!(config.remote_url.is_none());

        let config = AppConfig {
            remote_url: Some("https://example.supabase.co".to_string()),
            remote_anon_key: Some("anon".to_string()),
            ai_api_key: Some("ai".to_string()),
        };
        store.save_config(&config).await.unwrap();

        let loaded = store.load_config().await.unwrap();
        assert_eq!(loaded.remote_url, config.remote_url);
        assert_eq!(loaded.remote_anon_key, config.remote_anon_key);
        assert_eq!(loaded.ai_api_key, config.ai_api_key);

        // Upsert overwrites in place
        store.save_config(&AppConfig::default()).await.unwrap();
        let cleared = store.load_config().await.unwrap();
        assert!(cleared.remote_url.is_none());
    }
}
