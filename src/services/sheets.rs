//! Cheatsheet service
//!
//! Business logic over the storage facade: field validation before any
//! store call, append positioning, and the drag-and-drop move protocol.

use crate::config::{MAX_CATEGORY_LENGTH, MAX_SYNTAX_LENGTH, MAX_TITLE_LENGTH};
use crate::database::models::*;
use crate::error::{AppError, Result};
use crate::ordering;
use crate::storage::{SheetStore, StorageFacade};

/// Fields for a new entry; the service computes its position
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub syntax: String,
    pub category: String,
    pub description: Option<String>,
    pub example: Option<String>,
    pub notes: Option<String>,
    pub language: Option<String>,
    pub display_format: Option<DisplayFormat>,
}

/// Service for managing cheatsheets and their entries
#[derive(Clone)]
pub struct SheetService {
    storage: StorageFacade,
}

fn require_non_empty(field: &str, value: &str, max_len: usize) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > max_len {
        return Err(AppError::Validation(format!(
            "{} exceeds {} characters",
            field, max_len
        )));
    }
    Ok(())
}

impl SheetService {
    pub fn new(storage: StorageFacade) -> Self {
        Self { storage }
    }

    /// Create a cheatsheet
    pub async fn create_cheatsheet(
        &self,
        title: String,
        description: Option<String>,
    ) -> Result<Cheatsheet> {
        require_non_empty("title", &title, MAX_TITLE_LENGTH)?;

        tracing::info!("Creating cheatsheet: {}", title);

        self.storage
            .create_cheatsheet(CreateCheatsheetRequest { title, description })
            .await
    }

    /// Partially update a cheatsheet
    pub async fn update_cheatsheet(&self, req: UpdateCheatsheetRequest) -> Result<Cheatsheet> {
        if let Some(title) = &req.title {
            require_non_empty("title", title, MAX_TITLE_LENGTH)?;
        }

        self.storage.update_cheatsheet(req).await
    }

    /// List cheatsheets in the given view
    pub async fn list_cheatsheets(&self, view: View) -> Result<Vec<Cheatsheet>> {
        self.storage.list_cheatsheets(view).await
    }

    /// Get a cheatsheet by id
    pub async fn get_cheatsheet(&self, id: &str) -> Result<Cheatsheet> {
        self.storage.get_cheatsheet(id).await
    }

    /// Move a cheatsheet to the trash
    pub async fn soft_delete_cheatsheet(&self, id: &str) -> Result<()> {
        tracing::info!("Trashing cheatsheet: {}", id);
        self.storage.soft_delete_cheatsheet(id).await
    }

    /// Restore a cheatsheet from the trash
    pub async fn restore_cheatsheet(&self, id: &str) -> Result<()> {
        tracing::info!("Restoring cheatsheet: {}", id);
        self.storage.restore_cheatsheet(id).await
    }

    /// Permanently delete a cheatsheet and all of its entries
    pub async fn purge_cheatsheet(&self, id: &str) -> Result<()> {
        tracing::info!("Purging cheatsheet: {}", id);
        self.storage.purge_cheatsheet(id).await
    }

    /// List entries of a cheatsheet, ascending by position
    pub async fn list_entries(&self, cheatsheet_id: &str) -> Result<Vec<SyntaxEntry>> {
        self.storage.list_entries(cheatsheet_id).await
    }

    /// Append a new entry to a cheatsheet.
    ///
    /// The entry takes position max + 1 (0 on an empty cheatsheet) so it
    /// sorts last without shifting anything else.
    pub async fn add_entry(&self, cheatsheet_id: &str, entry: NewEntry) -> Result<SyntaxEntry> {
        require_non_empty("syntax", &entry.syntax, MAX_SYNTAX_LENGTH)?;
        require_non_empty("category", &entry.category, MAX_CATEGORY_LENGTH)?;

        let existing = self.storage.list_entries(cheatsheet_id).await?;
        let position = ordering::next_position(&existing);

        self.storage
            .create_entry(CreateEntryRequest {
                cheatsheet_id: cheatsheet_id.to_string(),
                syntax: entry.syntax,
                category: entry.category,
                description: entry.description,
                example: entry.example,
                notes: entry.notes,
                language: entry.language,
                display_format: entry.display_format,
                position,
            })
            .await
    }

    /// Partially update an entry
    pub async fn update_entry(&self, req: UpdateEntryRequest) -> Result<SyntaxEntry> {
        if let Some(syntax) = &req.syntax {
            require_non_empty("syntax", syntax, MAX_SYNTAX_LENGTH)?;
        }
        if let Some(category) = &req.category {
            require_non_empty("category", category, MAX_CATEGORY_LENGTH)?;
        }

        self.storage.update_entry(req).await
    }

    /// Delete an entry
    pub async fn delete_entry(&self, id: &str) -> Result<()> {
        self.storage.delete_entry(id).await
    }

    /// Move an entry from index `from` to index `to` in the displayed
    /// order, renumbering the whole cheatsheet densely 0..n-1 and
    /// submitting the assignments as one batch.
    pub async fn move_entry(&self, cheatsheet_id: &str, from: usize, to: usize) -> Result<()> {
        let entries = self.storage.list_entries(cheatsheet_id).await?;
        let plan = ordering::plan_move(&entries, from, to)?;

        self.storage.reorder_entries(cheatsheet_id, &plan).await
    }
}
