//! Storage interface and backend dispatch
//!
//! One logical data-access surface for the rest of the application.
//! Two backends implement [`SheetStore`]: the local SQLite store and the
//! cloud adapter. The facade picks one per call — cloud whenever the
//! active mode is cloud *and* a signed-in user is present, local
//! otherwise. A single logical operation never spans both stores.

use crate::database::models::*;
use crate::database::LocalStore;
use crate::error::Result;
use crate::services::mode::ModeManager;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage backend trait
///
/// Implementations handle persistence of cheatsheets, entries, and their
/// ordering. Object-safe so the facade can hand out `Arc<dyn SheetStore>`.
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// List cheatsheets in the given view, newest created first
    async fn list_cheatsheets(&self, view: View) -> Result<Vec<Cheatsheet>>;

    /// Get a cheatsheet by id
    async fn get_cheatsheet(&self, id: &str) -> Result<Cheatsheet>;

    /// Create a cheatsheet
    async fn create_cheatsheet(&self, req: CreateCheatsheetRequest) -> Result<Cheatsheet>;

    /// Partially update a cheatsheet
    async fn update_cheatsheet(&self, req: UpdateCheatsheetRequest) -> Result<Cheatsheet>;

    /// Move a cheatsheet to the trash (sets `deleted_at`)
    async fn soft_delete_cheatsheet(&self, id: &str) -> Result<()>;

    /// Restore a trashed cheatsheet (clears `deleted_at`)
    async fn restore_cheatsheet(&self, id: &str) -> Result<()>;

    /// Permanently delete a cheatsheet and all of its entries.
    ///
    /// Entries are always deleted before the cheatsheet row so an
    /// interruption can never leave orphaned entries behind.
    async fn purge_cheatsheet(&self, id: &str) -> Result<()>;

    /// List entries of a cheatsheet, ascending by position
    async fn list_entries(&self, cheatsheet_id: &str) -> Result<Vec<SyntaxEntry>>;

    /// Create an entry at the caller-computed position
    async fn create_entry(&self, req: CreateEntryRequest) -> Result<SyntaxEntry>;

    /// Partially update an entry
    async fn update_entry(&self, req: UpdateEntryRequest) -> Result<SyntaxEntry>;

    /// Delete an entry
    async fn delete_entry(&self, id: &str) -> Result<()>;

    /// Apply position assignments to exactly the listed entries
    async fn reorder_entries(
        &self,
        cheatsheet_id: &str,
        positions: &[EntryPosition],
    ) -> Result<()>;
}

/// Dispatching facade over the two store backends
#[derive(Clone)]
pub struct StorageFacade {
    local: Arc<LocalStore>,
    mode: Arc<ModeManager>,
}

impl StorageFacade {
    pub fn new(local: Arc<LocalStore>, mode: Arc<ModeManager>) -> Self {
        Self { local, mode }
    }

    /// Resolve the backend for one logical operation.
    ///
    /// The choice is made once per call; identity changes picked up
    /// through the auth subscription take effect on the next call.
    pub fn store(&self) -> Arc<dyn SheetStore> {
        match self.mode.active_remote() {
            Some(remote) => remote,
            None => self.local.clone(),
        }
    }

    pub fn local(&self) -> Arc<LocalStore> {
        self.local.clone()
    }

    pub fn mode_manager(&self) -> Arc<ModeManager> {
        self.mode.clone()
    }
}

#[async_trait]
impl SheetStore for StorageFacade {
    async fn list_cheatsheets(&self, view: View) -> Result<Vec<Cheatsheet>> {
        self.store().list_cheatsheets(view).await
    }

    async fn get_cheatsheet(&self, id: &str) -> Result<Cheatsheet> {
        self.store().get_cheatsheet(id).await
    }

    async fn create_cheatsheet(&self, req: CreateCheatsheetRequest) -> Result<Cheatsheet> {
        self.store().create_cheatsheet(req).await
    }

    async fn update_cheatsheet(&self, req: UpdateCheatsheetRequest) -> Result<Cheatsheet> {
        self.store().update_cheatsheet(req).await
    }

    async fn soft_delete_cheatsheet(&self, id: &str) -> Result<()> {
        self.store().soft_delete_cheatsheet(id).await
    }

    async fn restore_cheatsheet(&self, id: &str) -> Result<()> {
        self.store().restore_cheatsheet(id).await
    }

    async fn purge_cheatsheet(&self, id: &str) -> Result<()> {
        self.store().purge_cheatsheet(id).await
    }

    async fn list_entries(&self, cheatsheet_id: &str) -> Result<Vec<SyntaxEntry>> {
        self.store().list_entries(cheatsheet_id).await
    }

    async fn create_entry(&self, req: CreateEntryRequest) -> Result<SyntaxEntry> {
        self.store().create_entry(req).await
    }

    async fn update_entry(&self, req: UpdateEntryRequest) -> Result<SyntaxEntry> {
        self.store().update_entry(req).await
    }

    async fn delete_entry(&self, id: &str) -> Result<()> {
        self.store().delete_entry(id).await
    }

    async fn reorder_entries(
        &self,
        cheatsheet_id: &str,
        positions: &[EntryPosition],
    ) -> Result<()> {
        self.store().reorder_entries(cheatsheet_id, positions).await
    }
}
