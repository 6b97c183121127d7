//! Memoized subsheet title → sheet id lookup.

use std::collections::HashMap;

use crate::error::{GradeSyncError, GradeSyncResult};
use crate::executor::RetryingExecutor;
use crate::sheets::{BatchUpdate, ListSheets, SheetId, SheetsTransport};

/// Subsheet ids for the target spreadsheet.
///
/// Loaded with one metadata call on first use and treated as authoritative
/// for the rest of the run: sheets added remotely by someone else after the
/// load are not seen until [`reset`](Self::reset).
#[derive(Debug, Default)]
pub struct SubsheetDirectory {
    ids: HashMap<String, SheetId>,
    loaded: bool,
    created: Vec<String>,
}

impl SubsheetDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, title: &str) -> Option<SheetId> {
        self.ids.get(title).copied()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.ids.contains_key(title)
    }

    /// Titles of subsheets created through this directory since the last reset.
    pub fn created(&self) -> &[String] {
        &self.created
    }

    /// Drop a title the API reported as missing, so the next
    /// [`get_or_create`](Self::get_or_create) creates it.
    pub fn forget(&mut self, title: &str) -> Option<SheetId> {
        self.ids.remove(title)
    }

    pub fn reset(&mut self) {
        self.ids.clear();
        self.created.clear();
        self.loaded = false;
    }

    /// Fetch the title → id mapping unless it is already loaded.
    pub async fn load<T: SheetsTransport>(
        &mut self,
        executor: &RetryingExecutor<T>,
    ) -> GradeSyncResult<()> {
        if self.loaded {
            return Ok(());
        }

        log::info!("Retrieving subsheet titles to ids");
        let metadata = executor.execute(&ListSheets).await?;
        self.ids = metadata
            .sheets
            .into_iter()
            .map(|sheet| (sheet.properties.title, sheet.properties.sheet_id))
            .collect();
        self.loaded = true;
        log::debug!("Found {} subsheets", self.ids.len());

        Ok(())
    }

    /// Id of the subsheet titled `title`, creating the subsheet first if it
    /// doesn't exist. Creation is a synchronous call, not part of the batch.
    pub async fn get_or_create<T: SheetsTransport>(
        &mut self,
        executor: &RetryingExecutor<T>,
        title: &str,
    ) -> GradeSyncResult<SheetId> {
        self.load(executor).await?;

        if let Some(id) = self.get(title) {
            return Ok(id);
        }

        let call = BatchUpdate::add_sheet(title);
        let response = executor.execute(&call).await?;
        let properties = response
            .replies
            .into_iter()
            .find_map(|reply| reply.add_sheet)
            .map(|reply| reply.properties)
            .ok_or_else(|| GradeSyncError::UnexpectedResponse {
                call: format!("create subsheet '{title}'"),
                message: "no addSheet reply".to_string(),
            })?;

        log::info!("Created subsheet '{}' (id {})", title, properties.sheet_id);
        self.ids.insert(title.to_string(), properties.sheet_id);
        self.created.push(title.to_string());

        Ok(properties.sheet_id)
    }
}
