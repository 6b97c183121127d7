//! Run-scoped state for one synchronization.

use crate::classify::Category;
use crate::columns;
use crate::directory::SubsheetDirectory;
use crate::error::GradeSyncResult;
use crate::executor::{RetryPolicy, RetryingExecutor};
use crate::request::{BatchRequestList, assemble_request};
use crate::sheets::{SheetId, SheetsTransport};

/// Owns everything a run mutates: the executor's retry counter, the subsheet
/// directory and the pending batch.
///
/// Concurrent runs against one spreadsheet must be serialized by the caller;
/// a session only isolates state, it doesn't lock anything remotely.
pub struct SyncSession<T> {
    executor: RetryingExecutor<T>,
    directory: SubsheetDirectory,
    batch: BatchRequestList,
}

impl<T: SheetsTransport> SyncSession<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        SyncSession {
            executor: RetryingExecutor::new(transport, policy),
            directory: SubsheetDirectory::new(),
            batch: BatchRequestList::new(),
        }
    }

    /// Forget the directory, drop pending requests and zero the retry counter.
    pub fn reset(&mut self) {
        self.executor.reset_retry_count();
        self.directory.reset();
        self.batch.reset();
    }

    pub fn executor(&self) -> &RetryingExecutor<T> {
        &self.executor
    }

    pub fn directory(&self) -> &SubsheetDirectory {
        &self.directory
    }

    pub fn batch(&self) -> &BatchRequestList {
        &self.batch
    }

    pub async fn load_directory(&mut self) -> GradeSyncResult<()> {
        self.directory.load(&self.executor).await
    }

    pub async fn get_or_create_sheet_id(&mut self, title: &str) -> GradeSyncResult<SheetId> {
        self.directory.get_or_create(&self.executor, title).await
    }

    pub async fn read_existing_columns(&mut self, category: Category) -> GradeSyncResult<Vec<String>> {
        columns::read_existing_columns(&self.executor, &mut self.directory, category).await
    }

    /// Queue a `pasteData` request. No network effect.
    pub fn assemble_request(
        &mut self,
        payload_csv: &str,
        sheet_id: SheetId,
        row_index: u32,
        column_index: u32,
    ) {
        self.batch
            .push(assemble_request(payload_csv, sheet_id, row_index, column_index));
    }

    /// Submit the pending batch; see [`BatchRequestList::submit`].
    pub async fn submit(&mut self) -> GradeSyncResult<usize> {
        self.batch.submit(&self.executor).await
    }
}
