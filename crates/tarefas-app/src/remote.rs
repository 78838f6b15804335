use tarefas_store_rest::{
    NewSubtaskRow, NewTaskRow, RestStore, RestStoreError, SubtaskRow, SubtaskRowPatch, TaskRow,
    TaskRowPatch,
};

use crate::error::StoreError;

/// Row-level access to the `tasks` and `subtasks` tables.
///
/// Implemented by the HTTP client and by [`crate::memory_store::MemoryStore`].
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Error type returned by operations.
    type Error: Into<StoreError> + Send;

    /// All tasks, newest first.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn list_tasks(&self) -> Result<Vec<TaskRow>, Self::Error>;

    /// Subtasks of `task_id`, oldest first.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubtaskRow>, Self::Error>;

    /// Insert a task and return the stored row.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn insert_task(&self, row: &NewTaskRow) -> Result<TaskRow, Self::Error>;

    /// Apply a partial update and return the stored row.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn update_task(&self, id: &str, patch: &TaskRowPatch) -> Result<TaskRow, Self::Error>;

    /// Delete a task; subtasks go with it.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn delete_task(&self, id: &str) -> Result<(), Self::Error>;

    /// Insert a subtask and return the stored row.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn insert_subtask(&self, row: &NewSubtaskRow) -> Result<SubtaskRow, Self::Error>;

    /// Apply a partial update to a subtask and return the stored row.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn update_subtask(&self, id: &str, patch: &SubtaskRowPatch) -> Result<SubtaskRow, Self::Error>;

    /// Delete a subtask.
    ///
    /// # Errors
    /// Returns a store-specific error when the request fails.
    async fn delete_subtask(&self, id: &str) -> Result<(), Self::Error>;
}

impl RemoteStore for RestStore {
    type Error = RestStoreError;

    async fn list_tasks(&self) -> Result<Vec<TaskRow>, Self::Error> {
        Self::list_tasks(self).await
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubtaskRow>, Self::Error> {
        Self::list_subtasks(self, task_id).await
    }

    async fn insert_task(&self, row: &NewTaskRow) -> Result<TaskRow, Self::Error> {
        Self::insert_task(self, row).await
    }

    async fn update_task(&self, id: &str, patch: &TaskRowPatch) -> Result<TaskRow, Self::Error> {
        Self::update_task(self, id, patch).await
    }

    async fn delete_task(&self, id: &str) -> Result<(), Self::Error> {
        Self::delete_task(self, id).await
    }

    async fn insert_subtask(&self, row: &NewSubtaskRow) -> Result<SubtaskRow, Self::Error> {
        Self::insert_subtask(self, row).await
    }

    async fn update_subtask(&self, id: &str, patch: &SubtaskRowPatch) -> Result<SubtaskRow, Self::Error> {
        Self::update_subtask(self, id, patch).await
    }

    async fn delete_subtask(&self, id: &str) -> Result<(), Self::Error> {
        Self::delete_subtask(self, id).await
    }
}
