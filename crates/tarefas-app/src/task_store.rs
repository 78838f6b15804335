//! In-memory task list kept in step with the remote tables.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tarefas_core::{DashboardStats, Priority, Subtask, SubtaskId, Task, TaskFilter, TaskId};
use tarefas_store_rest::TaskRow;
use time::Date;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::mapping::{
    MappingError, new_subtask_row, new_task_row, row_to_subtask, row_to_task, subtask_completion_patch,
    task_patch_row,
};
use crate::remote::RemoteStore;
use crate::task_patch::TaskUpdate;
use crate::validation::{SubtaskInput, TaskInput};

#[derive(Debug, Default)]
struct StoreState {
    tasks: Vec<Task>,
    loading: bool,
    last_error: Option<StoreError>,
}

/// Owns the authoritative local task list.
///
/// Every mutation goes to the remote first and only touches local state once
/// the remote call succeeded. Mutations on the same task are serialized; reads
/// never wait on the network.
#[derive(Debug)]
pub struct TaskStore<R> {
    remote: R,
    state: RwLock<StoreState>,
    task_locks: Mutex<HashMap<TaskId, Arc<AsyncMutex<()>>>>,
}

impl<R> TaskStore<R> {
    /// Empty store over `remote`. Call [`TaskStore::load_all`] to populate it.
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            state: RwLock::new(StoreState::default()),
            task_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Backing remote.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of every task in list order.
    pub fn tasks(&self) -> Vec<Task> {
        self.read().tasks.clone()
    }

    /// Task with the given identity.
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.read().tasks.iter().find(|task| &task.id == id).cloned()
    }

    /// True while [`TaskStore::load_all`] is in flight.
    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// Most recent failure, if the last attempted operation failed.
    pub fn last_error(&self) -> Option<StoreError> {
        self.read().last_error.clone()
    }

    /// Dismiss the error slot.
    pub fn clear_error(&self) {
        self.write().last_error = None;
    }

    /// Tasks assigned to exactly `user`.
    pub fn by_user(&self, user: &str) -> Vec<Task> {
        self.select(|task| task.user_name == user)
    }

    /// Tasks with exactly `priority`.
    pub fn by_priority(&self, priority: Priority) -> Vec<Task> {
        self.select(|task| task.priority == priority)
    }

    /// Tasks whose completion flag equals `completed`.
    pub fn by_status(&self, completed: bool) -> Vec<Task> {
        self.select(|task| task.completed == completed)
    }

    /// Incomplete tasks due before `today`.
    pub fn overdue(&self, today: Date) -> Vec<Task> {
        self.select(|task| tarefas_core::is_overdue(task, today))
    }

    /// Incomplete tasks due on `today`.
    pub fn due_today(&self, today: Date) -> Vec<Task> {
        self.select(|task| tarefas_core::is_due_today(task, today))
    }

    /// Tasks matching every criterion of `filter`, in list order.
    pub fn filtered(&self, filter: &TaskFilter) -> Vec<Task> {
        self.select(|task| filter.matches(task))
    }

    /// Dashboard figures over the current list.
    pub fn dashboard(&self, today: Date) -> DashboardStats {
        DashboardStats::compute(&self.read().tasks, today)
    }

    fn select(&self, predicate: impl Fn(&Task) -> bool) -> Vec<Task> {
        self.read().tasks.iter().filter(|task| predicate(task)).cloned().collect()
    }

    fn task_lock(&self, id: &TaskId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.task_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    fn forget_lock(&self, id: &TaskId) {
        self.task_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Drop idle locks of tasks that are no longer listed.
    fn prune_locks(&self, tasks: &[Task]) {
        let live: HashSet<&TaskId> = tasks.iter().map(|task| &task.id).collect();
        self.task_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, lock| live.contains(id) || Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.task_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Clear the error slot before an attempt.
    fn begin(&self) {
        self.write().last_error = None;
    }

    /// Record a failure in the error slot and hand the result back.
    fn settle<T>(&self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(err) = &result {
            warn!(error = %err, "task store operation failed");
            self.write().last_error = Some(err.clone());
        }
        result
    }

    fn with_task_mut(&self, id: &TaskId, apply: impl FnOnce(&mut Task)) {
        let mut state = self.write();
        if let Some(task) = state.tasks.iter_mut().find(|task| &task.id == id) {
            apply(task);
        }
    }
}

impl<R: RemoteStore> TaskStore<R> {
    /// Fetch every task with its subtasks and replace the local list.
    ///
    /// Overlapping calls are not coalesced; whichever finishes last wins.
    ///
    /// # Errors
    /// Returns the first remote or mapping failure; the local list is kept.
    pub async fn load_all(&self) -> Result<Vec<Task>, StoreError> {
        {
            let mut state = self.write();
            state.loading = true;
            state.last_error = None;
        }

        let result = self.fetch_all().await;

        let mut state = self.write();
        state.loading = false;
        match &result {
            Ok(tasks) => {
                info!(count = tasks.len(), "loaded tasks");
                state.tasks.clone_from(tasks);
                self.prune_locks(tasks);
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                state.last_error = Some(err.clone());
            }
        }
        drop(state);
        result
    }

    async fn fetch_all(&self) -> Result<Vec<Task>, StoreError> {
        let rows = self.remote.list_tasks().await.map_err(Into::<StoreError>::into)?;
        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            tasks.push(self.hydrate(row).await?);
        }
        Ok(tasks)
    }

    /// Attach the task's subtasks, fetched in creation order.
    async fn hydrate(&self, row: TaskRow) -> Result<Task, StoreError> {
        let id = row.id.clone().ok_or(MappingError::MissingField {
            table: "tasks",
            field: "id",
        })?;
        let subtasks = self.remote.list_subtasks(&id).await.map_err(Into::<StoreError>::into)?;
        Ok(row_to_task(row, subtasks)?)
    }

    /// Insert a validated task and append it to the local list.
    ///
    /// # Errors
    /// Returns the remote failure; nothing is added locally.
    pub async fn create(&self, input: TaskInput) -> Result<Task, StoreError> {
        self.begin();
        let result = self.try_create(&input).await;
        if let Ok(task) = &result {
            debug!(task = %task.id, "created task");
            self.write().tasks.push(task.clone());
        }
        self.settle(result)
    }

    async fn try_create(&self, input: &TaskInput) -> Result<Task, StoreError> {
        let row = self.remote.insert_task(&new_task_row(input)).await.map_err(Into::<StoreError>::into)?;
        Ok(row_to_task(row, Vec::new())?)
    }

    /// Send the set fields of `update` and replace the local copy with the
    /// server's echoed row. Subtasks are carried over from the local copy.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when no remote row has `id`, or any
    /// other remote failure.
    pub async fn update(&self, id: &TaskId, update: TaskUpdate) -> Result<Task, StoreError> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().await;
        self.begin();
        let result = self.update_locked(id, &update).await;
        self.settle(result)
    }

    async fn update_locked(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, StoreError> {
        let row = self
            .remote
            .update_task(id.as_str(), &task_patch_row(update))
            .await
            .map_err(Into::<StoreError>::into)?;
        let subtasks = self.task(id).map(|task| task.subtasks).unwrap_or_default();
        let mut task = row_to_task(row, Vec::new())?;
        task.subtasks = subtasks;
        debug!(task = %task.id, "updated task");
        self.with_task_mut(id, |current| *current = task.clone());
        Ok(task)
    }

    /// Flip the completion flag of a locally known task.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] when `id` is not in the local list, or
    /// the remote failure.
    pub async fn toggle_complete(&self, id: &TaskId) -> Result<Task, StoreError> {
        let lock = self.task_lock(id);
        let _guard = lock.lock().await;
        self.begin();
        let result = match self.task(id) {
            Some(task) => self.update_locked(id, &TaskUpdate::completed(!task.completed)).await,
            None => Err(StoreError::task_not_found(id.as_str())),
        };
        self.settle(result)
    }

    /// Delete a task. Its subtasks leave the local list with it.
    ///
    /// # Errors
    /// Returns the remote failure; the local list is left unchanged.
    pub async fn remove(&self, id: &TaskId) -> Result<(), StoreError> {
        let lock = self.task_lock(id);
        let guard = lock.lock().await;
        self.begin();
        let result = self.remote.delete_task(id.as_str()).await.map_err(Into::<StoreError>::into);
        if result.is_ok() {
            debug!(task = %id, "removed task");
            self.write().tasks.retain(|task| &task.id != id);
        }
        drop(guard);
        if result.is_ok() {
            self.forget_lock(id);
        }
        self.settle(result)
    }

    /// Insert a subtask under `task_id` and append it to that task.
    ///
    /// # Errors
    /// Returns the remote failure; nothing is added locally.
    pub async fn add_subtask(&self, task_id: &TaskId, input: SubtaskInput) -> Result<Subtask, StoreError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;
        self.begin();
        let result = self.try_add_subtask(task_id, &input).await;
        if let Ok(subtask) = &result {
            self.with_task_mut(task_id, |task| task.subtasks.push(subtask.clone()));
        }
        self.settle(result)
    }

    async fn try_add_subtask(&self, task_id: &TaskId, input: &SubtaskInput) -> Result<Subtask, StoreError> {
        let row = self
            .remote
            .insert_subtask(&new_subtask_row(task_id, input))
            .await
            .map_err(Into::<StoreError>::into)?;
        Ok(row_to_subtask(row)?)
    }

    /// Flip a subtask's completion flag. Unknown pairs are ignored.
    ///
    /// # Errors
    /// Returns the remote failure; the local flag is left unchanged.
    pub async fn toggle_subtask_complete(&self, task_id: &TaskId, subtask_id: &SubtaskId) -> Result<(), StoreError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;
        let current = self
            .task(task_id)
            .and_then(|task| task.subtask(subtask_id).map(|subtask| subtask.completed));
        let Some(completed) = current else {
            debug!(task = %task_id, subtask = %subtask_id, "subtask not tracked; toggle ignored");
            return Ok(());
        };

        self.begin();
        let result = self.try_set_subtask(subtask_id, !completed).await;
        if let Ok(updated) = &result {
            self.with_task_mut(task_id, |task| {
                if let Some(subtask) = task.subtasks.iter_mut().find(|st| &st.id == subtask_id) {
                    subtask.completed = updated.completed;
                }
            });
        }
        self.settle(result.map(|_| ()))
    }

    async fn try_set_subtask(&self, subtask_id: &SubtaskId, completed: bool) -> Result<Subtask, StoreError> {
        let row = self
            .remote
            .update_subtask(subtask_id.as_str(), &subtask_completion_patch(completed))
            .await
            .map_err(Into::<StoreError>::into)?;
        Ok(row_to_subtask(row)?)
    }

    /// Delete a subtask and drop it from its task.
    ///
    /// # Errors
    /// Returns the remote failure; the local list is left unchanged.
    pub async fn remove_subtask(&self, task_id: &TaskId, subtask_id: &SubtaskId) -> Result<(), StoreError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;
        self.begin();
        let result = self
            .remote
            .delete_subtask(subtask_id.as_str())
            .await
            .map_err(Into::<StoreError>::into);
        if result.is_ok() {
            self.with_task_mut(task_id, |task| task.subtasks.retain(|st| &st.id != subtask_id));
        }
        self.settle(result)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::memory_store::MemoryStore;
    use tarefas_core::{Backlog, Percentage};
    use tarefas_store_rest::{
        NewSubtaskRow, NewTaskRow, RemoteErrorKind, SubtaskRow, SubtaskRowPatch, TaskRowPatch,
    };
    use time::macros::date;

    /// Memory tables whose subtask listing can be switched off.
    #[derive(Debug, Default)]
    struct SubtaskOutage {
        inner: MemoryStore,
        down: AtomicBool,
    }

    impl RemoteStore for SubtaskOutage {
        type Error = StoreError;

        async fn list_tasks(&self) -> Result<Vec<TaskRow>, StoreError> {
            self.inner.list_tasks().await
        }

        async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubtaskRow>, StoreError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StoreError::Remote {
                    kind: RemoteErrorKind::Other,
                    code: None,
                    message: "subtasks unavailable".into(),
                });
            }
            self.inner.list_subtasks(task_id).await
        }

        async fn insert_task(&self, row: &NewTaskRow) -> Result<TaskRow, StoreError> {
            self.inner.insert_task(row).await
        }

        async fn update_task(&self, id: &str, patch: &TaskRowPatch) -> Result<TaskRow, StoreError> {
            self.inner.update_task(id, patch).await
        }

        async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_task(id).await
        }

        async fn insert_subtask(&self, row: &NewSubtaskRow) -> Result<SubtaskRow, StoreError> {
            self.inner.insert_subtask(row).await
        }

        async fn update_subtask(&self, id: &str, patch: &SubtaskRowPatch) -> Result<SubtaskRow, StoreError> {
            self.inner.update_subtask(id, patch).await
        }

        async fn delete_subtask(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_subtask(id).await
        }
    }

    fn input(title: &str) -> TaskInput {
        TaskInput {
            user_name: "ana".into(),
            solicitante: "bruno".into(),
            title: title.into(),
            comentario: String::new(),
            porcentagem: Percentage::default(),
            backlog: Backlog::AFazer,
            priority: Priority::Media,
            due_date: date!(2030 - 01 - 01),
        }
    }

    fn subtask(title: &str) -> SubtaskInput {
        SubtaskInput {
            title: title.into(),
            comentario: String::new(),
        }
    }

    #[tokio::test]
    async fn create_appends_to_local_list() {
        let store = TaskStore::new(MemoryStore::new());
        store.create(input("a")).await.unwrap();
        store.create(input("b")).await.unwrap();
        let titles: Vec<_> = store.tasks().into_iter().map(|task| task.title).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn load_all_uses_remote_order() {
        let store = TaskStore::new(MemoryStore::new());
        store.create(input("a")).await.unwrap();
        store.create(input("b")).await.unwrap();
        let loaded = store.load_all().await.unwrap();
        let titles: Vec<_> = loaded.iter().map(|task| task.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn failed_create_sets_error_and_keeps_list() {
        let store = TaskStore::new(MemoryStore::new());
        store
            .remote()
            .fail_next_with(RemoteErrorKind::PermissionDenied, "42501", "permission denied");

        let err = store.create(input("a")).await.expect_err("remote rejects");
        assert_eq!(err.kind(), RemoteErrorKind::PermissionDenied);
        assert_eq!(store.last_error(), Some(err));
        assert!(store.tasks().is_empty());

        store.create(input("b")).await.unwrap();
        assert!(store.last_error().is_none(), "next attempt clears the slot");
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_list() {
        let store = TaskStore::new(MemoryStore::new());
        store.create(input("a")).await.unwrap();
        store
            .remote()
            .fail_next_with(RemoteErrorKind::MissingTable, "42P01", "relation does not exist");

        assert!(store.load_all().await.is_err());
        assert_eq!(store.tasks().len(), 1);
        assert!(!store.is_loading());
        assert_eq!(store.last_error().map(|err| err.kind()), Some(RemoteErrorKind::MissingTable));
    }

    #[tokio::test]
    async fn toggle_of_unknown_task_is_not_found() {
        let store = TaskStore::new(MemoryStore::new());
        let err = store
            .toggle_complete(&TaskId::from("ghost"))
            .await
            .expect_err("not tracked");
        assert_eq!(err, StoreError::task_not_found("ghost"));
        assert_eq!(store.remote().calls(), 0);
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn update_unknown_remote_row_is_not_found() {
        let store = TaskStore::new(MemoryStore::new());
        let err = store
            .update(&TaskId::from("ghost"), TaskUpdate::completed(true))
            .await
            .expect_err("no such row");
        assert!(matches!(err, StoreError::NotFound { entity: "task", .. }));
    }

    #[tokio::test]
    async fn subtask_toggle_and_removal_reconcile_locally() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        let first = store.add_subtask(&task.id, subtask("A")).await.unwrap();
        let second = store.add_subtask(&task.id, subtask("B")).await.unwrap();

        store.toggle_subtask_complete(&task.id, &first.id).await.unwrap();
        let local = store.task(&task.id).unwrap();
        assert_eq!(local.subtask_progress(), (1, 2));

        store.remove_subtask(&task.id, &second.id).await.unwrap();
        let local = store.task(&task.id).unwrap();
        assert_eq!(local.subtasks.len(), 1);
        assert_eq!(local.subtasks[0].id, first.id);
    }

    #[tokio::test]
    async fn toggle_of_unknown_subtask_is_a_no_op() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        let calls = store.remote().calls();
        store
            .toggle_subtask_complete(&task.id, &SubtaskId::from("ghost"))
            .await
            .unwrap();
        assert_eq!(store.remote().calls(), calls);
    }

    #[tokio::test]
    async fn concurrent_toggles_flip_twice() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();

        let (first, second) = tokio::join!(store.toggle_complete(&task.id), store.toggle_complete(&task.id));
        let first = first.unwrap();
        let second = second.unwrap();
        assert_ne!(first.completed, second.completed);
        assert!(!store.task(&task.id).unwrap().completed);
    }

    #[tokio::test]
    async fn toggle_applies_echo_without_refetching_subtasks() {
        let store = TaskStore::new(SubtaskOutage::default());
        let task = store.create(input("a")).await.unwrap();
        store.add_subtask(&task.id, subtask("A")).await.unwrap();
        store.remote().down.store(true, Ordering::SeqCst);

        let toggled = store.toggle_complete(&task.id).await.unwrap();
        assert!(toggled.completed);
        assert_eq!(toggled.subtasks.len(), 1);
        let local = store.task(&task.id).unwrap();
        assert!(local.completed);
        assert_eq!(local.subtasks.len(), 1);
        assert!(store.last_error().is_none());

        let remote = store.remote().inner.list_tasks().await.unwrap();
        assert_eq!(remote[0].completed, Some(true));
    }

    #[tokio::test]
    async fn failed_remove_keeps_task() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        store
            .remote()
            .fail_next_with(RemoteErrorKind::PermissionDenied, "42501", "permission denied");

        let err = store.remove(&task.id).await.expect_err("remote rejects");
        assert_eq!(store.last_error(), Some(err));
        assert_eq!(store.tasks(), vec![task]);
    }

    #[tokio::test]
    async fn failed_add_subtask_keeps_subtasks() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        store
            .remote()
            .fail_next_with(RemoteErrorKind::MissingTable, "42P01", "relation \"subtasks\" does not exist");

        let err = store.add_subtask(&task.id, subtask("A")).await.expect_err("remote rejects");
        assert_eq!(err.kind(), RemoteErrorKind::MissingTable);
        assert_eq!(store.last_error(), Some(err));
        assert!(store.task(&task.id).unwrap().subtasks.is_empty());
        assert_eq!(store.remote().subtask_rows(), 0);
    }

    #[tokio::test]
    async fn failed_subtask_toggle_keeps_flag() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        let sub = store.add_subtask(&task.id, subtask("A")).await.unwrap();
        store
            .remote()
            .fail_next_with(RemoteErrorKind::PermissionDenied, "42501", "permission denied");

        let err = store
            .toggle_subtask_complete(&task.id, &sub.id)
            .await
            .expect_err("remote rejects");
        assert_eq!(store.last_error(), Some(err));
        assert!(!store.task(&task.id).unwrap().subtasks[0].completed);
    }

    #[tokio::test]
    async fn failed_subtask_removal_keeps_subtask() {
        let store = TaskStore::new(MemoryStore::new());
        let task = store.create(input("a")).await.unwrap();
        let sub = store.add_subtask(&task.id, subtask("A")).await.unwrap();
        store
            .remote()
            .fail_next_with(RemoteErrorKind::PermissionDenied, "42501", "permission denied");

        let err = store.remove_subtask(&task.id, &sub.id).await.expect_err("remote rejects");
        assert_eq!(store.last_error(), Some(err));
        assert_eq!(store.task(&task.id).unwrap().subtasks, vec![sub]);
        assert_eq!(store.remote().subtask_rows(), 1);
    }

    #[tokio::test]
    async fn load_all_forgets_locks_of_vanished_tasks() {
        let store = TaskStore::new(MemoryStore::new());
        let gone = store.create(input("a")).await.unwrap();
        let kept = store.create(input("b")).await.unwrap();
        store.toggle_complete(&gone.id).await.unwrap();
        store.toggle_complete(&kept.id).await.unwrap();
        assert_eq!(store.tracked_locks(), 2);

        store.remote().delete_task(gone.id.as_str()).await.unwrap();
        store.load_all().await.unwrap();
        assert_eq!(store.tracked_locks(), 1);
    }
}
