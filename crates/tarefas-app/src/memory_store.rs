//! In-process table service used by tests and offline CLI sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tarefas_store_rest::{
    NewSubtaskRow, NewTaskRow, RemoteErrorKind, SubtaskRow, SubtaskRowPatch, TaskRow, TaskRowPatch,
};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::remote::RemoteStore;

#[derive(Debug)]
struct Tables {
    /// Insertion (creation) order.
    tasks: Vec<TaskRow>,
    subtasks: Vec<SubtaskRow>,
    clock: OffsetDateTime,
    fail_next: Option<StoreError>,
}

/// Table service kept in memory.
///
/// Behaves like the hosted service: server-assigned ids and timestamps,
/// newest-first task listing, cascading task deletes, and `NotFound` for
/// updates and deletes that match nothing.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                tasks: Vec::new(),
                subtasks: Vec::new(),
                clock: OffsetDateTime::now_utc(),
                fail_next: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.lock().fail_next = Some(error);
    }

    /// Make the next call fail with a service error of the given category.
    pub fn fail_next_with(&self, kind: RemoteErrorKind, code: &str, message: &str) {
        self.fail_next(StoreError::Remote {
            kind,
            code: Some(code.to_owned()),
            message: message.to_owned(),
        });
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stored subtask rows, across all tasks.
    #[must_use]
    pub fn subtask_rows(&self) -> usize {
        self.lock().subtasks.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and hand out the tables, unless a failure is armed.
    fn enter(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tables = self.lock();
        match tables.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(tables),
        }
    }
}

impl Tables {
    /// Strictly increasing timestamp so creation order is total.
    fn tick(&mut self) -> String {
        self.clock += Duration::milliseconds(1);
        self.clock
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.clock.unix_timestamp().to_string())
    }
}

fn missing_task(id: &str) -> StoreError {
    StoreError::task_not_found(id)
}

fn not_null(column: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Remote {
            kind: RemoteErrorKind::MissingRequiredField,
            code: Some("23502".into()),
            message: format!("null value in column \"{column}\" violates not-null constraint"),
        });
    }
    Ok(())
}

impl RemoteStore for MemoryStore {
    type Error = StoreError;

    async fn list_tasks(&self) -> Result<Vec<TaskRow>, Self::Error> {
        let tables = self.enter()?;
        Ok(tables.tasks.iter().rev().cloned().collect())
    }

    async fn list_subtasks(&self, task_id: &str) -> Result<Vec<SubtaskRow>, Self::Error> {
        let tables = self.enter()?;
        Ok(tables
            .subtasks
            .iter()
            .filter(|row| row.task_id.as_deref() == Some(task_id))
            .cloned()
            .collect())
    }

    async fn insert_task(&self, row: &NewTaskRow) -> Result<TaskRow, Self::Error> {
        let mut tables = self.enter()?;
        not_null("user_name", &row.user_name)?;
        not_null("solicitante", &row.solicitante)?;
        not_null("title", &row.title)?;
        not_null("due_date", &row.due_date)?;
        let now = tables.tick();
        let stored = TaskRow {
            id: Some(Uuid::now_v7().to_string()),
            user_name: Some(row.user_name.clone()),
            solicitante: Some(row.solicitante.clone()),
            title: Some(row.title.clone()),
            comentario: Some(row.comentario.clone()),
            porcentagem: Some(row.porcentagem),
            backlog: Some(row.backlog.clone()),
            priority: Some(row.priority.clone()),
            due_date: Some(row.due_date.clone()),
            completed: Some(row.completed),
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        debug!(id = stored.id.as_deref().unwrap_or_default(), "memory insert task");
        tables.tasks.push(stored.clone());
        Ok(stored)
    }

    async fn update_task(&self, id: &str, patch: &TaskRowPatch) -> Result<TaskRow, Self::Error> {
        let mut tables = self.enter()?;
        let now = tables.tick();
        let row = tables
            .tasks
            .iter_mut()
            .find(|row| row.id.as_deref() == Some(id))
            .ok_or_else(|| missing_task(id))?;

        let patch = patch.clone();
        if let Some(value) = patch.user_name {
            row.user_name = Some(value);
        }
        if let Some(value) = patch.solicitante {
            row.solicitante = Some(value);
        }
        if let Some(value) = patch.title {
            row.title = Some(value);
        }
        if let Some(value) = patch.comentario {
            row.comentario = Some(value);
        }
        if let Some(value) = patch.porcentagem {
            row.porcentagem = Some(value);
        }
        if let Some(value) = patch.backlog {
            row.backlog = Some(value);
        }
        if let Some(value) = patch.priority {
            row.priority = Some(value);
        }
        if let Some(value) = patch.due_date {
            row.due_date = Some(value);
        }
        if let Some(value) = patch.completed {
            row.completed = Some(value);
        }
        row.updated_at = Some(now);
        Ok(row.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), Self::Error> {
        let mut tables = self.enter()?;
        let before = tables.tasks.len();
        tables.tasks.retain(|row| row.id.as_deref() != Some(id));
        if tables.tasks.len() == before {
            return Err(missing_task(id));
        }
        tables.subtasks.retain(|row| row.task_id.as_deref() != Some(id));
        Ok(())
    }

    async fn insert_subtask(&self, row: &NewSubtaskRow) -> Result<SubtaskRow, Self::Error> {
        let mut tables = self.enter()?;
        not_null("title", &row.title)?;
        if !tables.tasks.iter().any(|task| task.id.as_deref() == Some(row.task_id.as_str())) {
            return Err(StoreError::Remote {
                kind: RemoteErrorKind::Other,
                code: Some("23503".into()),
                message: format!("task {} does not exist", row.task_id),
            });
        }
        let now = tables.tick();
        let stored = SubtaskRow {
            id: Some(Uuid::now_v7().to_string()),
            task_id: Some(row.task_id.clone()),
            title: Some(row.title.clone()),
            comentario: Some(row.comentario.clone()),
            completed: Some(row.completed),
            created_at: Some(now),
        };
        tables.subtasks.push(stored.clone());
        Ok(stored)
    }

    async fn update_subtask(&self, id: &str, patch: &SubtaskRowPatch) -> Result<SubtaskRow, Self::Error> {
        let mut tables = self.enter()?;
        let row = tables
            .subtasks
            .iter_mut()
            .find(|row| row.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::subtask_not_found(id))?;
        if let Some(value) = &patch.title {
            row.title = Some(value.clone());
        }
        if let Some(value) = &patch.comentario {
            row.comentario = Some(value.clone());
        }
        if let Some(value) = patch.completed {
            row.completed = Some(value);
        }
        Ok(row.clone())
    }

    async fn delete_subtask(&self, id: &str) -> Result<(), Self::Error> {
        let mut tables = self.enter()?;
        let before = tables.subtasks.len();
        tables.subtasks.retain(|row| row.id.as_deref() != Some(id));
        if tables.subtasks.len() == before {
            return Err(StoreError::subtask_not_found(id));
        }
        Ok(())
    }
}
