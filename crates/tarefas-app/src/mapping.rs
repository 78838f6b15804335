//! Conversion between table rows and domain values.

use tarefas_core::due::{format_day, parse_day};
use tarefas_core::{Backlog, Percentage, Priority, Subtask, SubtaskId, Task, TaskId};
use tarefas_store_rest::{NewSubtaskRow, NewTaskRow, SubtaskRow, SubtaskRowPatch, TaskRow, TaskRowPatch};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use crate::task_patch::TaskUpdate;
use crate::validation::{SubtaskInput, TaskInput};

const TASKS: &str = "tasks";
const SUBTASKS: &str = "subtasks";

/// A row could not be turned into a domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A required column was absent or null.
    #[error("missing required field `{field}` in {table} row")]
    MissingField {
        /// Table the row came from.
        table: &'static str,
        /// Column name.
        field: &'static str,
    },
    /// A date column did not hold a `YYYY-MM-DD` day.
    #[error("invalid date `{value}` in field `{field}`")]
    InvalidDate {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// A timestamp column was not RFC 3339.
    #[error("invalid timestamp `{value}` in field `{field}`")]
    InvalidTimestamp {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// An enumerated column held a value outside its closed set.
    #[error("invalid value `{value}` in field `{field}`")]
    InvalidEnum {
        /// Column name.
        field: &'static str,
        /// Raw value.
        value: String,
    },
}

fn required<T>(value: Option<T>, table: &'static str, field: &'static str) -> Result<T, MappingError> {
    value.ok_or(MappingError::MissingField { table, field })
}

fn timestamp(raw: &str, field: &'static str) -> Result<OffsetDateTime, MappingError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|_| MappingError::InvalidTimestamp {
        field,
        value: raw.to_owned(),
    })
}

/// Build a [`Task`] from its row and the already fetched, ordered subtask rows.
///
/// `comentario`, `porcentagem` and `backlog` fall back to `""`, `0` and
/// `"A fazer"`; every other column is required. Subtask rows that reference a
/// different task are dropped.
///
/// # Errors
/// Returns [`MappingError`] when a required column is missing or malformed.
pub fn row_to_task(row: TaskRow, subtask_rows: Vec<SubtaskRow>) -> Result<Task, MappingError> {
    let id = TaskId::new(required(row.id, TASKS, "id")?);

    let priority_raw = required(row.priority, TASKS, "priority")?;
    let priority = priority_raw
        .parse::<Priority>()
        .map_err(|_| MappingError::InvalidEnum {
            field: "priority",
            value: priority_raw.clone(),
        })?;

    let backlog = match row.backlog {
        Some(raw) if !raw.trim().is_empty() => raw
            .parse::<Backlog>()
            .map_err(|_| MappingError::InvalidEnum {
                field: "backlog",
                value: raw.clone(),
            })?,
        _ => Backlog::default(),
    };

    let due_raw = required(row.due_date, TASKS, "due_date")?;
    let due_date = parse_day(&due_raw).map_err(|_| MappingError::InvalidDate {
        field: "due_date",
        value: due_raw.clone(),
    })?;

    let created_at = timestamp(&required(row.created_at, TASKS, "created_at")?, "created_at")?;
    let updated_at = timestamp(&required(row.updated_at, TASKS, "updated_at")?, "updated_at")?;

    let mut subtasks = Vec::with_capacity(subtask_rows.len());
    for sub_row in subtask_rows {
        let subtask = row_to_subtask(sub_row)?;
        if subtask.task_id == id {
            subtasks.push(subtask);
        } else {
            warn!(task = %id, subtask = %subtask.id, owner = %subtask.task_id, "dropping subtask of another task");
        }
    }

    Ok(Task {
        id,
        user_name: required(row.user_name, TASKS, "user_name")?,
        solicitante: required(row.solicitante, TASKS, "solicitante")?,
        title: required(row.title, TASKS, "title")?,
        comentario: row.comentario.unwrap_or_default(),
        porcentagem: row.porcentagem.map(Percentage::clamped).unwrap_or_default(),
        backlog,
        priority,
        due_date,
        completed: required(row.completed, TASKS, "completed")?,
        subtasks,
        created_at,
        updated_at,
    })
}

/// Build a [`Subtask`] from its row. `comentario` defaults to `""`.
///
/// # Errors
/// Returns [`MappingError`] when a required column is missing or malformed.
pub fn row_to_subtask(row: SubtaskRow) -> Result<Subtask, MappingError> {
    Ok(Subtask {
        id: SubtaskId::new(required(row.id, SUBTASKS, "id")?),
        task_id: TaskId::new(required(row.task_id, SUBTASKS, "task_id")?),
        title: required(row.title, SUBTASKS, "title")?,
        comentario: row.comentario.unwrap_or_default(),
        completed: required(row.completed, SUBTASKS, "completed")?,
        created_at: timestamp(&required(row.created_at, SUBTASKS, "created_at")?, "created_at")?,
    })
}

/// Insert body for a validated task. New tasks always start incomplete.
#[must_use]
pub fn new_task_row(input: &TaskInput) -> NewTaskRow {
    NewTaskRow {
        user_name: input.user_name.clone(),
        solicitante: input.solicitante.clone(),
        title: input.title.clone(),
        comentario: input.comentario.clone(),
        porcentagem: i64::from(input.porcentagem.get()),
        backlog: input.backlog.as_str().to_owned(),
        priority: input.priority.as_str().to_owned(),
        due_date: format_day(input.due_date),
        completed: false,
    }
}

/// Partial update body carrying only the fields set on `update`.
#[must_use]
pub fn task_patch_row(update: &TaskUpdate) -> TaskRowPatch {
    TaskRowPatch {
        user_name: update.user_name.clone(),
        solicitante: update.solicitante.clone(),
        title: update.title.clone(),
        comentario: update.comentario.clone(),
        porcentagem: update.porcentagem.map(|value| i64::from(value.get())),
        backlog: update.backlog.map(|value| value.as_str().to_owned()),
        priority: update.priority.map(|value| value.as_str().to_owned()),
        due_date: update.due_date.map(format_day),
        completed: update.completed,
    }
}

/// Insert body for a validated subtask under `task_id`.
#[must_use]
pub fn new_subtask_row(task_id: &TaskId, input: &SubtaskInput) -> NewSubtaskRow {
    NewSubtaskRow {
        task_id: task_id.as_str().to_owned(),
        title: input.title.clone(),
        comentario: input.comentario.clone(),
        completed: false,
    }
}

/// Patch flipping a subtask's completion flag.
#[must_use]
pub fn subtask_completion_patch(completed: bool) -> SubtaskRowPatch {
    SubtaskRowPatch {
        completed: Some(completed),
        ..SubtaskRowPatch::default()
    }
}
