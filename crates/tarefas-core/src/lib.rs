//! Domain types and pure derivations for tarefas tasks.

/// Dashboard aggregation.
pub mod dashboard;
/// Calendar-day due date logic.
pub mod due;
/// List filters and sort orders.
pub mod filter;
/// Identifier types.
pub mod id;
/// Closed enumerations (priority, backlog stage).
pub mod state;

#[cfg(test)]
mod testing;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

pub use crate::dashboard::{DashboardStats, PriorityCount};
pub use crate::due::{DueStatus, is_due_today, is_overdue, local_today};
pub use crate::filter::{SortKey, StatusFilter, TaskFilter, TaskFilterBuilder};
pub use crate::id::{SubtaskId, TaskId};
pub use crate::state::{Backlog, Priority, UnknownVariant};

/// Completion percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// Upper bound.
    pub const MAX: Self = Self(100);

    /// Clamp an arbitrary integer into `0..=100`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        // Lossless: the value is within u8 range after clamping.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = value.clamp(0, 100) as u8;
        Self(value)
    }

    /// Raw percentage value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// A unit of work with priority, due date, completion state and subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// Person the task belongs to.
    pub user_name: String,
    /// Person who requested the task.
    pub solicitante: String,
    /// Short title.
    pub title: String,
    /// Free-form comment (empty when unset).
    pub comentario: String,
    /// Completion percentage.
    pub porcentagem: Percentage,
    /// Workflow stage.
    pub backlog: Backlog,
    /// Urgency.
    pub priority: Priority,
    /// Calendar day the task is due.
    #[serde(with = "due::day_serde")]
    pub due_date: Date,
    /// Completion flag.
    pub completed: bool,
    /// Checklist items in creation order.
    pub subtasks: Vec<Subtask>,
    /// Server-assigned creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Server-assigned last update timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    /// Returns `(completed, total)` subtask counts.
    #[must_use]
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|st| st.completed).count();
        (done, self.subtasks.len())
    }

    /// Look up a subtask by id.
    #[must_use]
    pub fn subtask(&self, id: &SubtaskId) -> Option<&Subtask> {
        self.subtasks.iter().find(|st| &st.id == id)
    }

    /// Due status relative to `today`.
    #[must_use]
    pub fn due_status(&self, today: Date) -> DueStatus {
        DueStatus::classify(self.due_date, today)
    }
}

/// A checklist item scoped to exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Server-assigned identifier.
    pub id: SubtaskId,
    /// Owning task.
    pub task_id: TaskId,
    /// Short title.
    pub title: String,
    /// Free-form comment (empty when unset).
    pub comentario: String,
    /// Completion flag.
    pub completed: bool,
    /// Server-assigned creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
