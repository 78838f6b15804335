use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{Backlog, Priority, Task};

/// Completion status selector used by list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Both completed and pending tasks.
    #[default]
    All,
    /// Only completed tasks.
    Completed,
    /// Only pending tasks.
    Pending,
}

impl StatusFilter {
    /// The completion flag this selector requires, if any.
    #[must_use]
    pub const fn completed(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Completed => Some(true),
            Self::Pending => Some(false),
        }
    }
}

/// Exact-match predicates over the in-memory task list.
///
/// Every populated field must match; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Required `user_name`.
    pub user: Option<String>,
    /// Required priority.
    pub priority: Option<Priority>,
    /// Required completion flag.
    pub completed: Option<bool>,
    /// Required backlog stage.
    pub backlog: Option<Backlog>,
}

impl TaskFilter {
    /// Returns true when no predicate is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user.is_none() && self.priority.is_none() && self.completed.is_none() && self.backlog.is_none()
    }

    /// Check whether `task` satisfies every populated predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.user.as_deref().is_none_or(|user| task.user_name == user)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && self.completed.is_none_or(|completed| task.completed == completed)
            && self.backlog.is_none_or(|backlog| task.backlog == backlog)
    }

    /// Filter and order `tasks` for display.
    #[must_use]
    pub fn apply<'a>(&self, tasks: &'a [Task], sort: SortKey) -> Vec<&'a Task> {
        let mut selected: Vec<&Task> = tasks.iter().filter(|task| self.matches(task)).collect();
        selected.sort_by(|a, b| sort.compare(a, b));
        selected
    }
}

/// Builder for [`TaskFilter`].
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    filter: TaskFilter,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact user name. Blank input is ignored.
    #[must_use]
    pub fn user(mut self, user: Option<String>) -> Self {
        self.filter.user = user.and_then(|raw| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        });
        self
    }

    /// Require a priority.
    #[must_use]
    pub const fn priority(mut self, priority: Option<Priority>) -> Self {
        self.filter.priority = priority;
        self
    }

    /// Require a completion status.
    #[must_use]
    pub const fn status(mut self, status: StatusFilter) -> Self {
        self.filter.completed = status.completed();
        self
    }

    /// Require a backlog stage.
    #[must_use]
    pub const fn backlog(mut self, backlog: Option<Backlog>) -> Self {
        self.filter.backlog = backlog;
        self
    }

    /// Finish the filter.
    #[must_use]
    pub fn build(self) -> TaskFilter {
        self.filter
    }
}

/// Ordering applied to list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Earliest due date first.
    #[default]
    DueDate,
    /// Most urgent first.
    Priority,
    /// User name, alphabetical.
    User,
}

impl SortKey {
    fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::DueDate => a.due_date.cmp(&b.due_date),
            Self::Priority => b.priority.cmp(&a.priority),
            Self::User => a.user_name.to_lowercase().cmp(&b.user_name.to_lowercase()),
        }
    }
}
