use serde::Serialize;
use std::collections::HashSet;
use time::Date;

use crate::due::{is_due_today, is_overdue};
use crate::{Priority, Task};

/// Number of tasks at one priority level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityCount {
    /// Priority level.
    pub priority: Priority,
    /// Tasks at this level.
    pub count: usize,
}

/// Aggregate counters shown on the dashboard.
///
/// Recomputed from scratch on every call; nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Size of the task list.
    pub total: usize,
    /// Completed tasks.
    pub completed: usize,
    /// Pending tasks.
    pub pending: usize,
    /// Tasks at `urgente` priority, completed or not.
    pub urgent: usize,
    /// Pending tasks due today.
    pub due_today: usize,
    /// Pending tasks due before today.
    pub overdue: usize,
    /// Distinct `user_name` values.
    pub active_users: usize,
    /// Subtasks across every task.
    pub total_subtasks: usize,
    /// Completed subtasks across every task.
    pub completed_subtasks: usize,
    /// Per-priority breakdown, most urgent first.
    pub by_priority: Vec<PriorityCount>,
}

impl DashboardStats {
    /// Aggregate `tasks` as seen on `today`.
    #[must_use]
    pub fn compute(tasks: &[Task], today: Date) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        let users: HashSet<&str> = tasks.iter().map(|task| task.user_name.as_str()).collect();
        let (completed_subtasks, total_subtasks) = tasks
            .iter()
            .map(Task::subtask_progress)
            .fold((0, 0), |(done, total), (d, t)| (done + d, total + t));

        let by_priority = Priority::DESCENDING
            .into_iter()
            .map(|priority| PriorityCount {
                priority,
                count: tasks.iter().filter(|task| task.priority == priority).count(),
            })
            .collect::<Vec<_>>();
        let urgent = by_priority
            .iter()
            .find(|entry| entry.priority == Priority::Urgente)
            .map_or(0, |entry| entry.count);

        Self {
            total: tasks.len(),
            completed,
            pending: tasks.len() - completed,
            urgent,
            due_today: tasks.iter().filter(|task| is_due_today(task, today)).count(),
            overdue: tasks.iter().filter(|task| is_overdue(task, today)).count(),
            active_users: users.len(),
            total_subtasks,
            completed_subtasks,
            by_priority,
        }
    }

    /// Share of `count` in the whole list, as a percentage (0 for an empty list).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}
