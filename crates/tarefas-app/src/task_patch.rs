use tarefas_core::{Backlog, Percentage, Priority, Task};
use time::Date;

/// Fields to change on an existing task. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// Overwrite the assignee.
    pub user_name: Option<String>,
    /// Overwrite the requester.
    pub solicitante: Option<String>,
    /// Overwrite the title.
    pub title: Option<String>,
    /// Overwrite the free-text comment.
    pub comentario: Option<String>,
    /// Overwrite the completion percentage.
    pub porcentagem: Option<Percentage>,
    /// Move to another backlog stage.
    pub backlog: Option<Backlog>,
    /// Change the priority.
    pub priority: Option<Priority>,
    /// Move the due day.
    pub due_date: Option<Date>,
    /// Mark completed or pending.
    pub completed: Option<bool>,
}

impl TaskUpdate {
    /// Update touching only the completion flag.
    #[must_use]
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Returns true when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user_name.is_none()
            && self.solicitante.is_none()
            && self.title.is_none()
            && self.comentario.is_none()
            && self.porcentagem.is_none()
            && self.backlog.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }
}

/// Full editable snapshot of a task, as presented in an edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEditData {
    /// Assignee.
    pub user_name: String,
    /// Requester.
    pub solicitante: String,
    /// Title.
    pub title: String,
    /// Free-text comment.
    pub comentario: String,
    /// Completion percentage.
    pub porcentagem: Percentage,
    /// Backlog stage.
    pub backlog: Backlog,
    /// Priority.
    pub priority: Priority,
    /// Due day.
    pub due_date: Date,
}

impl From<&Task> for TaskEditData {
    fn from(task: &Task) -> Self {
        Self {
            user_name: task.user_name.clone(),
            solicitante: task.solicitante.clone(),
            title: task.title.clone(),
            comentario: task.comentario.clone(),
            porcentagem: task.porcentagem,
            backlog: task.backlog,
            priority: task.priority,
            due_date: task.due_date,
        }
    }
}

/// Minimal update turning `task` into `edited`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    update: TaskUpdate,
}

impl TaskPatch {
    /// Diff `edited` against the current task. Text fields are compared trimmed.
    #[must_use]
    pub fn from_task(task: &Task, edited: TaskEditData) -> Self {
        let update = TaskUpdate {
            user_name: changed_text(&task.user_name, edited.user_name),
            solicitante: changed_text(&task.solicitante, edited.solicitante),
            title: changed_text(&task.title, edited.title),
            comentario: changed_text(&task.comentario, edited.comentario),
            porcentagem: changed(task.porcentagem, edited.porcentagem),
            backlog: changed(task.backlog, edited.backlog),
            priority: changed(task.priority, edited.priority),
            due_date: changed(task.due_date, edited.due_date),
            completed: None,
        };
        Self { update }
    }

    /// Returns true when nothing changed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.update.is_empty()
    }

    /// Convert into the store update.
    #[must_use]
    pub fn into_task_update(self) -> TaskUpdate {
        self.update
    }
}

fn changed_text(current: &str, edited: String) -> Option<String> {
    let trimmed = edited.trim();
    (trimmed != current).then(|| trimmed.to_owned())
}

fn changed<T: PartialEq>(current: T, edited: T) -> Option<T> {
    (current != edited).then_some(edited)
}
