use time::{Date, OffsetDateTime};

use crate::{Backlog, Percentage, Priority, Subtask, SubtaskId, Task, TaskId};

pub fn task_due(id: &str, due_date: Date, completed: bool) -> Task {
    Task {
        id: TaskId::new(id),
        user_name: "ana".into(),
        solicitante: "bruno".into(),
        title: format!("task {id}"),
        comentario: String::new(),
        porcentagem: Percentage::default(),
        backlog: Backlog::default(),
        priority: Priority::Media,
        due_date,
        completed,
        subtasks: Vec::new(),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

pub fn subtask(task_id: &str, id: &str, completed: bool) -> Subtask {
    Subtask {
        id: SubtaskId::new(id),
        task_id: TaskId::new(task_id),
        title: format!("subtask {id}"),
        comentario: String::new(),
        completed,
        created_at: OffsetDateTime::UNIX_EPOCH,
    }
}
