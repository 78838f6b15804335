//! Row shapes of the `tasks` and `subtasks` tables.
//!
//! Rows read back from the service keep every column optional: whether a
//! missing column is acceptable is decided by the mapping layer, not here.

use serde::{Deserialize, Serialize};

/// A row of the `tasks` table as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskRow {
    pub id: Option<String>,
    pub user_name: Option<String>,
    pub solicitante: Option<String>,
    pub title: Option<String>,
    pub comentario: Option<String>,
    pub porcentagem: Option<i64>,
    pub backlog: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Insert body for the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskRow {
    pub user_name: String,
    pub solicitante: String,
    pub title: String,
    pub comentario: String,
    pub porcentagem: i64,
    pub backlog: String,
    pub priority: String,
    pub due_date: String,
    pub completed: bool,
}

/// Partial update body for the `tasks` table. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solicitante: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porcentagem: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskRowPatch {
    /// Returns true when the patch would not change any column.
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

/// A row of the `subtasks` table as returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtaskRow {
    pub id: Option<String>,
    pub task_id: Option<String>,
    pub title: Option<String>,
    pub comentario: Option<String>,
    pub completed: Option<bool>,
    pub created_at: Option<String>,
}

/// Insert body for the `subtasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubtaskRow {
    pub task_id: String,
    pub title: String,
    pub comentario: String,
    pub completed: bool,
}

/// Partial update body for the `subtasks` table. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRowPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comentario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_omits_unset_columns() {
        let patch = TaskRowPatch {
            completed: Some(true),
            ..TaskRowPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap_or_else(|err| panic!("must serialize: {err}"));
        assert_eq!(json, serde_json::json!({ "completed": true }));
        assert!(!patch.is_empty());
        assert!(TaskRowPatch::default().is_empty());
    }

    #[test]
    fn task_row_tolerates_missing_and_null_columns() {
        let row: TaskRow = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "title": "Revisar contrato",
            "comentario": null
        }))
        .unwrap_or_else(|err| panic!("must parse row: {err}"));
        assert_eq!(row.id.as_deref(), Some("t1"));
        assert!(row.comentario.is_none());
        assert!(row.user_name.is_none());
    }
}
