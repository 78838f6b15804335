//! Error surfaced by the task store.

use tarefas_store_rest::{RemoteErrorKind, RestStoreError};
use thiserror::Error;

use crate::config::ConfigIssue;
use crate::mapping::MappingError;

/// Failure of a store operation. Cloned into the store's error slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The connection is not configured.
    #[error("configuration: {0}")]
    Config(#[from] ConfigIssue),

    /// The remote service rejected or failed the request.
    #[error("{message}")]
    Remote {
        /// Closed failure category.
        kind: RemoteErrorKind,
        /// Service error code, when one was reported.
        code: Option<String>,
        /// Service or transport message.
        message: String,
    },

    /// A row came back in a shape that cannot be represented.
    #[error("data integrity: {0}")]
    Mapping(#[from] MappingError),

    /// The addressed task or subtask does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// `"task"` or `"subtask"`.
        entity: &'static str,
        /// Requested identifier.
        id: String,
    },
}

impl StoreError {
    /// Shorthand for a missing task.
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "task",
            id: id.into(),
        }
    }

    /// Shorthand for a missing subtask.
    pub fn subtask_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "subtask",
            id: id.into(),
        }
    }

    /// Failure category, folding local not-found into the remote one.
    #[must_use]
    pub const fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Remote { kind, .. } => *kind,
            Self::NotFound { .. } => RemoteErrorKind::NotFound,
            Self::Config(_) | Self::Mapping(_) => RemoteErrorKind::Other,
        }
    }

    /// Message for the person at the terminal.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(issue) => issue.banner(),
            Self::Mapping(err) => format!("Dados inconsistentes recebidos do servidor: {err}"),
            Self::NotFound { entity: "subtask", id } => format!("Subtarefa não encontrada: {id}"),
            Self::NotFound { id, .. } => format!("Tarefa não encontrada: {id}"),
            Self::Remote { kind, message, .. } => match kind {
                RemoteErrorKind::MissingTable => {
                    "Tabela não existe. Execute o script SQL de criação das tabelas!".to_owned()
                }
                RemoteErrorKind::PermissionDenied => {
                    "Permissão negada. Desabilite o RLS ou crie políticas de acesso!".to_owned()
                }
                RemoteErrorKind::MissingRequiredField => {
                    "Campos obrigatórios não preenchidos. Verifique os dados!".to_owned()
                }
                RemoteErrorKind::NotFound => format!("Registro não encontrado: {message}"),
                RemoteErrorKind::Other => format!("Erro na operação: {message}"),
            },
        }
    }
}

impl From<RestStoreError> for StoreError {
    fn from(err: RestStoreError) -> Self {
        match err {
            RestStoreError::NotFound { table, id } => Self::NotFound {
                entity: if table == "subtasks" { "subtask" } else { "task" },
                id,
            },
            RestStoreError::Api { status, code, message, .. } => Self::Remote {
                kind: RemoteErrorKind::classify(code.as_deref(), status),
                code,
                message,
            },
            other => Self::Remote {
                kind: other.kind(),
                code: None,
                message: other.to_string(),
            },
        }
    }
}
