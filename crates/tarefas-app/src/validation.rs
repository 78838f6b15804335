//! Form validation performed before any remote call.

use std::collections::BTreeMap;
use std::fmt;

use tarefas_core::due::parse_day;
use tarefas_core::{Backlog, Percentage, Priority};
use time::Date;

use crate::task_patch::TaskEditData;

/// Form fields that carry validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    /// Assignee.
    UserName,
    /// Requester.
    Solicitante,
    /// Task title.
    Title,
    /// Due date.
    DueDate,
    /// Subtask title.
    SubtaskTitle,
}

impl FormField {
    /// Wire-style field name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserName => "userName",
            Self::Solicitante => "solicitante",
            Self::Title => "title",
            Self::DueDate => "dueDate",
            Self::SubtaskTitle => "subtaskTitle",
        }
    }
}

/// Per-field validation messages. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    fn insert(&mut self, field: FormField, message: &str) {
        self.0.insert(field, message.to_owned());
    }

    /// Message attached to `field`, if any.
    #[must_use]
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// True when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failing fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {message}", field.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

const USER_REQUIRED: &str = "Nome do usuário é obrigatório";
const SOLICITANTE_REQUIRED: &str = "Solicitante é obrigatório";
const TITLE_REQUIRED: &str = "O título da tarefa é obrigatório";
const DUE_REQUIRED: &str = "Data de entrega é obrigatória";
const DUE_INVALID: &str = "Data de entrega inválida";
const DUE_PAST: &str = "A data não pode ser no passado";
const SUBTASK_TITLE_REQUIRED: &str = "O título da subtarefa é obrigatório";

/// Raw task form as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFormData {
    /// Assignee.
    pub user_name: String,
    /// Requester.
    pub solicitante: String,
    /// Title.
    pub title: String,
    /// Optional comment.
    pub comentario: String,
    /// Completion percentage; clamped into `0..=100`.
    pub porcentagem: Option<i64>,
    /// Backlog stage; `A fazer` when absent.
    pub backlog: Option<Backlog>,
    /// Priority.
    pub priority: Priority,
    /// Due day as `YYYY-MM-DD`.
    pub due_date: String,
}

/// A task form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    /// Trimmed assignee.
    pub user_name: String,
    /// Trimmed requester.
    pub solicitante: String,
    /// Trimmed title.
    pub title: String,
    /// Trimmed comment, possibly empty.
    pub comentario: String,
    /// Clamped percentage.
    pub porcentagem: Percentage,
    /// Backlog stage.
    pub backlog: Backlog,
    /// Priority.
    pub priority: Priority,
    /// Due day, not before the validation day.
    pub due_date: Date,
}

impl TaskFormData {
    /// Check required fields and the due date against `today`.
    ///
    /// Text fields are trimmed; the due date must parse and must not be
    /// earlier than `today`.
    ///
    /// # Errors
    /// Returns every failing field with its message.
    pub fn validate(&self, today: Date) -> Result<TaskInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let user_name = required(&self.user_name, FormField::UserName, USER_REQUIRED, &mut errors);
        let solicitante = required(&self.solicitante, FormField::Solicitante, SOLICITANTE_REQUIRED, &mut errors);
        let title = required(&self.title, FormField::Title, TITLE_REQUIRED, &mut errors);

        let raw_due = self.due_date.trim();
        let due_date = if raw_due.is_empty() {
            errors.insert(FormField::DueDate, DUE_REQUIRED);
            None
        } else {
            match parse_day(raw_due) {
                Ok(day) if day < today => {
                    errors.insert(FormField::DueDate, DUE_PAST);
                    None
                }
                Ok(day) => Some(day),
                Err(_) => {
                    errors.insert(FormField::DueDate, DUE_INVALID);
                    None
                }
            }
        };

        let Some(due_date) = due_date else {
            return Err(errors);
        };
        errors.into_result(TaskInput {
            user_name,
            solicitante,
            title,
            comentario: self.comentario.trim().to_owned(),
            porcentagem: self.porcentagem.map(Percentage::clamped).unwrap_or_default(),
            backlog: self.backlog.unwrap_or_default(),
            priority: self.priority,
            due_date,
        })
    }
}

/// Check an edit of an existing task. The due date may stay in the past.
///
/// # Errors
/// Returns every empty required field with its message.
pub fn validate_edit(data: &TaskEditData) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();
    required(&data.user_name, FormField::UserName, USER_REQUIRED, &mut errors);
    required(&data.solicitante, FormField::Solicitante, SOLICITANTE_REQUIRED, &mut errors);
    required(&data.title, FormField::Title, TITLE_REQUIRED, &mut errors);
    errors.into_result(())
}

/// Raw subtask form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskFormData {
    /// Title.
    pub title: String,
    /// Optional comment.
    pub comentario: String,
}

/// A subtask form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskInput {
    /// Trimmed title.
    pub title: String,
    /// Trimmed comment.
    pub comentario: String,
}

impl SubtaskFormData {
    /// Require a non-blank title.
    ///
    /// # Errors
    /// Returns the subtask title message when the title is blank.
    pub fn validate(&self) -> Result<SubtaskInput, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = required(&self.title, FormField::SubtaskTitle, SUBTASK_TITLE_REQUIRED, &mut errors);
        errors.into_result(SubtaskInput {
            title,
            comentario: self.comentario.trim().to_owned(),
        })
    }
}

fn required(value: &str, field: FormField, message: &str, errors: &mut FieldErrors) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.insert(field, message);
    }
    trimmed.to_owned()
}
