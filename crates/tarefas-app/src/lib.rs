//! Application layer for tarefas.
//!
//! Holds the task store that keeps the local list in step with the remote
//! tables, along with row mapping, form validation and configuration shared by
//! the CLI.

pub mod config;
pub mod error;
pub mod mapping;
pub mod memory_store;
pub mod remote;
pub mod task_patch;
pub mod task_store;
pub mod validation;

// Re-exports for convenience
pub use config::{ConfigIssue, ConnectionConfig, ProjectConfig};
pub use error::StoreError;
pub use mapping::MappingError;
pub use memory_store::MemoryStore;
pub use remote::RemoteStore;
pub use task_patch::{TaskEditData, TaskPatch, TaskUpdate};
pub use task_store::TaskStore;
pub use validation::{FieldErrors, FormField, SubtaskFormData, SubtaskInput, TaskFormData, TaskInput, validate_edit};
