//! Error types for remote table operations.

use thiserror::Error;

/// Errors that can occur during `RestStore` operations.
#[derive(Error, Debug)]
pub enum RestStoreError {
    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error code (Postgres SQLSTATE or `PGRST*`).
        code: Option<String>,
        /// Human-readable message reported by the service.
        message: String,
        /// Additional detail reported by the service.
        details: Option<String>,
        /// Remediation hint reported by the service.
        hint: Option<String>,
    },

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected row shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// No row matched the requested identifier.
    #[error("No row in {table} with id {id}")]
    NotFound {
        /// Table that was queried.
        table: &'static str,
        /// Requested identifier.
        id: String,
    },

    /// The service accepted a write but echoed no row.
    #[error("No data returned from {0}")]
    EmptyResponse(&'static str),

    /// The configured endpoint is not a valid base URL.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
}

impl RestStoreError {
    /// Machine-readable code when the service supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Classify the failure into a closed category.
    #[must_use]
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::Api { status, code, .. } => RemoteErrorKind::classify(code.as_deref(), *status),
            Self::NotFound { .. } => RemoteErrorKind::NotFound,
            _ => RemoteErrorKind::Other,
        }
    }
}

/// Closed set of failure categories surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The table does not exist (schema not installed).
    MissingTable,
    /// Row-level security or credentials rejected the request.
    PermissionDenied,
    /// A NOT NULL column was left empty.
    MissingRequiredField,
    /// The addressed row does not exist.
    NotFound,
    /// Anything else.
    Other,
}

impl RemoteErrorKind {
    /// Map a service error code (and HTTP status as a fallback) to a category.
    #[must_use]
    pub fn classify(code: Option<&str>, status: u16) -> Self {
        match code {
            Some("42P01" | "PGRST205") => Self::MissingTable,
            Some("42501") => Self::PermissionDenied,
            Some("23502") => Self::MissingRequiredField,
            Some("PGRST116") => Self::NotFound,
            _ => match status {
                401 | 403 => Self::PermissionDenied,
                _ => Self::Other,
            },
        }
    }
}
