//! Error types for encounter mapping and export.
//!
//! Errors are layered: [`ExportError`] is the single type returned by every
//! fallible operation in this crate, and wraps category-specific enums for
//! validation, search, backend, and bulk export failures.
//!
//! The mapper itself never fails. Everything here is raised by the search
//! adapter, the record store, the sink, or the export loop.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Input validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Search operation errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Record store errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Bulk export errors
    #[error(transparent)]
    BulkExport(#[from] BulkExportError),
}

impl ExportError {
    /// Returns true if this error is a cooperative shutdown signal rather than
    /// a failure.
    ///
    /// Callers should persist a resumption point instead of alerting on it.
    pub fn is_shutdown(&self) -> bool {
        matches!(
            self,
            ExportError::BulkExport(BulkExportError::ShutdownInProgress { .. })
        )
    }

    /// Returns true if the error was raised while encoding a resource.
    pub fn is_encoding(&self) -> bool {
        matches!(self, ExportError::BulkExport(BulkExportError::Encoding { .. }))
    }

    /// Returns the last exported resource id carried by a shutdown signal.
    pub fn last_exported_id(&self) -> Option<&str> {
        match self {
            ExportError::BulkExport(BulkExportError::ShutdownInProgress {
                last_exported_id,
            }) => last_exported_id.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while validating records or search input.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A raw record is missing a field that must always be present.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },

    /// A raw record field has an unexpected JSON type.
    #[error("invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// A raw record is not a JSON object.
    #[error("record is not an object: {found}")]
    NotAnObject { found: String },

    /// The search parameter value is invalid.
    #[error("invalid search parameter: {parameter}")]
    InvalidSearchParameter { parameter: String, message: String },

    /// The code system configuration could not be read.
    #[error("invalid code system configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Errors related to search operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The search parameter is not declared in the catalog.
    #[error("unsupported search parameter: {name}")]
    UnsupportedParameter { name: String },

    /// The comparison prefix is not valid for the parameter type.
    #[error("unsupported prefix '{prefix}' for parameter '{name}' of type '{param_type}'")]
    UnsupportedPrefix {
        name: String,
        prefix: String,
        param_type: String,
    },

    /// Search query parsing failed.
    #[error("failed to parse search query: {message}")]
    QueryParseError { message: String },
}

/// Errors originating from the record store.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The store is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Query execution error.
    #[error("query execution failed: {message}")]
    QueryError { message: String },
}

/// Errors related to bulk export operations.
#[derive(Error, Debug)]
pub enum BulkExportError {
    /// A mapped resource could not be serialized to the wire format.
    #[error("failed to encode {resource_type}/{id}: {message}")]
    Encoding {
        resource_type: String,
        id: String,
        message: String,
    },

    /// Error writing export output.
    #[error("export write error: {message}")]
    WriteError { message: String },

    /// Invalid export request.
    #[error("invalid export request: {message}")]
    InvalidRequest { message: String },

    /// The export level is not supported for this resource type.
    #[error("resource type '{resource_type}' does not support {level} export")]
    LevelNotSupported {
        resource_type: String,
        level: String,
    },

    /// A shutdown was requested while the export was running.
    #[error("export interrupted by shutdown{}", shutdown_suffix(.last_exported_id))]
    ShutdownInProgress { last_exported_id: Option<String> },
}

fn shutdown_suffix(last_exported_id: &Option<String>) -> String {
    match last_exported_id {
        Some(id) => format!(" after {}", id),
        None => String::new(),
    }
}

/// Result type alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

impl From<std::io::Error> for BulkExportError {
    fn from(err: std::io::Error) -> Self {
        BulkExportError::WriteError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::BulkExport(err.into())
    }
}
