//! Unified error hierarchy for weightrs
//!
//! Calculators return sentinel values for "no data" and never fail. Errors are
//! reserved for input that cannot be interpreted at all: malformed import
//! files, incomplete evaluation forms and storage failures.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all weightrs operations
#[derive(Debug, Error)]
pub enum WeightrsError {
    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Repository errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Invalid data structure
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    /// Every data row was rejected
    #[error("No valid rows found ({rejected} rejected)")]
    NoValidRows { rejected: usize },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Insufficient data for calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// A required form field was never supplied
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Missing user profile data
    #[error("Missing profile: {field}")]
    MissingProfile { field: String },
}

/// Repository errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record not found
    #[error("Record not found: {kind}.{id}")]
    NotFound { kind: String, id: String },

    /// Operation needs a profile that does not exist yet
    #[error("No profile has been created")]
    NoProfile,

    /// Persisted data could not be read back
    #[error("Corrupted data in {path}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    /// In-memory state could not be serialized
    #[error("Serialization failed: {reason}")]
    Serialization { reason: String },
}

/// Result type alias for weightrs operations
pub type Result<T> = std::result::Result<T, WeightrsError>;

impl WeightrsError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, WeightrsError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WeightrsError::Validation(_) => ErrorSeverity::Warning,
            WeightrsError::Storage(StorageError::NotFound { .. }) => ErrorSeverity::Warning,
            WeightrsError::ImportExport(ImportExportError::NoValidRows { .. }) => {
                ErrorSeverity::Warning
            }
            WeightrsError::Calculation(CalculationError::MissingField { .. }) => {
                ErrorSeverity::Warning
            }
            WeightrsError::Storage(StorageError::Corrupted { .. }) => ErrorSeverity::Error,
            WeightrsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            WeightrsError::ImportExport(ImportExportError::NoValidRows { .. }) => {
                "No valid entries were found in the file. Check the date and weight columns."
                    .to_string()
            }
            WeightrsError::ImportExport(ImportExportError::MissingData { field }) => {
                format!("The backup file is missing its {} section.", field)
            }
            WeightrsError::Storage(StorageError::NoProfile) => {
                "Create a profile first with `weightrs config init` or by importing a backup."
                    .to_string()
            }
            WeightrsError::Storage(StorageError::Corrupted { path, .. }) => {
                format!("Saved data at {} could not be read.", path.display())
            }
            WeightrsError::Calculation(CalculationError::MissingField { field }) => {
                format!("The evaluation form is incomplete: {} is required.", field)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
