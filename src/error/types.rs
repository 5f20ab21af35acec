//! Error types and definitions for crossdeps
//!
//! This module provides the error enum shared by the graph builder, the caches,
//! the compressor and the configuration layer, together with severity levels
//! used by callers to decide whether a failure aborts the current operation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity levels for different error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Warning level errors - operation can continue
    Warning,
    /// Error level - current operation fails but overall process can continue
    Error,
    /// Critical level - process should terminate
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Main error type for crossdeps operations
#[derive(Debug, Error)]
pub enum IndexError {
    /// Standard IO errors
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing errors with file context
    #[error("JSON parsing error in {file}: {source}")]
    JsonParse {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A package manifest or build config that parsed but has the wrong shape
    #[error("Invalid manifest {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    /// Analysis errors carrying a contextual message
    #[error("Analysis error: {message}")]
    Analysis { message: String },

    /// A file or directory that could not be accessed
    #[error("Cannot access {path}: {message}")]
    FileAccess { path: PathBuf, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// TOML parsing errors
    #[error("TOML parsing error: {source}")]
    TomlParse {
        #[source]
        source: toml::de::Error,
    },

    /// Glob pattern errors
    #[error("Glob pattern error: {source}")]
    GlobPattern {
        #[source]
        source: glob::PatternError,
    },

    /// Configuration file not found
    #[error("Configuration file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file read errors
    #[error("Error reading configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file parse errors
    #[error("Error parsing configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Index file write errors
    #[error("Error writing index file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown workspace name
    #[error("Workspace not found: {name}")]
    WorkspaceNotFound { name: String },

    /// Compression failed; callers recover through the fallback chain
    #[error("Compression error: {message}")]
    Compression { message: String },

    /// Size or time budget exceeded
    #[error("{what} is {measured}{unit}, exceeds {threshold}{unit} limit")]
    BudgetExceeded {
        what: String,
        measured: u64,
        threshold: u64,
        unit: &'static str,
    },

    /// Parallel execution error
    #[error("Parallel execution error: {message}")]
    ParallelExecution { message: String },

    /// JSON serialization error
    #[error("JSON serialization error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },
}

impl IndexError {
    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Warning level errors - operation can continue
            IndexError::JsonParse { .. } => ErrorSeverity::Warning,
            IndexError::InvalidManifest { .. } => ErrorSeverity::Warning,
            IndexError::Compression { .. } => ErrorSeverity::Warning,
            IndexError::FileAccess { .. } => ErrorSeverity::Warning,

            // Critical errors - process should terminate
            IndexError::Config { .. } => ErrorSeverity::Critical,
            IndexError::ConfigNotFound { .. } => ErrorSeverity::Critical,
            IndexError::ConfigRead { .. } => ErrorSeverity::Critical,
            IndexError::ConfigParse { .. } => ErrorSeverity::Critical,
            IndexError::BudgetExceeded { .. } => ErrorSeverity::Critical,

            // Regular errors - current operation fails but overall process can continue
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if this is a critical error that should terminate the process
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            IndexError::JsonParse { file, source, .. } => {
                format!("Invalid JSON in '{}': {}. Please check the file format.", file.display(), source)
            }
            IndexError::InvalidManifest { path, message } => {
                format!("Invalid manifest '{}': {}. Its declared dependencies are ignored.", path.display(), message)
            }
            IndexError::Io { source } => {
                format!("File system error: {}. Check disk space and permissions.", source)
            }
            IndexError::ConfigNotFound { path } => {
                format!("Configuration file not found at '{}'. Create a config file or pass settings explicitly.", path.display())
            }
            IndexError::WorkspaceNotFound { name } => {
                format!("No workspace named '{}' is registered.", name)
            }
            IndexError::BudgetExceeded { what, measured, threshold, unit } => {
                format!("{} measured {}{} against a limit of {}{}. The monorepo exceeds the indexing capacity.", what, measured, unit, threshold, unit)
            }
            // For other errors, use the standard Display implementation
            _ => self.to_string(),
        }
    }

    /// Create an IO error with context
    pub fn io_error(source: std::io::Error) -> Self {
        IndexError::Io { source }
    }

    /// Create a JSON parse error with file context
    pub fn json_parse_error(file: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        IndexError::JsonParse { file: file.into(), source }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        IndexError::Config { message: message.into() }
    }

    /// Create a compression error
    pub fn compression_error(message: impl Into<String>) -> Self {
        IndexError::Compression { message: message.into() }
    }

    /// Create a size budget violation measured in bytes
    pub fn size_budget_exceeded(what: impl Into<String>, measured: u64, threshold: u64) -> Self {
        IndexError::BudgetExceeded { what: what.into(), measured, threshold, unit: " bytes" }
    }

    /// Create a time budget violation measured in milliseconds
    pub fn time_budget_exceeded(what: impl Into<String>, measured_ms: u64, threshold_ms: u64) -> Self {
        IndexError::BudgetExceeded { what: what.into(), measured: measured_ms, threshold: threshold_ms, unit: "ms" }
    }
}

// Implement From for common error types
impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::io_error(err)
    }
}

impl From<toml::de::Error> for IndexError {
    fn from(err: toml::de::Error) -> Self {
        IndexError::TomlParse { source: err }
    }
}

impl From<glob::PatternError> for IndexError {
    fn from(err: glob::PatternError) -> Self {
        IndexError::GlobPattern { source: err }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::JsonSerialize { source: err }
    }
}

/// Result type alias for crossdeps operations
pub type Result<T> = std::result::Result<T, IndexError>;
