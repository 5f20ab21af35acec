//! Error context utilities for crossdeps
//!
//! This module provides utilities for adding context to errors and handling
//! errors in a consistent way throughout the crate.

use crate::error::{ErrorSeverity, IndexError, Result};
use std::path::Path;

/// Extension trait for Result to add context to errors
pub trait ResultExt<T, E> {
    /// Add context to an error with a custom message
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;

    /// Add file context to an error
    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|err| IndexError::Analysis {
            message: format!("{}: {}", context(), err),
        })
    }

    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T> {
        self.map_err(|err| IndexError::FileAccess {
            path: path.as_ref().to_path_buf(),
            message: format!("{}", err),
        })
    }
}

/// Handle an error based on its severity
///
/// - Warning: Log the error and return None
/// - Error: Log the error and return None
/// - Critical: Log the error and return Some(error)
pub fn handle_error(err: IndexError) -> Option<IndexError> {
    let message = err.user_message();

    match err.severity() {
        ErrorSeverity::Warning => {
            tracing::warn!("{}", message);
            None
        }
        ErrorSeverity::Error => {
            tracing::error!("{}", message);
            None
        }
        ErrorSeverity::Critical => {
            tracing::error!("critical: {}", message);
            Some(err)
        }
    }
}
