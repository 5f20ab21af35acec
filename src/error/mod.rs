//! Error handling for crossdeps
//!
//! This module provides the error type, result alias, and error context
//! utilities used throughout the crate.

pub mod context;
pub mod types;

pub use context::{handle_error, ResultExt};
pub use types::{ErrorSeverity, IndexError, Result};
