//! crossdeps - cross-workspace dependency analysis for monorepos
//!
//! Builds a dependency graph between the workspaces of a JavaScript,
//! TypeScript and Python monorepo, detects and grades circular dependencies,
//! and keeps a small root index plus detailed per-workspace indexes on disk,
//! served through size-bounded LRU caches.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod output;
pub mod parsers;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{AnalysisMode, Analyzer, IndexLoader, WorkspaceProcessor, WorkspaceRegistry};
pub use error::{handle_error, ErrorSeverity, IndexError, Result, ResultExt};
pub use models::{
    config::Settings,
    cycle::{CircularDependency, Severity},
    dependency_graph::{DependencyGraph, EdgeKind, ImportEdge},
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
