//! Data models and structures for crossdeps

pub mod config;
pub mod cycle;
pub mod dependency_graph;
pub mod document;
pub mod index;
pub mod workspace;

pub use config::Settings;
pub use cycle::{CircularDependency, Severity};
pub use dependency_graph::{DependencyGraph, EdgeKind, ImportEdge, WorkspaceNode};
pub use document::Document;
pub use index::{RootIndex, WorkspaceIndex, WorkspaceStatus, INDEX_FILE_NAME};
pub use workspace::{Language, Workspace};
