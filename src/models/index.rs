//! Persisted index documents
//!
//! The root index is a lightweight summary of the whole monorepo, written to
//! `<root>/PROJECT_INDEX.json`. Each workspace gets its own detailed index in
//! `<workspace>/PROJECT_INDEX.json`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::cycle::{CircularDependency, Severity};
use super::workspace::Language;

/// File name of every index on disk
pub const INDEX_FILE_NAME: &str = "PROJECT_INDEX.json";

/// Index state of a workspace as seen from the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceStatus {
    /// Index file exists and parses
    Indexed,
    /// Index file not written yet
    Pending,
    /// Index file exists but cannot be read or parsed
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub path: PathBuf,
    pub index_path: PathBuf,
    pub status: WorkspaceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonorepoInfo {
    pub enabled: bool,
    /// Where the workspace list came from
    pub tool: String,
    pub total_workspaces: usize,
    pub workspace_registry: BTreeMap<String, RegistryEntry>,
}

/// Cycle as listed in the root index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: Vec<String>,
    pub severity: Severity,
    pub length: usize,
}

impl From<&CircularDependency> for CycleSummary {
    fn from(cycle: &CircularDependency) -> Self {
        Self {
            cycle: cycle.cycle.clone(),
            severity: cycle.severity,
            length: cycle.length(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySummary {
    pub total_workspaces: usize,
    pub total_edges: usize,
    pub total_imports: usize,
    pub circular_count: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    pub isolated_workspaces: usize,
    pub analysis_time_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_workspaces: usize,
    pub total_files: usize,
    pub indexed_workspaces: usize,
    pub failed_workspaces: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStructure {
    #[serde(rename = "type")]
    pub kind: String,
    pub tree: Vec<String>,
}

/// Summary index stored at the monorepo root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootIndex {
    pub indexed_at: DateTime<Utc>,
    pub root: String,
    pub index_type: String,
    pub monorepo: MonorepoInfo,
    pub cross_workspace_dependencies: BTreeMap<String, Vec<String>>,
    pub circular_dependencies: Vec<CycleSummary>,
    pub dependency_summary: DependencySummary,
    pub global_stats: GlobalStats,
    pub project_structure: ProjectStructure,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceStats {
    pub total_files: usize,
    pub parsed_files: usize,
}

/// Per-file record inside a workspace index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub language: Language,
    pub parsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

/// Workspace block of a workspace index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub imports_from: Vec<String>,
    pub imported_by: Vec<String>,
    pub shared_types: Vec<String>,
}

/// Detailed index stored inside one workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceIndex {
    pub indexed_at: DateTime<Utc>,
    pub root: PathBuf,
    pub index_type: String,
    pub workspace: WorkspaceInfo,
    pub stats: WorkspaceStats,
    pub files: BTreeMap<String, FileEntry>,
    pub dependency_graph: BTreeMap<String, Vec<String>>,
}
