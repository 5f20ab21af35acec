//! Workspace-level dependency graph data structures

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// How a cross-workspace edge was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Import resolved by (Python) module name
    Direct,
    /// Relative import whose target lies in another workspace
    Relative,
    /// Package name import or manifest dependency declaration
    Package,
    /// TypeScript project reference
    ProjectReference,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Direct => "direct",
            EdgeKind::Relative => "relative",
            EdgeKind::Package => "package",
            EdgeKind::ProjectReference => "project_reference",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved cross-workspace dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub source_workspace: String,
    pub target_workspace: String,
    /// File the edge was found in (manifest or tsconfig for declared edges)
    pub source_file: PathBuf,
    /// The statement or declaration as written
    pub raw_statement: String,
    pub kind: EdgeKind,
    /// Capitalized imported identifiers, treated as shared types
    pub shared_symbols: BTreeSet<String>,
}

/// Adjacency of one workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceNode {
    /// Workspaces this one depends on
    pub imports_from: BTreeSet<String>,
    /// Workspaces depending on this one
    pub imported_by: BTreeSet<String>,
    /// Shared type names imported by this workspace
    pub shared_types: BTreeSet<String>,
}

/// Dependency graph between the workspaces of one monorepo
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Every known workspace, connected or not
    pub nodes: BTreeMap<String, WorkspaceNode>,

    /// All edges folded into `nodes`, in discovery order
    pub edges: Vec<ImportEdge>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with one isolated node per workspace name
    pub fn with_workspaces<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for name in names {
            graph.add_workspace(name);
        }
        graph
    }

    /// Add a workspace node if it is not present yet
    pub fn add_workspace(&mut self, name: impl Into<String>) {
        self.nodes.entry(name.into()).or_default();
    }

    /// Fold an edge into the graph, keeping `imported_by` the transpose of `imports_from`
    ///
    /// Self edges are dropped. Returns whether the edge was recorded.
    pub fn add_edge(&mut self, edge: ImportEdge) -> bool {
        if edge.source_workspace == edge.target_workspace {
            return false;
        }

        let source = self.nodes.entry(edge.source_workspace.clone()).or_default();
        source.imports_from.insert(edge.target_workspace.clone());
        source.shared_types.extend(edge.shared_symbols.iter().cloned());

        self.nodes
            .entry(edge.target_workspace.clone())
            .or_default()
            .imported_by
            .insert(edge.source_workspace.clone());

        self.edges.push(edge);
        true
    }

    /// Workspaces `name` depends on
    pub fn dependencies(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|node| &node.imports_from)
    }

    /// Workspaces depending on `name`
    pub fn dependents(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(name).map(|node| &node.imported_by)
    }

    /// Edges whose `(source, target)` is exactly the given pair
    pub fn edges_between<'a>(&'a self, source: &'a str, target: &'a str) -> impl Iterator<Item = &'a ImportEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source_workspace == source && e.target_workspace == target)
    }

    /// Shared type names per `"source -> target"` pair
    pub fn shared_types_by_pair(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut pairs: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for edge in &self.edges {
            if edge.shared_symbols.is_empty() {
                continue;
            }
            pairs
                .entry(format!("{} -> {}", edge.source_workspace, edge.target_workspace))
                .or_default()
                .extend(edge.shared_symbols.iter().cloned());
        }
        pairs
    }

    /// Workspaces with neither dependencies nor dependents
    pub fn isolated_workspaces(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.imports_from.is_empty() && node.imported_by.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Get statistics about the dependency graph
    pub fn statistics(&self) -> GraphStatistics {
        let mut max_fan_in = 0;
        let mut max_fan_out = 0;
        let mut max_fan_in_workspace = None;
        let mut max_fan_out_workspace = None;

        for (name, node) in &self.nodes {
            let fan_in = node.imported_by.len();
            let fan_out = node.imports_from.len();

            if fan_in > max_fan_in {
                max_fan_in = fan_in;
                max_fan_in_workspace = Some(name.clone());
            }

            if fan_out > max_fan_out {
                max_fan_out = fan_out;
                max_fan_out_workspace = Some(name.clone());
            }
        }

        GraphStatistics {
            total_workspaces: self.nodes.len(),
            total_edges: self.nodes.values().map(|node| node.imports_from.len()).sum(),
            total_imports: self.edges.len(),
            isolated_workspaces: self.isolated_workspaces().len(),
            max_fan_in,
            max_fan_in_workspace,
            max_fan_out,
            max_fan_out_workspace,
        }
    }
}

/// Statistics about the dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_workspaces: usize,
    /// Distinct `(source, target)` workspace pairs
    pub total_edges: usize,
    /// Raw edges, including duplicates between the same pair
    pub total_imports: usize,
    pub isolated_workspaces: usize,
    pub max_fan_in: usize,
    pub max_fan_in_workspace: Option<String>,
    pub max_fan_out: usize,
    pub max_fan_out_workspace: Option<String>,
}
