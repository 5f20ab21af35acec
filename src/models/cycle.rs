//! Circular dependency records

use super::dependency_graph::ImportEdge;
use serde::{Deserialize, Serialize};

/// Graded impact of a circular dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cycle in the workspace graph
///
/// `cycle` starts and ends with the same workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
    pub contributing_edges: Vec<ImportEdge>,
    pub severity: Severity,
    /// Sum of the severity signals that fed the grade
    pub score: u32,
}

impl CircularDependency {
    /// Number of hops in the cycle
    pub fn length(&self) -> usize {
        self.cycle.len().saturating_sub(1)
    }

    /// Distinct workspaces on the cycle
    pub fn members(&self) -> &[String] {
        match self.cycle.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}
