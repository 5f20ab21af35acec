//! Circular dependency detection and grading

use crate::models::config::SeverityWeights;
use crate::models::cycle::{CircularDependency, Severity};
use crate::models::dependency_graph::{DependencyGraph, EdgeKind, ImportEdge};
use std::collections::{BTreeSet, HashSet};

/// Finds cycles in a workspace graph and grades their impact
#[derive(Debug, Clone, Default)]
pub struct CycleDetector {
    weights: SeverityWeights,
}

/// One DFS frame: a node and the index of its next neighbor to visit
struct Frame<'g> {
    node: &'g str,
    neighbors: Vec<&'g str>,
    next: usize,
}

impl CycleDetector {
    pub fn new(weights: SeverityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SeverityWeights {
        &self.weights
    }

    /// Detect and grade every cycle reachable in the graph
    pub fn detect(&self, graph: &DependencyGraph) -> Vec<CircularDependency> {
        let cycles: Vec<CircularDependency> = Self::find_cycles(graph)
            .into_iter()
            .map(|cycle| {
                let contributing_edges: Vec<ImportEdge> = contributing_edges(graph, &cycle).cloned().collect();
                let (severity, score) = self.grade(graph, &cycle, &contributing_edges);
                CircularDependency {
                    cycle,
                    contributing_edges,
                    severity,
                    score,
                }
            })
            .collect();

        if !cycles.is_empty() {
            tracing::info!("detected {} circular dependencies", cycles.len());
        }
        cycles
    }

    /// Raw cycles, each closed by repeating its first workspace
    ///
    /// Depth-first from every unvisited workspace in name order, neighbors in
    /// name order. Reaching a workspace on the current path emits the path
    /// from that workspace onwards.
    pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();

        for start in graph.nodes.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }

            let mut stack = vec![Frame {
                node: start.as_str(),
                neighbors: sorted_neighbors(graph, start),
                next: 0,
            }];
            visited.insert(start.as_str());
            on_path.insert(start.as_str());
            path.push(start.as_str());

            while let Some(frame) = stack.last_mut() {
                let Some(&neighbor) = frame.neighbors.get(frame.next) else {
                    on_path.remove(frame.node);
                    path.pop();
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                if on_path.contains(neighbor) {
                    if let Some(pos) = path.iter().position(|n| *n == neighbor) {
                        let mut cycle: Vec<String> = path[pos..].iter().map(|n| n.to_string()).collect();
                        cycle.push(neighbor.to_string());
                        cycles.push(cycle);
                    }
                } else if visited.insert(neighbor) {
                    on_path.insert(neighbor);
                    path.push(neighbor);
                    stack.push(Frame {
                        node: neighbor,
                        neighbors: sorted_neighbors(graph, neighbor),
                        next: 0,
                    });
                }
            }
        }

        cycles
    }

    /// Severity and score of a cycle
    pub fn grade(&self, graph: &DependencyGraph, cycle: &[String], contributing: &[ImportEdge]) -> (Severity, u32) {
        let members: BTreeSet<&str> = cycle.iter().map(String::as_str).collect();
        let n = members.len();
        let w = &self.weights;

        let baseline = match n {
            0..=2 => Severity::High,
            3..=4 => Severity::Medium,
            _ => Severity::Low,
        };

        let mut score = 0u32;

        for member in &members {
            let lowered = member.to_lowercase();
            if w.infrastructure_keywords.iter().any(|k| lowered.contains(k.as_str())) {
                score += w.keyword;
            }

            let dependents = graph.dependents(member).map_or(0, BTreeSet::len);
            if dependents > w.heavy_dependent_threshold {
                score += w.heavy_dependents;
            } else if dependents > w.light_dependent_threshold {
                score += w.light_dependents;
            }
        }

        for edge in contributing {
            match edge.kind {
                EdgeKind::Package => score += w.package_edge,
                EdgeKind::ProjectReference => score += w.project_reference,
                EdgeKind::Direct | EdgeKind::Relative => {}
            }
        }

        let shared_types: BTreeSet<&str> = contributing
            .iter()
            .flat_map(|e| e.shared_symbols.iter().map(String::as_str))
            .collect();
        score += w.shared_type * shared_types.len() as u32;

        if contributing.len() as f64 > w.density_ratio * n as f64 {
            score += w.density;
        }

        let severity = if score >= w.high_score {
            Severity::High
        } else if score >= w.elevated_score {
            match baseline {
                Severity::Low => Severity::Medium,
                _ => Severity::High,
            }
        } else {
            baseline
        };

        (severity, score)
    }
}

/// Dependencies of `node` in name order
fn sorted_neighbors<'g>(graph: &'g DependencyGraph, node: &str) -> Vec<&'g str> {
    graph
        .dependencies(node)
        .map(|deps| deps.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

/// Edges whose `(source, target)` is a consecutive pair of the cycle
pub fn contributing_edges<'g>(graph: &'g DependencyGraph, cycle: &'g [String]) -> impl Iterator<Item = &'g ImportEdge> + 'g {
    let pairs: HashSet<(&str, &str)> = cycle
        .windows(2)
        .map(|pair| (pair[0].as_str(), pair[1].as_str()))
        .collect();

    graph
        .edges
        .iter()
        .filter(move |e| pairs.contains(&(e.source_workspace.as_str(), e.target_workspace.as_str())))
}
