//! Cross-workspace dependency analysis
//!
//! The [`Analyzer`] ties the pieces together: it builds the workspace graph,
//! detects cycles, produces the root and workspace indexes and answers
//! dependency queries through the cache-backed [`IndexLoader`].

use crate::core::budget;
use crate::core::compressor::IndexCompressor;
use crate::core::cycles::CycleDetector;
use crate::core::index_loader::{CacheSet, IndexLoader};
use crate::core::registry::{ManifestRegistry, WorkspaceRegistry};
use crate::error::{IndexError, Result};
use crate::models::config::Settings;
use crate::models::cycle::{CircularDependency, Severity};
use crate::models::dependency_graph::DependencyGraph;
use crate::models::document::Document;
use crate::models::index::{
    CycleSummary, DependencySummary, GlobalStats, MonorepoInfo, ProjectStructure, RegistryEntry, RootIndex,
    WorkspaceIndex, WorkspaceInfo, WorkspaceStats, WorkspaceStatus, INDEX_FILE_NAME,
};
use crate::output::write_json;
use crate::parsers::dependency_graph_builder::{DependencyGraphBuilder, GraphBuild, GraphBuilderConfig};
use crate::parsers::imports::ExtractorSet;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What [`Analyzer::analyze`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Compressed root index, within the size budget
    RootSummary,
    /// Graph, edges, cycles, shared types and impact map
    FullDetail,
}

/// Entry point for analysis of one monorepo
pub struct Analyzer {
    settings: Settings,
    registry: Arc<dyn WorkspaceRegistry>,
    builder: DependencyGraphBuilder,
    detector: CycleDetector,
    compressor: IndexCompressor,
    loader: Arc<IndexLoader>,
}

impl Analyzer {
    /// Create an analyzer reading workspace manifests from disk
    pub fn new(settings: Settings) -> Result<Self> {
        let registry: Arc<dyn WorkspaceRegistry> = Arc::new(ManifestRegistry::from_settings(&settings));
        let caches = Arc::new(CacheSet::new(&settings.cache));
        Self::with_registry(settings, registry, caches)
    }

    /// Create an analyzer over an injected registry and cache set
    pub fn with_registry(settings: Settings, registry: Arc<dyn WorkspaceRegistry>, caches: Arc<CacheSet>) -> Result<Self> {
        let builder = DependencyGraphBuilder::new(
            Arc::clone(&registry),
            ExtractorSet::default(),
            GraphBuilderConfig::from(&settings),
        )?;
        let loader = Arc::new(IndexLoader::new(
            Arc::clone(&registry),
            caches,
            Duration::from_secs(settings.cache.max_age_secs),
        ));

        Ok(Self {
            detector: CycleDetector::new(settings.severity.clone()),
            compressor: IndexCompressor::from_settings(&settings),
            settings,
            registry,
            builder,
            loader,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<dyn WorkspaceRegistry> {
        &self.registry
    }

    pub fn loader(&self) -> &Arc<IndexLoader> {
        &self.loader
    }

    pub fn compressor(&self) -> &IndexCompressor {
        &self.compressor
    }

    /// Scan every workspace and build the dependency graph
    pub fn build_graph(&self) -> GraphBuild {
        self.builder.build()
    }

    pub fn detect_cycles(&self, graph: &DependencyGraph) -> Vec<CircularDependency> {
        self.detector.detect(graph)
    }

    pub fn analyze(&self, mode: AnalysisMode) -> Result<Value> {
        match mode {
            AnalysisMode::RootSummary => self.root_summary().map(|(value, _)| value),
            AnalysisMode::FullDetail => Ok(self.full_detail()),
        }
    }

    /// Generate, persist and cache the root index
    pub fn generate_root_index(&self) -> Result<Value> {
        let (value, _) = self.root_summary()?;
        let path = self.loader.root_index_path();
        let written = write_json(&path, &value)?;
        self.loader.remember_root_index(Arc::new(value.clone()), written);

        tracing::info!("root index written to {} ({} bytes)", path.display(), written);
        Ok(value)
    }

    /// Workspaces `name` depends on; regenerates the root index on a miss
    pub fn get_dependencies(&self, name: &str) -> Result<Vec<String>> {
        if let Some(deps) = self.loader.get_workspace_dependencies(name) {
            return Ok(deps);
        }

        tracing::info!("no root index entry for {}, regenerating", name);
        self.generate_root_index()?;
        self.loader
            .get_workspace_dependencies(name)
            .ok_or_else(|| IndexError::WorkspaceNotFound { name: name.to_string() })
    }

    /// Workspaces depending on `name`; regenerates the root index on a miss
    pub fn get_dependents(&self, name: &str) -> Result<Vec<String>> {
        if let Some(dependents) = self.loader.get_workspace_dependents(name) {
            return Ok(dependents);
        }

        tracing::info!("no root index entry for {}, regenerating", name);
        self.generate_root_index()?;
        self.loader
            .get_workspace_dependents(name)
            .ok_or_else(|| IndexError::WorkspaceNotFound { name: name.to_string() })
    }

    /// Drop cached data of a workspace, and with `cascade` of its dependents
    pub fn invalidate(&self, name: &str, cascade: bool) -> usize {
        self.loader.invalidate_workspace(name, cascade)
    }

    /// Detailed index of one workspace, from a fresh graph
    pub fn build_workspace_index(&self, name: &str) -> Result<WorkspaceIndex> {
        let build = self.build_graph();
        self.build_workspace_index_from(&build, name)
    }

    /// Detailed index of one workspace, from an existing graph build
    pub fn build_workspace_index_from(&self, build: &GraphBuild, name: &str) -> Result<WorkspaceIndex> {
        let workspace = self
            .registry
            .workspace(name)
            .ok_or_else(|| IndexError::WorkspaceNotFound { name: name.to_string() })?;
        let node = build.graph.nodes.get(name).cloned().unwrap_or_default();
        let files = build.files.get(name).cloned().unwrap_or_default();

        let mut dependency_graph: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for edge in build.workspace_imports.get(name).into_iter().flatten() {
            let targets = dependency_graph
                .entry(edge.source_file.to_string_lossy().replace('\\', "/"))
                .or_default();
            if !targets.contains(&edge.target_workspace) {
                targets.push(edge.target_workspace.clone());
            }
        }
        for targets in dependency_graph.values_mut() {
            targets.sort();
        }

        Ok(WorkspaceIndex {
            indexed_at: Utc::now(),
            root: self.registry.root_path().to_path_buf(),
            index_type: "workspace".to_string(),
            workspace: WorkspaceInfo {
                name: workspace.name.clone(),
                path: workspace.path.clone(),
                package_name: self.registry.declared_package_name(name),
                imports_from: node.imports_from.into_iter().collect(),
                imported_by: node.imported_by.into_iter().collect(),
                shared_types: node.shared_types.into_iter().collect(),
            },
            stats: WorkspaceStats {
                total_files: files.len(),
                parsed_files: files.values().filter(|f| f.parsed).count(),
            },
            files,
            dependency_graph,
        })
    }

    /// Build and persist one workspace index from a fresh graph
    pub fn write_workspace_index(&self, name: &str) -> Result<PathBuf> {
        let build = self.build_graph();
        self.write_workspace_index_from(&build, name)
    }

    /// Persist one workspace index and invalidate it and its dependents
    pub fn write_workspace_index_from(&self, build: &GraphBuild, name: &str) -> Result<PathBuf> {
        let index = self.build_workspace_index_from(build, name)?;
        let document = Document::from(serde_json::to_value(&index)?);
        let compressed = self.compressor.compress_workspace_or_fallback(&document);

        let path = self
            .loader
            .workspace_index_path(name)
            .ok_or_else(|| IndexError::WorkspaceNotFound { name: name.to_string() })?;
        write_json(&path, &compressed)?;
        self.loader.invalidate_workspace(name, true);

        Ok(path)
    }

    /// Compressed root index and its serialized size, both budgets enforced
    fn root_summary(&self) -> Result<(Value, u64)> {
        let budgets = &self.settings.budgets;

        budget::timed(
            "root index generation",
            Duration::from_secs(budgets.root_generation_secs),
            || {
                let index = self.build_root_index()?;
                let document = Document::from(serde_json::to_value(&index)?);
                let compressed = self.compressor.compress_root_or_fallback(&document);

                let size = serde_json::to_vec(&compressed)?.len() as u64;
                budget::enforce_size("root index", size, budgets.root_index_max_bytes)?;
                Ok((compressed, size))
            },
        )
    }

    fn build_root_index(&self) -> Result<RootIndex> {
        let start = Instant::now();
        let build = self.build_graph();
        let cycles = self.detect_cycles(&build.graph);
        let stats = build.graph.statistics();
        let workspaces = self.registry.list_workspaces();

        let mut registry = BTreeMap::new();
        let (mut indexed, mut failed) = (0, 0);
        for workspace in &workspaces {
            let status = self.workspace_status(&workspace.name, &workspace.absolute_path.join(INDEX_FILE_NAME));
            match status {
                WorkspaceStatus::Indexed => indexed += 1,
                WorkspaceStatus::Failed => failed += 1,
                WorkspaceStatus::Pending => {}
            }
            registry.insert(
                workspace.name.clone(),
                RegistryEntry {
                    path: workspace.path.clone(),
                    index_path: workspace.path.join(INDEX_FILE_NAME),
                    status,
                },
            );
        }

        let cross_workspace_dependencies = build
            .graph
            .nodes
            .iter()
            .map(|(name, node)| (name.clone(), node.imports_from.iter().cloned().collect()))
            .collect();

        let count = |severity: Severity| cycles.iter().filter(|c| c.severity == severity).count();
        let dependency_summary = DependencySummary {
            total_workspaces: stats.total_workspaces,
            total_edges: stats.total_edges,
            total_imports: stats.total_imports,
            circular_count: cycles.len(),
            high_severity: count(Severity::High),
            medium_severity: count(Severity::Medium),
            low_severity: count(Severity::Low),
            isolated_workspaces: stats.isolated_workspaces,
            analysis_time_ms: start.elapsed().as_millis() as u64,
        };

        let names: Vec<&str> = workspaces.iter().map(|ws| ws.name.as_str()).collect();

        tracing::info!(
            "root index: {} workspaces, {} edges, {} cycles",
            stats.total_workspaces,
            stats.total_edges,
            cycles.len()
        );

        Ok(RootIndex {
            indexed_at: Utc::now(),
            root: self.registry.root_path().display().to_string(),
            index_type: "hierarchical_root".to_string(),
            monorepo: MonorepoInfo {
                enabled: true,
                tool: "config".to_string(),
                total_workspaces: workspaces.len(),
                workspace_registry: registry,
            },
            cross_workspace_dependencies,
            circular_dependencies: cycles.iter().map(CycleSummary::from).collect(),
            dependency_summary,
            global_stats: GlobalStats {
                total_workspaces: workspaces.len(),
                total_files: build.files.values().map(BTreeMap::len).sum(),
                indexed_workspaces: indexed,
                failed_workspaces: failed,
            },
            project_structure: ProjectStructure {
                kind: "workspace_overview".to_string(),
                tree: overview_tree(&names),
            },
        })
    }

    fn workspace_status(&self, name: &str, index_path: &std::path::Path) -> WorkspaceStatus {
        if !index_path.is_file() {
            WorkspaceStatus::Pending
        } else if self.loader.load_workspace_index(name, None, false).is_some() {
            WorkspaceStatus::Indexed
        } else {
            WorkspaceStatus::Failed
        }
    }

    fn full_detail(&self) -> Value {
        let start = Instant::now();
        let build = self.build_graph();
        let cycles = self.detect_cycles(&build.graph);

        let impact: BTreeMap<&str, Value> = build
            .graph
            .nodes
            .iter()
            .map(|(name, node)| {
                (
                    name.as_str(),
                    json!({
                        "affects": node.imported_by,
                        "affected_by": node.imports_from,
                        "impact_score": node.imported_by.len(),
                    }),
                )
            })
            .collect();

        json!({
            "metadata": {
                "analyzed_at": Utc::now(),
                "root": self.registry.root_path(),
                "total_workspaces": build.graph.nodes.len(),
                "analysis_time_ms": start.elapsed().as_millis() as u64,
            },
            "graph": build.graph.nodes,
            "edges": build.graph.edges,
            "workspace_imports": build.workspace_imports,
            "cycles": cycles,
            "shared_types": build.graph.shared_types_by_pair(),
            "impact": impact,
            "statistics": build.graph.statistics(),
        })
    }
}

/// One line per workspace, tree-drawing style
fn overview_tree(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let branch = if i + 1 == names.len() { "└── " } else { "├── " };
            format!("{}{}/", branch, name)
        })
        .collect()
}
