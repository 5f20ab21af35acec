//! Workspace dependency graph construction
//!
//! Every source file of every workspace is scanned for imports; each import is
//! resolved to a workspace by, in order, relative path, package name, then the
//! declarations found in tsconfig project references and manifests.

use crate::core::registry::WorkspaceRegistry;
use crate::error::{handle_error, IndexError, Result};
use crate::models::config::Settings;
use crate::models::dependency_graph::{DependencyGraph, EdgeKind, ImportEdge};
use crate::models::index::FileEntry;
use crate::models::{Language, Workspace};
use crate::parsers::imports::{ExtractorSet, ImportExtractor, RawImport};
use crate::parsers::pyproject::module_name;
use crate::parsers::tsconfig::TsConfigParser;
use crate::utils::path_resolver::{normalize_path, relative_display};
use glob::Pattern;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

/// Configuration for dependency graph building
#[derive(Debug, Clone)]
pub struct GraphBuilderConfig {
    pub exclude_patterns: Vec<String>,
    pub max_file_size_bytes: u64,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self::from(&settings)
    }
}

impl From<&Settings> for GraphBuilderConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            exclude_patterns: settings.exclude_patterns.clone(),
            max_file_size_bytes: settings.max_file_size_bytes,
        }
    }
}

/// Result of one build pass
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub graph: DependencyGraph,
    /// Edges grouped by source workspace
    pub workspace_imports: BTreeMap<String, Vec<ImportEdge>>,
    /// Workspace name to workspace-relative file path to record
    pub files: BTreeMap<String, BTreeMap<String, FileEntry>>,
    pub elapsed_ms: u64,
}

type MemoKey = (Language, String, String);

/// Per-pass state; resolutions are only valid for one pass
struct Pass<'a> {
    /// Workspaces in name order with their declared package names
    packages: Vec<(&'a Workspace, Option<String>)>,
    memo: HashMap<MemoKey, Option<(String, EdgeKind)>>,
}

/// Name an import must use to reach `workspace`; Python falls back to the workspace name
fn package_name_for<'w>(language: Language, workspace: &'w Workspace, declared: Option<&'w str>) -> Option<&'w str> {
    match declared {
        Some(name) => Some(name),
        None if language == Language::Python => Some(workspace.name.as_str()),
        None => None,
    }
}

/// Builds the workspace dependency graph of a monorepo
pub struct DependencyGraphBuilder {
    registry: Arc<dyn WorkspaceRegistry>,
    extractors: ExtractorSet,
    exclude: Vec<Pattern>,
    config: GraphBuilderConfig,
}

impl DependencyGraphBuilder {
    /// Create a new builder; fails on an invalid exclude pattern
    pub fn new(registry: Arc<dyn WorkspaceRegistry>, extractors: ExtractorSet, config: GraphBuilderConfig) -> Result<Self> {
        let exclude = config
            .exclude_patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(IndexError::from))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            registry,
            extractors,
            exclude,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<dyn WorkspaceRegistry> {
        &self.registry
    }

    /// Run one full pass over all workspaces
    pub fn build(&self) -> GraphBuild {
        let start = Instant::now();
        let workspaces = self.registry.list_workspaces();
        let mut pass = Pass {
            packages: workspaces
                .iter()
                .map(|ws| (ws, self.registry.declared_package_name(&ws.name)))
                .collect(),
            memo: HashMap::new(),
        };

        let mut result = GraphBuild {
            graph: DependencyGraph::with_workspaces(workspaces.iter().map(|ws| ws.name.clone())),
            ..Default::default()
        };

        for workspace in &workspaces {
            let (edges, files) = self.scan_workspace(workspace, &mut pass);
            for edge in &edges {
                result.graph.add_edge(edge.clone());
            }
            result.workspace_imports.insert(workspace.name.clone(), edges);
            result.files.insert(workspace.name.clone(), files);
        }

        result.elapsed_ms = start.elapsed().as_millis() as u64;

        let total_files: usize = result.files.values().map(BTreeMap::len).sum();
        tracing::info!(
            "dependency graph built: {} workspaces, {} edges, {} files in {}ms",
            workspaces.len(),
            result.graph.edges.len(),
            total_files,
            result.elapsed_ms
        );

        result
    }

    /// Edges and file records of one workspace
    fn scan_workspace(&self, workspace: &Workspace, pass: &mut Pass<'_>) -> (Vec<ImportEdge>, BTreeMap<String, FileEntry>) {
        let mut edges = Vec::new();
        let mut files = BTreeMap::new();

        for path in self.source_files(workspace) {
            let Some(extractor) = self.extractors.for_path(&path) else { continue };
            let relative = relative_display(&path, &workspace.absolute_path)
                .unwrap_or_else(|| path.to_string_lossy().into_owned());
            let language = Language::from_path(&path).unwrap_or_else(|| extractor.language());

            let Some(content) = self.read_source(&path) else {
                files.insert(relative, FileEntry { language, parsed: false, imports: Vec::new() });
                continue;
            };

            let mut imports = Vec::new();
            for import in extractor.extract_imports(&content) {
                if let Some((target, kind)) = self.resolve_import(workspace, extractor.as_ref(), &import, &path, pass) {
                    edges.push(ImportEdge {
                        source_workspace: workspace.name.clone(),
                        target_workspace: target,
                        source_file: PathBuf::from(&relative),
                        raw_statement: import.statement.clone(),
                        kind,
                        shared_symbols: import.type_names().map(str::to_string).collect(),
                    });
                }
                imports.push(import.specifier);
            }

            files.insert(relative, FileEntry { language, parsed: true, imports });
        }

        edges.extend(self.project_reference_edges(workspace));
        edges.extend(self.manifest_edges(workspace, &pass.packages));

        (edges, files)
    }

    /// Source files owned by this workspace, in path order
    fn source_files(&self, workspace: &Workspace) -> Vec<PathBuf> {
        let root = &workspace.absolute_path;
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || self.keep_entry(entry, &workspace.name));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(normalize_path(entry.path())),
                Ok(_) => {}
                Err(err) => tracing::debug!("skipping unreadable entry under {}: {}", root.display(), err),
            }
        }

        files
    }

    /// Prune excluded entries and directories owned by a nested workspace
    fn keep_entry(&self, entry: &DirEntry, workspace: &str) -> bool {
        let name = entry.file_name().to_string_lossy();
        let relative = relative_display(entry.path(), self.registry.root_path()).unwrap_or_default();
        if self.exclude.iter().any(|p| p.matches(&name) || p.matches(&relative)) {
            return false;
        }

        if entry.file_type().is_dir() {
            if let Some(owner) = self.registry.resolve_path_to_workspace(entry.path()) {
                return owner == workspace;
            }
        }
        true
    }

    fn read_source(&self, path: &Path) -> Option<String> {
        match fs::metadata(path) {
            Ok(meta) if meta.len() > self.config.max_file_size_bytes => {
                tracing::debug!("skipping {} ({} bytes, over size limit)", path.display(), meta.len());
                return None;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!("skipping {}: {}", path.display(), err);
                return None;
            }
        }

        match fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) => {
                tracing::debug!("skipping {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Resolve one raw import to a target workspace, memoized per pass
    fn resolve_import(
        &self,
        workspace: &Workspace,
        extractor: &dyn ImportExtractor,
        import: &RawImport,
        importing_file: &Path,
        pass: &mut Pass<'_>,
    ) -> Option<(String, EdgeKind)> {
        let language = extractor.language();

        if extractor.is_relative(&import.specifier) {
            let target = extractor.resolve_relative(&import.specifier, importing_file, self.registry.root_path())?;
            let key = (language, workspace.name.clone(), target.to_string_lossy().into_owned());
            if let Some(cached) = pass.memo.get(&key) {
                return cached.clone();
            }

            let resolved = self
                .registry
                .resolve_path_to_workspace(&target)
                .filter(|owner| *owner != workspace.name)
                .map(|owner| (owner, EdgeKind::Relative));
            pass.memo.insert(key, resolved.clone());
            return resolved;
        }

        let key = (language, workspace.name.clone(), import.specifier.clone());
        if let Some(cached) = pass.memo.get(&key) {
            return cached.clone();
        }

        let matches: Vec<&str> = pass
            .packages
            .iter()
            .filter(|(candidate, _)| candidate.name != workspace.name)
            .filter(|(candidate, declared)| {
                package_name_for(language, candidate, declared.as_deref())
                    .is_some_and(|name| extractor.package_match(&import.specifier, name))
            })
            .map(|(candidate, _)| candidate.name.as_str())
            .collect();

        if matches.len() > 1 {
            tracing::info!(
                "import '{}' in {} matches workspaces {:?}; using {}",
                import.specifier,
                workspace.name,
                matches,
                matches[0]
            );
        }

        let resolved = matches
            .first()
            .map(|target| (target.to_string(), extractor.package_edge_kind()));
        pass.memo.insert(key, resolved.clone());
        resolved
    }

    /// Edges from `tsconfig.json` project references
    fn project_reference_edges(&self, workspace: &Workspace) -> Vec<ImportEdge> {
        let references = match TsConfigParser::references_in(&workspace.absolute_path) {
            Ok(refs) => refs,
            Err(err) => {
                handle_error(err);
                return Vec::new();
            }
        };

        references
            .into_iter()
            .filter_map(|reference| {
                let target = self.registry.resolve_path_to_workspace(&normalize_path(&reference))?;
                (target != workspace.name).then(|| ImportEdge {
                    source_workspace: workspace.name.clone(),
                    target_workspace: target.clone(),
                    source_file: PathBuf::from("tsconfig.json"),
                    raw_statement: format!("references: {}", target),
                    kind: EdgeKind::ProjectReference,
                    shared_symbols: BTreeSet::new(),
                })
            })
            .collect()
    }

    /// Edges from dependencies declared in package.json and pyproject.toml
    fn manifest_edges(&self, workspace: &Workspace, packages: &[(&Workspace, Option<String>)]) -> Vec<ImportEdge> {
        let mut edges = Vec::new();

        for dependency in self.registry.declared_dependencies(&workspace.name) {
            let wanted = module_name(&dependency.name);
            let target = packages
                .iter()
                .filter(|(candidate, _)| candidate.name != workspace.name)
                .find(|(_, declared)| {
                    declared
                        .as_deref()
                        .is_some_and(|name| name == dependency.name || module_name(name) == wanted)
                })
                .map(|(candidate, _)| *candidate);

            if let Some(target) = target {
                edges.push(ImportEdge {
                    source_workspace: workspace.name.clone(),
                    target_workspace: target.name.clone(),
                    source_file: PathBuf::from(&dependency.manifest),
                    raw_statement: format!("\"{}\": \"{}\"", dependency.name, dependency.version_spec),
                    kind: EdgeKind::Package,
                    shared_symbols: BTreeSet::new(),
                });
            }
        }

        edges
    }
}
