//! Configuration-related data structures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default infrastructure keywords used when grading cycles
pub const INFRASTRUCTURE_KEYWORDS: &[&str] =
    &["shared", "common", "core", "utils", "types", "api", "base", "lib"];

/// Score added per cycle member whose name contains an infrastructure keyword
pub const KEYWORD_WEIGHT: u32 = 2;
/// Score added per cycle member with more than `HEAVY_DEPENDENT_THRESHOLD` dependents
pub const HEAVY_DEPENDENTS_WEIGHT: u32 = 2;
/// Score added per cycle member with more than `LIGHT_DEPENDENT_THRESHOLD` dependents
pub const LIGHT_DEPENDENTS_WEIGHT: u32 = 1;
pub const HEAVY_DEPENDENT_THRESHOLD: usize = 5;
pub const LIGHT_DEPENDENT_THRESHOLD: usize = 2;
/// Score added per `package` edge inside a cycle
pub const PACKAGE_EDGE_WEIGHT: u32 = 2;
/// Score added per `project_reference` edge inside a cycle
pub const PROJECT_REFERENCE_WEIGHT: u32 = 3;
/// Score added per distinct shared type crossing a cycle
pub const SHARED_TYPE_WEIGHT: u32 = 1;
/// Score added when a cycle has more than `DENSITY_RATIO` edges per member
pub const DENSITY_WEIGHT: u32 = 1;
pub const DENSITY_RATIO: f64 = 1.5;
/// Score at which any cycle is graded high
pub const HIGH_SCORE: u32 = 8;
/// Score at which a non-low cycle is promoted to high (low becomes medium)
pub const ELEVATED_SCORE: u32 = 4;

/// Root index size limit in bytes
pub const ROOT_INDEX_MAX_BYTES: u64 = 200 * 1024;

/// Main configuration settings for crossdeps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Monorepo root directory
    pub root: PathBuf,

    /// Workspace name to root-relative path
    pub workspaces: BTreeMap<String, PathBuf>,

    /// Glob patterns for directories and files to skip while scanning
    pub exclude_patterns: Vec<String>,

    /// Files larger than this are not scanned for imports
    pub max_file_size_bytes: u64,

    /// Whether workspace indexes are built on a thread pool
    pub parallel: bool,

    /// Worker threads for the workspace processor (defaults to the CPU count)
    pub threads: Option<usize>,

    pub cache: CacheSettings,

    pub budgets: BudgetSettings,

    pub severity: SeverityWeights,

    pub compression: CompressionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            workspaces: BTreeMap::new(),
            exclude_patterns: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "target".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
            ],
            max_file_size_bytes: 1024 * 1024,
            parallel: true,
            threads: None,
            cache: CacheSettings::default(),
            budgets: BudgetSettings::default(),
            severity: SeverityWeights::default(),
            compression: CompressionSettings::default(),
        }
    }
}

/// Budgets for the five caches of the index loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub mapping_mb: usize,
    pub mapping_entries: usize,
    pub dependency_mb: usize,
    pub dependency_entries: usize,
    pub workspace_index_mb: usize,
    pub workspace_index_entries: usize,
    pub root_index_mb: usize,
    pub root_index_entries: usize,
    /// Default maximum age of a cached entry, in seconds
    pub max_age_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            mapping_mb: 5,
            mapping_entries: 100,
            dependency_mb: 10,
            dependency_entries: 200,
            workspace_index_mb: 70,
            workspace_index_entries: 50,
            root_index_mb: 5,
            root_index_entries: 10,
            max_age_secs: 3600,
        }
    }
}

/// Size and time limits enforced on the produced indexes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    pub root_index_max_bytes: u64,
    pub root_generation_secs: u64,
    pub workspace_load_secs: u64,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            root_index_max_bytes: ROOT_INDEX_MAX_BYTES,
            root_generation_secs: 30,
            workspace_load_secs: 2,
        }
    }
}

/// Weights of the cycle severity heuristic.
///
/// The defaults are policy values, not a calibrated metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityWeights {
    pub infrastructure_keywords: Vec<String>,
    pub keyword: u32,
    pub heavy_dependents: u32,
    pub light_dependents: u32,
    pub heavy_dependent_threshold: usize,
    pub light_dependent_threshold: usize,
    pub package_edge: u32,
    pub project_reference: u32,
    pub shared_type: u32,
    pub density: u32,
    pub density_ratio: f64,
    pub high_score: u32,
    pub elevated_score: u32,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            infrastructure_keywords: INFRASTRUCTURE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            keyword: KEYWORD_WEIGHT,
            heavy_dependents: HEAVY_DEPENDENTS_WEIGHT,
            light_dependents: LIGHT_DEPENDENTS_WEIGHT,
            heavy_dependent_threshold: HEAVY_DEPENDENT_THRESHOLD,
            light_dependent_threshold: LIGHT_DEPENDENT_THRESHOLD,
            package_edge: PACKAGE_EDGE_WEIGHT,
            project_reference: PROJECT_REFERENCE_WEIGHT,
            shared_type: SHARED_TYPE_WEIGHT,
            density: DENSITY_WEIGHT,
            density_ratio: DENSITY_RATIO,
            high_score: HIGH_SCORE,
            elevated_score: ELEVATED_SCORE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionSettings {
    /// Nesting depth past which compression gives up and falls back
    pub max_depth: usize,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Partial settings for configuration merging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSettings {
    pub root: Option<PathBuf>,
    pub workspaces: Option<BTreeMap<String, PathBuf>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub max_file_size_bytes: Option<u64>,
    pub parallel: Option<bool>,
    pub threads: Option<usize>,
    pub cache: Option<CacheSettings>,
    pub budgets: Option<BudgetSettings>,
    pub severity: Option<SeverityWeights>,
    pub compression: Option<CompressionSettings>,
}

impl PartialSettings {
    /// Merge another PartialSettings into this one
    /// Fields from `other` take precedence over existing fields
    pub fn merge_from(&mut self, other: PartialSettings) {
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.workspaces.is_some() {
            self.workspaces = other.workspaces;
        }
        if other.exclude_patterns.is_some() {
            self.exclude_patterns = other.exclude_patterns;
        }
        if other.max_file_size_bytes.is_some() {
            self.max_file_size_bytes = other.max_file_size_bytes;
        }
        if other.parallel.is_some() {
            self.parallel = other.parallel;
        }
        if other.threads.is_some() {
            self.threads = other.threads;
        }
        if other.cache.is_some() {
            self.cache = other.cache;
        }
        if other.budgets.is_some() {
            self.budgets = other.budgets;
        }
        if other.severity.is_some() {
            self.severity = other.severity;
        }
        if other.compression.is_some() {
            self.compression = other.compression;
        }
    }

    /// Convert partial settings to full settings
    /// Uses defaults for any fields that are None
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();

        if let Some(root) = &self.root {
            settings.root = root.clone();
        }
        if let Some(workspaces) = &self.workspaces {
            settings.workspaces = workspaces.clone();
        }
        if let Some(exclude_patterns) = &self.exclude_patterns {
            settings.exclude_patterns = exclude_patterns.clone();
        }
        if let Some(max_file_size_bytes) = self.max_file_size_bytes {
            settings.max_file_size_bytes = max_file_size_bytes;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel = parallel;
        }
        if let Some(threads) = self.threads {
            settings.threads = Some(threads);
        }
        if let Some(cache) = &self.cache {
            settings.cache = cache.clone();
        }
        if let Some(budgets) = &self.budgets {
            settings.budgets = budgets.clone();
        }
        if let Some(severity) = &self.severity {
            settings.severity = severity.clone();
        }
        if let Some(compression) = &self.compression {
            settings.compression = compression.clone();
        }

        settings
    }
}
