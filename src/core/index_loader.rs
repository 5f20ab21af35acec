//! Cache-backed access to persisted indexes
//!
//! [`IndexLoader`] reads `PROJECT_INDEX.json` files lazily and keeps them in
//! the five caches of a [`CacheSet`]. A cached index is dropped when the file
//! behind it has a newer modification time than the one last observed.

use crate::core::cache::{BoundedCache, CacheStats};
use crate::core::registry::WorkspaceRegistry;
use crate::models::config::CacheSettings;
use crate::models::index::INDEX_FILE_NAME;
use crate::utils::path_resolver::absolutize;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const ROOT_KEY: &str = "root";

fn workspace_key(name: &str) -> String {
    format!("workspace:{}", name)
}

fn dependencies_key(name: &str) -> String {
    format!("deps:{}", name)
}

fn dependents_key(name: &str) -> String {
    format!("dependents:{}", name)
}

/// The caches shared by every index consumer
pub struct CacheSet {
    /// Path to owning workspace
    pub mapping: BoundedCache<String>,
    pub dependencies: BoundedCache<Vec<String>>,
    pub dependents: BoundedCache<Vec<String>>,
    pub workspace_index: BoundedCache<Arc<Value>>,
    pub root_index: BoundedCache<Arc<Value>>,
}

impl CacheSet {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            mapping: BoundedCache::with_megabytes("mapping", settings.mapping_mb, settings.mapping_entries),
            dependencies: BoundedCache::with_megabytes("dependencies", settings.dependency_mb, settings.dependency_entries),
            dependents: BoundedCache::with_megabytes("dependents", settings.dependency_mb, settings.dependency_entries),
            workspace_index: BoundedCache::with_megabytes(
                "workspace_index",
                settings.workspace_index_mb,
                settings.workspace_index_entries,
            ),
            root_index: BoundedCache::with_megabytes("root_index", settings.root_index_mb, settings.root_index_entries),
        }
    }
}

impl Default for CacheSet {
    fn default() -> Self {
        Self::new(&CacheSettings::default())
    }
}

/// Counters of every cache plus their combined size
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoaderStats {
    pub mapping: CacheStats,
    pub dependencies: CacheStats,
    pub dependents: CacheStats,
    pub workspace_index: CacheStats,
    pub root_index: CacheStats,
    pub total_bytes: usize,
}

/// Lazy, staleness-aware loader for root and workspace indexes
pub struct IndexLoader {
    registry: Arc<dyn WorkspaceRegistry>,
    caches: Arc<CacheSet>,
    /// Last modification time observed per index file
    mtimes: DashMap<PathBuf, SystemTime>,
    default_max_age: Duration,
}

impl IndexLoader {
    pub fn new(registry: Arc<dyn WorkspaceRegistry>, caches: Arc<CacheSet>, default_max_age: Duration) -> Self {
        Self {
            registry,
            caches,
            mtimes: DashMap::new(),
            default_max_age,
        }
    }

    pub fn caches(&self) -> &Arc<CacheSet> {
        &self.caches
    }

    pub fn root_index_path(&self) -> PathBuf {
        self.registry.root_path().join(INDEX_FILE_NAME)
    }

    pub fn workspace_index_path(&self, name: &str) -> Option<PathBuf> {
        self.registry
            .workspace(name)
            .map(|ws| ws.absolute_path.join(INDEX_FILE_NAME))
    }

    /// Root index from cache or disk; `None` when absent or unreadable
    pub fn load_root_index(&self, max_age: Option<Duration>, force_refresh: bool) -> Option<Arc<Value>> {
        let path = self.root_index_path();
        let max_age = max_age.unwrap_or(self.default_max_age);

        if force_refresh || self.is_stale(&path) {
            self.caches.root_index.invalidate(ROOT_KEY);
        } else if let Some(value) = self.caches.root_index.get(ROOT_KEY, max_age) {
            return Some(value);
        }

        let (value, size) = self.read_index(&path)?;
        self.caches.root_index.put(ROOT_KEY, Arc::clone(&value), Some(size));
        Some(value)
    }

    /// Workspace index from cache or disk
    pub fn load_workspace_index(&self, name: &str, max_age: Option<Duration>, force_refresh: bool) -> Option<Arc<Value>> {
        let path = self.workspace_index_path(name)?;
        let key = workspace_key(name);
        let max_age = max_age.unwrap_or(self.default_max_age);

        if force_refresh || self.is_stale(&path) {
            self.caches.workspace_index.invalidate(&key);
        } else if let Some(value) = self.caches.workspace_index.get(&key, max_age) {
            return Some(value);
        }

        let (value, size) = self.read_index(&path)?;
        self.caches.workspace_index.put(key, Arc::clone(&value), Some(size));
        Some(value)
    }

    /// Workspaces `name` depends on, per the root index
    ///
    /// `None` when there is no root index or it does not know the workspace.
    pub fn get_workspace_dependencies(&self, name: &str) -> Option<Vec<String>> {
        let key = dependencies_key(name);
        if let Some(deps) = self.caches.dependencies.get(&key, self.default_max_age) {
            return Some(deps);
        }

        let root = self.load_root_index(None, false)?;
        let deps = dependencies_in(&root, name)?;
        self.caches.dependencies.put(key, deps.clone(), None);
        Some(deps)
    }

    /// Workspaces depending on `name`, per the root index
    pub fn get_workspace_dependents(&self, name: &str) -> Option<Vec<String>> {
        let key = dependents_key(name);
        if let Some(dependents) = self.caches.dependents.get(&key, self.default_max_age) {
            return Some(dependents);
        }

        let root = self.load_root_index(None, false)?;
        let dependents = dependents_in(&root, name)?;
        self.caches.dependents.put(key, dependents.clone(), None);
        Some(dependents)
    }

    /// Owning workspace of a path, through the mapping cache
    pub fn resolve_workspace_for_path(&self, path: &Path) -> Option<String> {
        let absolute = absolutize(path, self.registry.root_path());
        let key = absolute.to_string_lossy().into_owned();

        if let Some(name) = self.caches.mapping.get(&key, self.default_max_age) {
            return Some(name);
        }

        let name = self.registry.resolve_path_to_workspace(&absolute)?;
        self.caches.mapping.put(key, name.clone(), None);
        Some(name)
    }

    /// Drop the cached index, dependencies and dependents of a workspace
    ///
    /// With `cascade`, each workspace depending on `name` is invalidated too,
    /// without further cascading. Returns the number of cache entries removed.
    pub fn invalidate_workspace(&self, name: &str, cascade: bool) -> usize {
        let dependents = if cascade { self.current_dependents(name) } else { Vec::new() };

        let mut removed = self.caches.workspace_index.invalidate(&workspace_key(name))
            + self.caches.dependencies.invalidate(&dependencies_key(name))
            + self.caches.dependents.invalidate(&dependents_key(name));

        if let Some(path) = self.workspace_index_path(name) {
            self.mtimes.remove(&path);
        }

        for dependent in &dependents {
            removed += self.invalidate_workspace(dependent, false);
        }

        tracing::debug!(
            "invalidated {} ({} entries, {} dependents cascaded)",
            name,
            removed,
            dependents.len()
        );
        removed
    }

    /// Drop the root index and everything derived from it
    pub fn invalidate_root_index(&self) -> usize {
        self.mtimes.remove(&self.root_index_path());
        self.caches.root_index.clear()
            + self.caches.dependencies.clear()
            + self.caches.dependents.clear()
            + self.caches.mapping.clear()
    }

    /// Prime the root cache with a freshly written root index
    pub fn remember_root_index(&self, value: Arc<Value>, size: usize) {
        self.caches.dependencies.clear();
        self.caches.dependents.clear();
        self.caches.root_index.put(ROOT_KEY, value, Some(size));

        let path = self.root_index_path();
        if let Some(modified) = modified_time(&path) {
            self.mtimes.insert(path, modified);
        }
    }

    pub fn cache_stats(&self) -> LoaderStats {
        let mut stats = LoaderStats {
            mapping: self.caches.mapping.stats(),
            dependencies: self.caches.dependencies.stats(),
            dependents: self.caches.dependents.stats(),
            workspace_index: self.caches.workspace_index.stats(),
            root_index: self.caches.root_index.stats(),
            total_bytes: 0,
        };
        stats.total_bytes = stats.mapping.bytes
            + stats.dependencies.bytes
            + stats.dependents.bytes
            + stats.workspace_index.bytes
            + stats.root_index.bytes;
        stats
    }

    /// Dependents known right now, without promoting cache entries or filling caches
    fn current_dependents(&self, name: &str) -> Vec<String> {
        if let Some(dependents) = self.caches.dependents.peek(&dependents_key(name)) {
            return dependents;
        }
        if let Some(root) = self.caches.root_index.peek(ROOT_KEY) {
            return dependents_in(&root, name).unwrap_or_default();
        }

        // Root index not cached: consult the persisted copy without caching it
        parse_index(&self.root_index_path())
            .and_then(|(root, _)| dependents_in(&root, name))
            .unwrap_or_default()
    }

    /// Whether the file changed on disk since it was last read
    fn is_stale(&self, path: &Path) -> bool {
        let Some(seen) = self.mtimes.get(path).map(|entry| *entry.value()) else {
            return false;
        };
        match modified_time(path) {
            Some(modified) if modified > seen => {
                tracing::debug!("{} changed on disk, reloading", path.display());
                true
            }
            _ => false,
        }
    }

    /// Parsed index and its size on disk, remembering its mtime
    fn read_index(&self, path: &Path) -> Option<(Arc<Value>, usize)> {
        let (value, size) = parse_index(path)?;
        if let Some(modified) = modified_time(path) {
            self.mtimes.insert(path.to_path_buf(), modified);
        }
        Some((Arc::new(value), size))
    }
}

/// Parsed index and its size on disk; I/O and parse failures are misses
fn parse_index(path: &Path) -> Option<(Value, usize)> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!("index {} not readable: {}", path.display(), err);
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some((value, bytes.len())),
        Err(err) => {
            tracing::debug!("index {} is corrupt: {}", path.display(), err);
            None
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn knows_workspace(root: &Value, name: &str) -> bool {
    root.pointer("/monorepo/workspace_registry")
        .and_then(Value::as_object)
        .is_some_and(|registry| registry.contains_key(name))
}

/// Dependencies of `name` recorded in a root index
pub fn dependencies_in(root: &Value, name: &str) -> Option<Vec<String>> {
    match root.get("cross_workspace_dependencies").and_then(|deps| deps.get(name)) {
        Some(list) => Some(string_list(list)),
        None if knows_workspace(root, name) => Some(Vec::new()),
        None => None,
    }
}

/// Dependents of `name`, inverted from the dependency lists of a root index
pub fn dependents_in(root: &Value, name: &str) -> Option<Vec<String>> {
    let deps = root.get("cross_workspace_dependencies").and_then(Value::as_object);
    let dependents: BTreeSet<String> = deps
        .into_iter()
        .flatten()
        .filter(|(source, targets)| source.as_str() != name && string_list(targets).iter().any(|t| t == name))
        .map(|(source, _)| source.clone())
        .collect();

    if dependents.is_empty() && !knows_workspace(root, name) {
        return None;
    }
    Some(dependents.into_iter().collect())
}
