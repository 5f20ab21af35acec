//! Bounded, cycle-safe index serialization
//!
//! Converts a [`Document`] into plain JSON, keeping only what each index kind
//! needs. Shared nodes re-entered while still being visited are replaced by
//! `null` and counted. Nesting past the configured depth is an error in the
//! strict path; the fallback path truncates instead, so a pass never aborts
//! on a malformed document.

use crate::error::{IndexError, Result};
use crate::models::config::Settings;
use crate::models::document::Document;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Instant;

/// Top-level keys a compressed root index may carry
pub const ROOT_FIELDS: &[&str] = &[
    "indexed_at",
    "root",
    "index_type",
    "monorepo",
    "cross_workspace_dependencies",
    "circular_dependencies",
    "dependency_summary",
    "global_stats",
    "project_structure",
];

/// Top-level keys a compressed workspace index may carry
pub const WORKSPACE_FIELDS: &[&str] = &["indexed_at", "root", "index_type", "workspace", "stats", "files", "dependency_graph"];

const PARSED_FILE_FIELDS: &[&str] = &["imports", "functions", "classes", "constants"];

/// Counters accumulated across every compression run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompressionStats {
    /// Arrays and objects converted
    pub objects_processed: u64,
    /// Shared nodes re-entered while being visited
    pub cycles_detected: u64,
    /// Bytes saved relative to the uncompressed document, last run
    pub compression_ratio: f64,
    pub processing_time_ms: u64,
}

/// Depth-limited conversion with a visiting stack of shared nodes
struct Walk {
    max_depth: usize,
    /// Fail on excessive depth instead of truncating
    strict: bool,
    visiting: Vec<usize>,
    objects: u64,
    cycles: u64,
}

impl Walk {
    fn new(max_depth: usize, strict: bool) -> Self {
        Self {
            max_depth,
            strict,
            visiting: Vec::new(),
            objects: 0,
            cycles: 0,
        }
    }

    fn convert(&mut self, doc: &Document, depth: usize) -> Result<Value> {
        if depth > self.max_depth {
            if self.strict {
                return Err(IndexError::compression_error(format!(
                    "document nested deeper than {} levels",
                    self.max_depth
                )));
            }
            return Ok(Value::Null);
        }

        Ok(match doc {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(*b),
            Document::Number(n) => Value::Number(n.clone()),
            Document::String(s) => Value::String(s.clone()),
            Document::Array(items) => {
                self.objects += 1;
                Value::Array(
                    items
                        .iter()
                        .map(|item| self.convert(item, depth + 1))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            Document::Object(map) => {
                self.objects += 1;
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.convert(value, depth + 1)?);
                }
                Value::Object(out)
            }
            Document::Shared(node) => {
                let id = Document::node_id(node);
                if self.visiting.contains(&id) {
                    self.cycles += 1;
                    tracing::warn!("reference cycle in index document at depth {}, replaced by null", depth);
                    return Ok(Value::Null);
                }

                self.visiting.push(id);
                let result = self.convert(&node.read(), depth);
                self.visiting.pop();
                result?
            }
        })
    }
}

fn serialized_len(value: &Value) -> u64 {
    serde_json::to_vec(value).map_or(0, |bytes| bytes.len() as u64)
}

fn pick(source: &Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|key| source.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect()
}

/// Compresses root and workspace index documents
pub struct IndexCompressor {
    max_depth: usize,
    root_budget_bytes: u64,
    stats: Mutex<CompressionStats>,
}

impl IndexCompressor {
    pub fn new(max_depth: usize, root_budget_bytes: u64) -> Self {
        Self {
            max_depth,
            root_budget_bytes,
            stats: Mutex::new(CompressionStats::default()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.compression.max_depth, settings.budgets.root_index_max_bytes)
    }

    pub fn stats(&self) -> CompressionStats {
        self.stats.lock().clone()
    }

    /// Cycle-safe plain JSON copy; fails past the depth limit
    pub fn to_value(&self, doc: &Document) -> Result<Value> {
        let mut walk = Walk::new(self.max_depth, true);
        let result = walk.convert(doc, 0);
        self.record(&walk);
        result
    }

    /// Cycle-safe plain JSON copy truncated at the depth limit; never fails
    pub fn to_value_lossy(&self, doc: &Document) -> Value {
        let mut walk = Walk::new(self.max_depth, false);
        let value = walk.convert(doc, 0).unwrap_or(Value::Null);
        self.record(&walk);
        value
    }

    /// Essential root summary, reduced further when over the size budget
    pub fn compress_root(&self, data: &Document) -> Result<Value> {
        let start = Instant::now();
        let value = self.to_value(data)?;
        let Value::Object(index) = &value else {
            return Err(IndexError::compression_error("root index is not an object"));
        };

        let mut compressed = Self::root_essentials(index);
        if serialized_len(&Value::Object(compressed.clone())) > self.root_budget_bytes {
            tracing::debug!("root index over {} bytes, dropping optional fields", self.root_budget_bytes);
            Self::reduce_root(&mut compressed);
        }

        let compressed = Value::Object(compressed);
        self.finish(start, &value, &compressed);
        Ok(compressed)
    }

    /// Workspace index with per-file detail trimmed to what is meaningful
    pub fn compress_workspace(&self, data: &Document) -> Result<Value> {
        let start = Instant::now();
        let value = self.to_value(data)?;
        let Value::Object(index) = &value else {
            return Err(IndexError::compression_error("workspace index is not an object"));
        };

        let mut compressed = pick(index, WORKSPACE_FIELDS);
        if let Some(Value::Object(files)) = compressed.get_mut("files") {
            for entry in files.values_mut() {
                if let Value::Object(file) = entry {
                    *file = Self::compress_file_entry(file);
                }
            }
        }
        if let Some(Value::Object(graph)) = compressed.get_mut("dependency_graph") {
            *graph = without_self_references(graph);
        }

        let compressed = Value::Object(compressed);
        self.finish(start, &value, &compressed);
        Ok(compressed)
    }

    /// [`Self::compress_root`], falling back to a truncated whitelist copy
    /// and finally the lossy uncompressed document
    pub fn compress_root_or_fallback(&self, data: &Document) -> Value {
        self.compress_with_fallback(data, ROOT_FIELDS, |doc| self.compress_root(doc))
    }

    /// [`Self::compress_workspace`] with the same fallback chain
    pub fn compress_workspace_or_fallback(&self, data: &Document) -> Value {
        self.compress_with_fallback(data, WORKSPACE_FIELDS, |doc| self.compress_workspace(doc))
    }

    fn compress_with_fallback<F>(&self, data: &Document, fields: &[&str], compress: F) -> Value
    where
        F: Fn(&Document) -> Result<Value>,
    {
        let err = match compress(data) {
            Ok(value) => return value,
            Err(err) => err,
        };
        tracing::warn!("compression failed ({}), using truncated copy", err);

        match self.to_value_lossy(data) {
            Value::Object(index) => Value::Object(pick(&index, fields)),
            other => {
                tracing::warn!("index document is not an object, storing it uncompressed");
                other
            }
        }
    }

    fn root_essentials(index: &Map<String, Value>) -> Map<String, Value> {
        let mut out = pick(index, &["indexed_at", "root", "index_type"]);

        if let Some(Value::Object(monorepo)) = index.get("monorepo") {
            let mut reduced = pick(monorepo, &["enabled", "tool", "total_workspaces"]);
            if let Some(Value::Object(registry)) = monorepo.get("workspace_registry") {
                let entries = registry
                    .iter()
                    .map(|(name, entry)| {
                        let kept = match entry {
                            Value::Object(entry) => Value::Object(pick(entry, &["path", "index_path", "status"])),
                            other => other.clone(),
                        };
                        (name.clone(), kept)
                    })
                    .collect();
                reduced.insert("workspace_registry".to_string(), Value::Object(entries));
            }
            out.insert("monorepo".to_string(), Value::Object(reduced));
        }

        if let Some(Value::Object(deps)) = index.get("cross_workspace_dependencies") {
            let mut kept = without_self_references(deps);
            kept.retain(|_, targets| !matches!(targets, Value::Array(items) if items.is_empty()));
            out.insert("cross_workspace_dependencies".to_string(), Value::Object(kept));
        }

        if let Some(Value::Array(cycles)) = index.get("circular_dependencies") {
            let kept = cycles
                .iter()
                .filter(|cycle| matches!(cycle.get("severity").and_then(Value::as_str), Some("high" | "medium")))
                .cloned()
                .collect();
            out.insert("circular_dependencies".to_string(), Value::Array(kept));
        }

        for key in ["dependency_summary", "global_stats"] {
            if let Some(value) = index.get(key) {
                out.insert(key.to_string(), value.clone());
            }
        }

        if let Some(Value::Object(structure)) = index.get("project_structure") {
            out.insert("project_structure".to_string(), Value::Object(pick(structure, &["type"])));
        }

        out
    }

    fn reduce_root(index: &mut Map<String, Value>) {
        index.remove("project_structure");

        if let Some(Value::Object(registry)) = index
            .get_mut("monorepo")
            .and_then(|monorepo| monorepo.get_mut("workspace_registry"))
        {
            for entry in registry.values_mut() {
                if let Value::Object(fields) = entry {
                    *fields = pick(fields, &["path", "status"]);
                }
            }
        }
    }

    fn compress_file_entry(file: &Map<String, Value>) -> Map<String, Value> {
        let mut out = pick(file, &["language", "parsed"]);

        if let Some(Value::String(purpose)) = file.get("purpose") {
            if !purpose.is_empty() && purpose != "unknown" {
                out.insert("purpose".to_string(), Value::String(purpose.clone()));
            }
        }

        if file.get("parsed").and_then(Value::as_bool).unwrap_or(false) {
            for key in PARSED_FILE_FIELDS {
                match file.get(*key) {
                    Some(Value::Array(items)) if items.is_empty() => {}
                    Some(Value::Object(map)) if map.is_empty() => {}
                    Some(Value::Null) | None => {}
                    Some(value) => {
                        out.insert(key.to_string(), value.clone());
                    }
                }
            }
        }

        out
    }

    fn record(&self, walk: &Walk) {
        let mut stats = self.stats.lock();
        stats.objects_processed += walk.objects;
        stats.cycles_detected += walk.cycles;
    }

    fn finish(&self, start: Instant, original: &Value, compressed: &Value) {
        let before = serialized_len(original);
        let after = serialized_len(compressed);

        let mut stats = self.stats.lock();
        if before > 0 {
            stats.compression_ratio = (before as f64 - after as f64) / before as f64;
        }
        stats.processing_time_ms += start.elapsed().as_millis() as u64;
    }
}

impl Default for IndexCompressor {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Copy of an adjacency map with every `node -> node` entry removed
fn without_self_references(graph: &Map<String, Value>) -> Map<String, Value> {
    graph
        .iter()
        .map(|(node, targets)| {
            let kept = match targets {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .filter(|target| target.as_str() != Some(node.as_str()))
                        .cloned()
                        .collect(),
                ),
                other => other.clone(),
            };
            (node.clone(), kept)
        })
        .collect()
}
