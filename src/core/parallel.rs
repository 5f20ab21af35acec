//! Parallel workspace index generation

use crate::core::analyzer::Analyzer;
use crate::core::budget;
use crate::error::{IndexError, Result};
use crate::parsers::dependency_graph_builder::GraphBuild;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What happened to one workspace
#[derive(Debug)]
enum Outcome {
    Written(PathBuf),
    Failed(IndexError),
    Skipped,
}

/// Result of one processor run
#[derive(Debug, Default)]
pub struct ProcessorReport {
    /// Workspace name to index file written
    pub written: BTreeMap<String, PathBuf>,
    /// Workspace name to the error that stopped it
    pub failed: BTreeMap<String, IndexError>,
    /// Workspaces not started because the run was cancelled
    pub skipped: Vec<String>,
}

impl ProcessorReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Builds and writes workspace indexes on a thread pool
///
/// All workspaces share one graph build and the analyzer's index loader.
pub struct WorkspaceProcessor {
    analyzer: Arc<Analyzer>,
    cancelled: Arc<AtomicBool>,
    threads: usize,
    load_budget: Duration,
}

impl WorkspaceProcessor {
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        let settings = analyzer.settings();
        let threads = if settings.parallel {
            settings.threads.unwrap_or_else(num_cpus::get).max(1)
        } else {
            1
        };
        let load_budget = Duration::from_secs(settings.budgets.workspace_load_secs);

        Self {
            analyzer,
            cancelled: Arc::new(AtomicBool::new(false)),
            threads,
            load_budget,
        }
    }

    /// Flag that stops the run before the next workspace starts
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Index every registered workspace
    pub fn process_all(&self) -> Result<ProcessorReport> {
        let names: Vec<String> = self
            .analyzer
            .registry()
            .list_workspaces()
            .into_iter()
            .map(|ws| ws.name)
            .collect();
        self.process(&names)
    }

    /// Index the named workspaces; failures are collected per workspace
    pub fn process(&self, names: &[String]) -> Result<ProcessorReport> {
        let build = self.analyzer.build_graph();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| IndexError::ParallelExecution {
                message: format!("failed to build thread pool: {}", e),
            })?;

        let outcomes: Vec<(String, Outcome)> = pool.install(|| {
            names
                .par_iter()
                .map(|name| (name.clone(), self.process_one(&build, name)))
                .collect()
        });

        let mut report = ProcessorReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Outcome::Written(path) => {
                    report.written.insert(name, path);
                }
                Outcome::Failed(err) => {
                    tracing::warn!("indexing {} failed: {}", name, err);
                    report.failed.insert(name, err);
                }
                Outcome::Skipped => report.skipped.push(name),
            }
        }

        tracing::info!(
            "workspace indexing: {} written, {} failed, {} skipped",
            report.written.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn process_one(&self, build: &GraphBuild, name: &str) -> Outcome {
        if self.is_cancelled() {
            return Outcome::Skipped;
        }

        let label = format!("workspace {} load", name);
        match budget::timed(&label, self.load_budget, || self.analyzer.write_workspace_index_from(build, name)) {
            Ok(path) => Outcome::Written(path),
            Err(err) => Outcome::Failed(err),
        }
    }
}
