//! Workspace processor runs: parallel writes, cancellation, per-workspace failures

use crate::fixtures::monorepo::{large_monorepo, settings_for, write};
use crossdeps::{
    core::{AnalysisMode, Analyzer, WorkspaceProcessor},
    error::{IndexError, Result},
    models::INDEX_FILE_NAME,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

#[test]
fn test_parallel_run_writes_all_indexes() -> Result<()> {
    let dir = tempdir()?;
    let mut settings = large_monorepo(dir.path(), 24, 60)?;
    settings.threads = Some(4);
    let analyzer = Arc::new(Analyzer::new(settings)?);

    let report = WorkspaceProcessor::new(Arc::clone(&analyzer)).process_all()?;

    assert!(report.is_complete());
    assert_eq!(report.written.len(), 24);
    for (name, path) in &report.written {
        assert_eq!(path, &dir.path().join(name).join(INDEX_FILE_NAME));
        assert!(path.is_file());
    }

    let summary = analyzer.analyze(AnalysisMode::RootSummary)?;
    assert_eq!(summary["global_stats"]["indexed_workspaces"], 24);
    Ok(())
}

#[test]
fn test_sequential_and_parallel_runs_agree() -> Result<()> {
    let dir = tempdir()?;
    let settings = large_monorepo(dir.path(), 12, 30)?;

    let mut sequential = settings.clone();
    sequential.parallel = false;
    WorkspaceProcessor::new(Arc::new(Analyzer::new(sequential)?)).process_all()?;
    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("ws-000").join(INDEX_FILE_NAME))?)?;

    WorkspaceProcessor::new(Arc::new(Analyzer::new(settings)?)).process_all()?;
    let second: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("ws-000").join(INDEX_FILE_NAME))?)?;

    assert_eq!(first["workspace"], second["workspace"]);
    assert_eq!(first["dependency_graph"], second["dependency_graph"]);
    Ok(())
}

#[test]
fn test_concurrent_root_index_writes() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Arc::new(Analyzer::new(large_monorepo(dir.path(), 8, 16)?)?);
    WorkspaceProcessor::new(Arc::clone(&analyzer)).process_all()?;

    thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                let analyzer = &analyzer;
                scope.spawn(move || (0..5).try_for_each(|_| analyzer.generate_root_index().map(|_| ())))
            })
            .collect();
        for worker in workers {
            assert!(worker.join().unwrap().is_ok());
        }
    });

    let root: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join(INDEX_FILE_NAME))?)?;
    assert_eq!(root["global_stats"]["indexed_workspaces"], 8);
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
    Ok(())
}

#[test]
fn test_cancel_before_start_skips_everything() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Arc::new(Analyzer::new(large_monorepo(dir.path(), 6, 5)?)?);

    let processor = WorkspaceProcessor::new(analyzer);
    processor.cancel();
    let report = processor.process_all()?;

    assert!(report.written.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(report.skipped.len(), 6);
    assert!(!report.is_complete());
    assert!(!dir.path().join("ws-000").join(INDEX_FILE_NAME).exists());
    Ok(())
}

#[test]
fn test_cancel_from_another_thread() -> Result<()> {
    let dir = tempdir()?;
    let mut settings = large_monorepo(dir.path(), 40, 80)?;
    settings.threads = Some(1);
    let processor = WorkspaceProcessor::new(Arc::new(Analyzer::new(settings)?));

    let handle = processor.cancel_handle();
    let canceller = thread::spawn(move || handle.store(true, Ordering::SeqCst));
    let report = processor.process_all()?;
    canceller.join().unwrap();

    assert!(processor.is_cancelled());
    assert!(report.failed.is_empty());
    assert_eq!(report.written.len() + report.skipped.len(), 40);
    Ok(())
}

#[test]
fn test_failing_workspace_does_not_stop_others() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write(root, "good/package.json", r#"{"name": "good"}"#)?;
    write(root, "good/index.js", "export const ok = true;\n")?;
    write(root, "other/index.js", "import g from 'good';\n")?;

    let settings = settings_for(root, &[("good", "good"), ("other", "other"), ("ghost", "not/created")]);
    let report = WorkspaceProcessor::new(Arc::new(Analyzer::new(settings)?)).process_all()?;

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed["ghost"], IndexError::OutputWrite { .. }));
    assert!(report.skipped.is_empty());
    Ok(())
}
