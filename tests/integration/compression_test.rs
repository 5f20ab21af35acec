//! Index compression against large and malformed documents

use crate::fixtures::monorepo::{dag_edges, large_monorepo};
use crossdeps::{
    core::{AnalysisMode, Analyzer, IndexCompressor},
    error::{IndexError, Result},
    models::Document,
};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_large_monorepo_root_summary_fits_budget() -> Result<()> {
    let dir = tempdir()?;
    let settings = large_monorepo(dir.path(), 500, 10_000)?;
    let budget = settings.budgets.root_index_max_bytes;
    let analyzer = Analyzer::new(settings)?;

    let summary = analyzer.analyze(AnalysisMode::RootSummary)?;
    let size = serde_json::to_vec(&summary)?.len() as u64;

    assert!(size <= 200 * 1024, "root summary is {} bytes", size);
    assert!(size <= budget);
    assert_eq!(summary["dependency_summary"]["total_workspaces"], 500);
    assert_eq!(summary["dependency_summary"]["total_edges"], 10_000);
    assert_eq!(summary["dependency_summary"]["circular_count"], 0);
    assert!(summary.get("files").is_none());
    Ok(())
}

#[test]
fn test_dag_fixture_shape() {
    let edges = dag_edges(10, 12);
    assert_eq!(edges.len(), 12);
    assert!(edges.iter().all(|(from, to)| from < to));
    assert_eq!(edges[0], (0, 1));
    assert_eq!(edges[9], (0, 2));
}

#[test]
fn test_root_size_budget_exceeded() -> Result<()> {
    let dir = tempdir()?;
    let mut settings = large_monorepo(dir.path(), 40, 120)?;
    settings.budgets.root_index_max_bytes = 2048;

    let err = Analyzer::new(settings)?.analyze(AnalysisMode::RootSummary).unwrap_err();
    assert!(matches!(err, IndexError::BudgetExceeded { threshold: 2048, .. }));
    assert!(err.is_critical());
    Ok(())
}

#[test]
fn test_self_referential_workspace_document() -> Result<()> {
    let compressor = IndexCompressor::new(32, 200 * 1024);

    let mut index = Document::shared(Document::from(json!({
        "index_type": "workspace",
        "workspace": {"name": "loop"},
        "files": {"a.js": {"language": "javascript", "parsed": true, "imports": ["b"]}},
    })));
    let alias = index.clone();
    assert!(index.insert("parent", alias));

    let compressed = compressor.compress_workspace(&index)?;

    assert_eq!(compressed["workspace"]["name"], "loop");
    assert_eq!(compressed["files"]["a.js"]["imports"], json!(["b"]));
    assert!(compressed.get("parent").is_none());
    assert_eq!(compressor.stats().cycles_detected, 1);
    Ok(())
}

#[test]
fn test_deep_document_falls_back_to_truncated_copy() {
    let compressor = IndexCompressor::new(8, 200 * 1024);

    let mut deep = json!("leaf");
    for _ in 0..20 {
        deep = json!({ "next": deep });
    }
    let document = Document::from(json!({
        "index_type": "workspace",
        "workspace": {"name": "deep"},
        "files": {"a.js": {"language": "javascript", "parsed": true, "extra": deep}},
        "scratch": "dropped",
    }));

    assert!(matches!(
        compressor.compress_workspace(&document),
        Err(IndexError::Compression { .. })
    ));

    let fallback = compressor.compress_workspace_or_fallback(&document);
    assert_eq!(fallback["workspace"]["name"], "deep");
    assert!(fallback.get("scratch").is_none());

    let mut node = &fallback["files"]["a.js"]["extra"];
    let mut levels = 0;
    while let Some(next) = node.get("next") {
        node = next;
        levels += 1;
    }
    assert!(levels < 20);
    assert!(node.is_null());
}

#[test]
fn test_non_object_document_kept_as_is() {
    let compressor = IndexCompressor::default();
    let document = Document::from(json!(["not", "an", "index"]));

    assert!(compressor.compress_root(&document).is_err());
    assert_eq!(compressor.compress_root_or_fallback(&document), json!(["not", "an", "index"]));
}
