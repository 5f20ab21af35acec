//! End-to-end analysis of small monorepos on disk

use crate::fixtures::monorepo::{app_shared_legacy, settings_for, write};
use crossdeps::{
    core::{AnalysisMode, Analyzer, WorkspaceProcessor},
    error::Result,
    models::{EdgeKind, INDEX_FILE_NAME},
};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_app_shared_legacy_graph() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Analyzer::new(app_shared_legacy(dir.path())?)?;

    let build = analyzer.build_graph();
    let graph = &build.graph;

    assert_eq!(graph.nodes.len(), 3);
    let names = |set: &std::collections::BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>();
    assert_eq!(names(&graph.nodes["app"].imports_from), vec!["shared"]);
    assert_eq!(names(&graph.nodes["shared"].imported_by), vec!["app"]);
    assert_eq!(names(&graph.nodes["legacy"].imports_from), vec!["app"]);
    assert_eq!(names(&graph.nodes["app"].imported_by), vec!["legacy"]);
    assert!(graph.nodes["shared"].imports_from.is_empty());
    assert!(graph.nodes["legacy"].imported_by.is_empty());

    let kinds: Vec<EdgeKind> = build.workspace_imports["app"].iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EdgeKind::Package, EdgeKind::Package]);
    assert_eq!(build.workspace_imports["legacy"][0].kind, EdgeKind::Relative);
    assert_eq!(build.workspace_imports["legacy"][0].target_workspace, "app");

    let shared_types = graph.shared_types_by_pair();
    let app_shared = &shared_types["app -> shared"];
    assert!(app_shared.contains("User") && app_shared.contains("Session"));
    assert!(!app_shared.contains("formatUser"));

    assert!(analyzer.detect_cycles(graph).is_empty());
    Ok(())
}

#[test]
fn test_graph_invariants() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Analyzer::new(app_shared_legacy(dir.path())?)?;
    let graph = analyzer.build_graph().graph;

    for (name, node) in &graph.nodes {
        assert!(!node.imports_from.contains(name), "self edge on {}", name);
        for target in &node.imports_from {
            let target_node = graph.nodes.get(target).expect("no dangling targets");
            assert!(target_node.imported_by.contains(name));
        }
        for source in &node.imported_by {
            assert!(graph.nodes[source].imports_from.contains(name));
        }
    }
    for edge in &graph.edges {
        assert_ne!(edge.source_workspace, edge.target_workspace);
    }
    Ok(())
}

#[test]
fn test_root_index_persisted() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Analyzer::new(app_shared_legacy(dir.path())?)?;

    let summary = analyzer.generate_root_index()?;
    let on_disk: Value = serde_json::from_str(&fs::read_to_string(dir.path().join(INDEX_FILE_NAME))?)?;

    assert_eq!(summary, on_disk);
    assert_eq!(on_disk["dependency_summary"]["circular_count"], 0);
    assert_eq!(on_disk["cross_workspace_dependencies"]["legacy"], json!(["app"]));
    assert_eq!(on_disk["cross_workspace_dependencies"]["app"], json!(["shared"]));
    assert_eq!(on_disk["monorepo"]["total_workspaces"], 3);
    assert_eq!(on_disk["project_structure"], json!({"type": "workspace_overview"}));
    assert!(on_disk.get("files").is_none());
    Ok(())
}

#[test]
fn test_processor_writes_every_workspace() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = Arc::new(Analyzer::new(app_shared_legacy(dir.path())?)?);

    let report = WorkspaceProcessor::new(Arc::clone(&analyzer)).process_all()?;
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 3);

    let app: Value = serde_json::from_str(&fs::read_to_string(dir.path().join("packages/app").join(INDEX_FILE_NAME))?)?;
    assert_eq!(app["workspace"]["package_name"], "@acme/app");
    assert_eq!(app["stats"]["total_files"], 2);
    assert!(app["files"].get("src/main.tsx").is_some());
    assert_eq!(app["files"]["src/main.tsx"]["language"], "typescript");

    let summary = analyzer.analyze(AnalysisMode::RootSummary)?;
    assert_eq!(summary["global_stats"]["indexed_workspaces"], 3);
    Ok(())
}

#[test]
fn test_declared_edges_and_python() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write(root, "ts/types/tsconfig.json", r#"{"compilerOptions": {"composite": true}}"#)?;
    write(
        root,
        "ts/web/tsconfig.json",
        "{\n  /* build graph */\n  \"references\": [{ \"path\": \"../types\" }] // types first\n}\n",
    )?;
    write(root, "ts/ui/package.json", r#"{"name": "@acme/ui"}"#)?;
    write(root, "ts/web/package.json", r#"{"name": "@acme/web", "peerDependencies": {"@acme/ui": "*"}}"#)?;
    write(root, "py/models/pyproject.toml", "[project]\nname = \"acme-models\"\n")?;
    write(
        root,
        "py/api/pyproject.toml",
        "[project]\nname = \"acme-api\"\ndependencies = [\"acme-models>=0.1\"]\n",
    )?;
    write(root, "py/api/app.py", "from acme_models.user import User\nfrom ..worker import jobs\n")?;
    write(root, "py/worker/jobs.py", "import os\n")?;

    let settings = settings_for(
        root,
        &[
            ("types", "ts/types"),
            ("web", "ts/web"),
            ("ui", "ts/ui"),
            ("models", "py/models"),
            ("api", "py/api"),
            ("worker", "py/worker"),
        ],
    );
    let build = Analyzer::new(settings)?.build_graph();

    let web: Vec<_> = build.workspace_imports["web"]
        .iter()
        .map(|e| (e.target_workspace.as_str(), e.kind))
        .collect();
    assert!(web.contains(&("types", EdgeKind::ProjectReference)));
    assert!(web.contains(&("ui", EdgeKind::Package)));

    let api: Vec<_> = build.workspace_imports["api"]
        .iter()
        .map(|e| (e.target_workspace.as_str(), e.kind))
        .collect();
    assert!(api.contains(&("models", EdgeKind::Direct)));
    assert!(api.contains(&("worker", EdgeKind::Relative)));
    assert!(api.contains(&("models", EdgeKind::Package)));
    Ok(())
}

#[test]
fn test_malformed_manifests_do_not_abort() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write(root, "a/package.json", "{ \"name\": ")?;
    write(root, "a/tsconfig.json", "{ \"references\": [ ")?;
    write(root, "b/pyproject.toml", "[project\nname =")?;
    write(root, "b/main.py", "from a import thing\n")?;

    let analyzer = Analyzer::new(settings_for(root, &[("a", "a"), ("b", "b")]))?;
    let build = analyzer.build_graph();

    // `a` has no usable name, so Python falls back to the workspace name
    assert_eq!(build.graph.dependencies("b").unwrap().len(), 1);
    assert!(analyzer.analyze(AnalysisMode::RootSummary).is_ok());
    Ok(())
}

#[test]
fn test_three_workspace_cycle_reported() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    for (name, dep) in [("alpha", "beta"), ("beta", "gamma"), ("gamma", "alpha")] {
        write(root, &format!("{}/package.json", name), &format!(r#"{{"name": "{}"}}"#, name))?;
        write(root, &format!("{}/index.ts", name), &format!("import {{ Model }} from '{}';\n", dep))?;
    }

    let analyzer = Analyzer::new(settings_for(root, &[("alpha", "alpha"), ("beta", "beta"), ("gamma", "gamma")]))?;
    let detail = analyzer.analyze(AnalysisMode::FullDetail)?;

    let cycles = detail["cycles"].as_array().unwrap();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0]["cycle"], json!(["alpha", "beta", "gamma", "alpha"]));
    assert_eq!(cycles[0]["contributing_edges"].as_array().unwrap().len(), 3);
    assert_eq!(detail["shared_types"]["alpha -> beta"], json!(["Model"]));
    Ok(())
}
