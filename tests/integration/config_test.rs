//! Configuration loaded from disk and environment drives the analysis

use crate::fixtures::monorepo::write;
use crossdeps::{
    config::{load_config, load_config_with_env_prefix, DEFAULT_CONFIG_FILE},
    core::{AnalysisMode, Analyzer, WorkspaceProcessor},
    error::{IndexError, Result},
    models::config::PartialSettings,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_config_file_drives_analysis() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    write(
        root,
        DEFAULT_CONFIG_FILE,
        r#"
            exclude_patterns = ["node_modules", "generated"]

            [workspaces]
            web = "apps/web"
            kit = "libs/kit"

            [severity]
            project_reference = 10
        "#,
    )?;
    write(root, "libs/kit/package.json", r#"{"name": "@acme/kit"}"#)?;
    write(root, "apps/web/src/app.ts", "import { Button } from '@acme/kit';\n")?;
    write(root, "apps/web/generated/client.ts", "import { Ghost } from '@acme/ghost';\n")?;

    let settings = load_config(root)?;
    assert_eq!(settings.workspaces.len(), 2);
    assert_eq!(settings.severity.project_reference, 10);

    let analyzer = Analyzer::new(settings)?;
    let summary = analyzer.analyze(AnalysisMode::RootSummary)?;
    assert_eq!(summary["cross_workspace_dependencies"]["web"], json!(["kit"]));
    assert_eq!(summary["global_stats"]["total_files"], 1);
    Ok(())
}

#[test]
fn test_env_overrides_file() -> Result<()> {
    let dir = tempdir()?;
    write(
        dir.path(),
        DEFAULT_CONFIG_FILE,
        "threads = 8\nparallel = true\n\n[workspaces]\nsolo = \"solo\"\n",
    )?;
    write(dir.path(), "solo/index.js", "export default 1;\n")?;

    let prefix = "CROSSDEPS_IT_ENV_OVERRIDES";
    std::env::set_var(format!("{}_THREADS", prefix), "2");
    let explicit = PartialSettings {
        root: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let settings = load_config_with_env_prefix(explicit, prefix);
    std::env::remove_var(format!("{}_THREADS", prefix));

    let settings = settings?;
    assert_eq!(settings.threads, Some(2));
    assert!(settings.parallel);

    let report = WorkspaceProcessor::new(Arc::new(Analyzer::new(settings)?)).process_all()?;
    assert!(report.is_complete());
    assert_eq!(report.written.len(), 1);
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), DEFAULT_CONFIG_FILE, "[workspaces]\nabs = \"/elsewhere\"\n")?;

    let err = load_config(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::Config { .. }));
    assert!(err.is_critical());
    Ok(())
}

#[test]
fn test_missing_root_is_rejected() {
    let explicit = PartialSettings {
        root: Some("/definitely/not/a/monorepo".into()),
        ..Default::default()
    };
    assert!(load_config_with_env_prefix(explicit, "CROSSDEPS_IT_MISSING_ROOT").is_err());
}
