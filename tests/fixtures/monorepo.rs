//! Monorepo fixtures built on disk

use crossdeps::{error::Result, models::config::Settings};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Route crate logs to the test output; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crossdeps=info")))
        .with_test_writer()
        .try_init();
}

/// Write `content` to `root/rel`, creating parent directories
pub fn write(root: &Path, rel: &str, content: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Settings for `root` with the given `(name, path)` workspaces
pub fn settings_for(root: &Path, workspaces: &[(&str, &str)]) -> Settings {
    let mut settings = Settings::default();
    settings.root = root.to_path_buf();
    settings.workspaces = workspaces
        .iter()
        .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
        .collect();
    settings
}

/// `app`, `shared` and `legacy`: app imports shared by package name, legacy
/// reaches into app by relative path, nothing imports back.
pub fn app_shared_legacy(root: &Path) -> Result<Settings> {
    init_tracing();
    write(root, "packages/shared/package.json", r#"{"name": "@acme/shared", "version": "1.0.0"}"#)?;
    write(
        root,
        "packages/shared/src/index.ts",
        "export interface User { id: string }\nexport interface Session { user: User }\nexport const VERSION = '1';\n",
    )?;
    write(
        root,
        "packages/app/package.json",
        r#"{"name": "@acme/app", "dependencies": {"@acme/shared": "workspace:*", "react": "^18.0.0"}}"#,
    )?;
    write(
        root,
        "packages/app/src/main.tsx",
        "import React from 'react';\nimport { User, Session, formatUser } from '@acme/shared';\nimport { local } from './local';\n",
    )?;
    write(root, "packages/app/src/local.ts", "export const local = 1;\n")?;
    write(root, "packages/app/node_modules/@acme/shared/index.js", "import '@acme/app';\n")?;
    write(root, "packages/legacy/lib/index.js", "const { local } = require('../../app/src/local');\n")?;

    Ok(settings_for(
        root,
        &[("app", "packages/app"), ("shared", "packages/shared"), ("legacy", "packages/legacy")],
    ))
}

/// `count` distinct acyclic `(from, to)` pairs over `n` nodes, `from < to`
pub fn dag_edges(n: usize, count: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(count);
    for distance in 1..n {
        for from in 0..n - distance {
            if edges.len() == count {
                return edges;
            }
            edges.push((from, from + distance));
        }
    }
    edges
}

/// `n` JavaScript workspaces `ws-000..` wired by `count` package imports
pub fn large_monorepo(root: &Path, n: usize, count: usize) -> Result<Settings> {
    init_tracing();
    let name = |i: usize| format!("ws-{:03}", i);
    let mut sources = vec![String::new(); n];
    for (from, to) in dag_edges(n, count) {
        sources[from].push_str(&format!("import m{} from '{}';\n", to, name(to)));
    }

    let mut workspaces = Vec::with_capacity(n);
    for (i, source) in sources.iter().enumerate() {
        let ws = name(i);
        write(root, &format!("{}/package.json", ws), &format!(r#"{{"name": "{}"}}"#, ws))?;
        write(root, &format!("{}/index.js", ws), source)?;
        workspaces.push(ws);
    }

    let pairs: Vec<(&str, &str)> = workspaces.iter().map(|ws| (ws.as_str(), ws.as_str())).collect();
    Ok(settings_for(root, &pairs))
}
