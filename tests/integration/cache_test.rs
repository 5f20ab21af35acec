//! Caching and invalidation through the public analyzer API

use crate::fixtures::monorepo::{settings_for, write};
use crossdeps::{
    core::{Analyzer, BoundedCache, WorkspaceProcessor},
    error::Result,
    models::INDEX_FILE_NAME,
};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

/// `a -> b -> c`, every workspace indexed and the root index written
fn chain(root: &Path) -> Result<Arc<Analyzer>> {
    for (name, dep) in [("a", Some("b")), ("b", Some("c")), ("c", None)] {
        write(root, &format!("{}/package.json", name), &format!(r#"{{"name": "{}"}}"#, name))?;
        let source = dep.map_or_else(|| "export const c = 1;\n".to_string(), |dep| format!("import x from '{}';\n", dep));
        write(root, &format!("{}/index.js", name), &source)?;
    }

    let analyzer = Arc::new(Analyzer::new(settings_for(root, &[("a", "a"), ("b", "b"), ("c", "c")]))?);
    WorkspaceProcessor::new(Arc::clone(&analyzer)).process_all()?;
    analyzer.generate_root_index()?;
    Ok(analyzer)
}

#[test]
fn test_cascade_is_one_hop() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = chain(dir.path())?;
    let loader = analyzer.loader();

    for name in ["a", "b", "c"] {
        assert!(loader.load_workspace_index(name, None, false).is_some());
        analyzer.get_dependencies(name)?;
    }
    let caches = loader.caches();
    assert_eq!(caches.workspace_index.len(), 3);
    assert_eq!(caches.dependencies.len(), 3);

    let removed = analyzer.invalidate("c", true);

    assert_eq!(removed, 4);
    assert_eq!(caches.workspace_index.len(), 1);
    assert_eq!(caches.dependencies.len(), 1);
    assert_eq!(analyzer.get_dependencies("a")?, vec!["b".to_string()]);
    assert_eq!(caches.dependencies.stats().hits, 1);
    Ok(())
}

#[test]
fn test_fresh_analyzer_cascades_from_persisted_root() -> Result<()> {
    let dir = tempdir()?;
    chain(dir.path())?;
    let analyzer = Analyzer::new(settings_for(dir.path(), &[("a", "a"), ("b", "b"), ("c", "c")]))?;
    let loader = analyzer.loader();

    for name in ["a", "b", "c"] {
        assert!(loader.load_workspace_index(name, None, false).is_some());
    }
    let caches = loader.caches();
    assert!(caches.root_index.is_empty());

    analyzer.invalidate("c", true);

    assert!(!caches.workspace_index.contains("workspace:c"));
    assert!(!caches.workspace_index.contains("workspace:b"));
    assert!(caches.workspace_index.contains("workspace:a"));
    assert!(caches.root_index.is_empty());
    Ok(())
}

#[test]
fn test_dependents_query() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = chain(dir.path())?;

    assert_eq!(analyzer.get_dependents("c")?, vec!["b".to_string()]);
    assert!(analyzer.get_dependents("a")?.is_empty());
    assert!(analyzer.get_dependents("missing").is_err());
    Ok(())
}

#[test]
fn test_stale_workspace_index_is_reloaded() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = chain(dir.path())?;
    let loader = analyzer.loader();

    let first = loader.load_workspace_index("b", None, false).unwrap();
    assert_eq!(first["workspace"]["name"], "b");

    let path = dir.path().join("b").join(INDEX_FILE_NAME);
    fs::write(&path, r#"{"workspace": {"name": "rewritten"}}"#)?;
    File::options()
        .write(true)
        .open(&path)?
        .set_modified(SystemTime::now() + Duration::from_secs(60))?;

    let second = loader.load_workspace_index("b", None, false).unwrap();
    assert_eq!(second["workspace"]["name"], "rewritten");
    Ok(())
}

#[test]
fn test_concurrent_loader_access() -> Result<()> {
    let dir = tempdir()?;
    let analyzer = chain(dir.path())?;
    let nested = dir.path().join("b/src/deep/file.js");

    thread::scope(|scope| {
        for worker in 0..8 {
            let analyzer = &analyzer;
            let nested = &nested;
            scope.spawn(move || {
                for round in 0..50 {
                    let loader = analyzer.loader();
                    assert_eq!(loader.resolve_workspace_for_path(nested).as_deref(), Some("b"));
                    assert_eq!(loader.get_workspace_dependencies("b"), Some(vec!["c".to_string()]));
                    assert!(loader.load_workspace_index("a", None, false).is_some());
                    if (worker + round) % 7 == 0 {
                        analyzer.invalidate("c", true);
                    }
                }
            });
        }
    });

    let stats = analyzer.loader().cache_stats();
    assert!(stats.mapping.hits > 0);
    assert!(stats.total_bytes > 0);
    Ok(())
}

#[test]
fn test_bounded_cache_shared_across_threads() {
    let cache: Arc<BoundedCache<Vec<String>>> = Arc::new(BoundedCache::new("shared", 64 * 1024, 32));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("{}:{}", t, i % 40);
                    cache.put(key.clone(), vec![key.clone()], None);
                    if let Some(value) = cache.get(&key, Duration::from_secs(60)) {
                        assert_eq!(value, vec![key]);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert!(cache.len() <= 32);
    assert!(stats.evictions > 0);
    assert_eq!(stats.entries, cache.len());
}
