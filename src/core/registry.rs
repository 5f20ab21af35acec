//! Workspace registry
//!
//! The registry answers "which workspaces exist, where are they, what do they
//! call themselves and what do they declare as dependencies". Analysis code
//! only sees the trait; [`ManifestRegistry`] is the filesystem-backed
//! implementation reading `package.json` and `pyproject.toml` once at
//! construction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::handle_error;
use crate::models::config::Settings;
use crate::models::Workspace;
use crate::parsers::package_json::PackageJsonParser;
use crate::parsers::pyproject::PyprojectParser;
use crate::utils::path_resolver::{absolutize, normalize_path, PrefixResolver};

/// A dependency a workspace declares in one of its manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub name: String,
    pub version_spec: String,
    /// Manifest file name the declaration came from
    pub manifest: String,
}

/// Source of workspace metadata
pub trait WorkspaceRegistry: Send + Sync {
    /// Absolute monorepo root
    fn root_path(&self) -> &Path;

    /// All workspaces, sorted by name
    fn list_workspaces(&self) -> Vec<Workspace>;

    /// Workspace with the longest path prefix of `path`
    fn resolve_path_to_workspace(&self, path: &Path) -> Option<String>;

    /// Package name from the workspace manifest
    fn declared_package_name(&self, workspace: &str) -> Option<String>;

    /// Dependencies declared in the workspace manifests
    fn declared_dependencies(&self, workspace: &str) -> Vec<DeclaredDependency>;

    fn workspace(&self, name: &str) -> Option<Workspace> {
        self.list_workspaces().into_iter().find(|ws| ws.name == name)
    }
}

#[derive(Debug, Clone, Default)]
struct ManifestInfo {
    package_name: Option<String>,
    dependencies: Vec<DeclaredDependency>,
}

/// Registry built from configured workspace paths and their manifests
pub struct ManifestRegistry {
    root: PathBuf,
    workspaces: BTreeMap<String, Workspace>,
    manifests: BTreeMap<String, ManifestInfo>,
    resolver: PrefixResolver,
}

impl ManifestRegistry {
    /// Create a registry from `name -> root-relative path` entries
    ///
    /// Malformed manifests are logged and treated as empty.
    pub fn new(root: &Path, entries: &BTreeMap<String, PathBuf>) -> Self {
        let root = normalize_path(root);
        let mut workspaces = BTreeMap::new();
        let mut manifests = BTreeMap::new();

        for (name, path) in entries {
            let mut workspace = Workspace::new(name.clone(), path.clone(), &root);
            workspace.absolute_path = absolutize(path, &root);

            manifests.insert(name.clone(), Self::read_manifests(&workspace.absolute_path));
            workspaces.insert(name.clone(), workspace);
        }

        let resolver = PrefixResolver::new(
            workspaces
                .values()
                .map(|ws| (ws.absolute_path.clone(), ws.name.clone())),
        );

        tracing::debug!("registry loaded {} workspaces under {}", workspaces.len(), root.display());

        Self {
            root,
            workspaces,
            manifests,
            resolver,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.root, &settings.workspaces)
    }

    fn read_manifests(dir: &Path) -> ManifestInfo {
        let mut info = ManifestInfo::default();

        let package_json = dir.join("package.json");
        if package_json.is_file() {
            match PackageJsonParser::parse_file(&package_json) {
                Ok(manifest) => {
                    info.package_name = manifest.name;
                    info.dependencies.extend(manifest.dependencies.into_iter().map(|d| DeclaredDependency {
                        name: d.name,
                        version_spec: d.version_spec,
                        manifest: "package.json".to_string(),
                    }));
                }
                Err(err) => {
                    handle_error(err);
                }
            }
        }

        let pyproject = dir.join("pyproject.toml");
        if pyproject.is_file() {
            match PyprojectParser::parse_file(&pyproject) {
                Ok(manifest) => {
                    if info.package_name.is_none() {
                        info.package_name = manifest.name;
                    }
                    info.dependencies.extend(manifest.dependencies.into_iter().map(|name| DeclaredDependency {
                        name,
                        version_spec: String::new(),
                        manifest: "pyproject.toml".to_string(),
                    }));
                }
                Err(err) => {
                    handle_error(err);
                }
            }
        }

        info
    }
}

impl WorkspaceRegistry for ManifestRegistry {
    fn root_path(&self) -> &Path {
        &self.root
    }

    fn list_workspaces(&self) -> Vec<Workspace> {
        self.workspaces.values().cloned().collect()
    }

    fn resolve_path_to_workspace(&self, path: &Path) -> Option<String> {
        let path = absolutize(path, &self.root);
        self.resolver.resolve(&path).map(str::to_string)
    }

    fn declared_package_name(&self, workspace: &str) -> Option<String> {
        self.manifests.get(workspace).and_then(|m| m.package_name.clone())
    }

    fn declared_dependencies(&self, workspace: &str) -> Vec<DeclaredDependency> {
        self.manifests
            .get(workspace)
            .map(|m| m.dependencies.clone())
            .unwrap_or_default()
    }

    fn workspace(&self, name: &str) -> Option<Workspace> {
        self.workspaces.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entries(list: &[(&str, &str)]) -> BTreeMap<String, PathBuf> {
        list.iter().map(|(n, p)| (n.to_string(), PathBuf::from(p))).collect()
    }

    #[test]
    fn test_manifests_are_read() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/app")).unwrap();
        fs::create_dir_all(root.join("services/api")).unwrap();
        fs::write(
            root.join("packages/app/package.json"),
            r#"{"name": "@acme/app", "dependencies": {"@acme/shared": "*"}}"#,
        )
        .unwrap();
        fs::write(
            root.join("services/api/pyproject.toml"),
            "[project]\nname = \"api\"\ndependencies = [\"shared-models>=1\"]\n",
        )
        .unwrap();

        let registry = ManifestRegistry::new(root, &entries(&[("app", "packages/app"), ("api", "services/api")]));

        assert_eq!(registry.declared_package_name("app").as_deref(), Some("@acme/app"));
        assert_eq!(registry.declared_package_name("api").as_deref(), Some("api"));
        assert_eq!(registry.declared_dependencies("app")[0].name, "@acme/shared");
        assert_eq!(registry.declared_dependencies("api")[0].manifest, "pyproject.toml");

        let names: Vec<_> = registry.list_workspaces().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["api".to_string(), "app".to_string()]);
    }

    #[test]
    fn test_malformed_manifest_is_empty() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("broken")).unwrap();
        fs::write(dir.path().join("broken/package.json"), "{ nope").unwrap();

        let registry = ManifestRegistry::new(dir.path(), &entries(&[("broken", "broken")]));
        assert!(registry.declared_package_name("broken").is_none());
        assert!(registry.declared_dependencies("broken").is_empty());
    }

    #[test]
    fn test_resolve_path_longest_prefix() {
        let dir = tempdir().unwrap();
        let registry = ManifestRegistry::new(
            dir.path(),
            &entries(&[("packages", "packages"), ("core", "packages/core")]),
        );

        assert_eq!(
            registry.resolve_path_to_workspace(&dir.path().join("packages/core/src/a.ts")).as_deref(),
            Some("core")
        );
        assert_eq!(
            registry.resolve_path_to_workspace(Path::new("packages/misc/b.ts")).as_deref(),
            Some("packages")
        );
        assert!(registry.resolve_path_to_workspace(Path::new("tools/c.ts")).is_none());
        assert!(registry.workspace("core").is_some());
        assert!(registry.workspace("ghost").is_none());
    }
}
