//! Package.json parsing functionality
//!
//! Only the fields relevant to cross-workspace analysis are read: the package
//! name and the three dependency tables that can point at sibling workspaces.

use crate::error::{IndexError, Result, ResultExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Dependency tables checked for workspace references
pub const DEPENDENCY_FIELDS: &[&str] = &["dependencies", "devDependencies", "peerDependencies"];

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub version_spec: String,
    /// Table the entry came from, e.g. `devDependencies`
    pub field: String,
}

/// The parts of a package.json the analysis needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub dependencies: Vec<DependencyEntry>,
}

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    /// Parse package.json content
    pub fn parse(content: &str) -> Result<PackageManifest> {
        let json_value: Value =
            serde_json::from_str(content).map_err(|e| IndexError::json_parse_error("package.json", e))?;

        let obj = match json_value {
            Value::Object(obj) => obj,
            _ => {
                return Err(IndexError::InvalidManifest {
                    path: "package.json".into(),
                    message: "Root value is not an object".into(),
                });
            }
        };

        let mut manifest = PackageManifest {
            name: Self::extract_optional_string(&obj, "name"),
            ..Default::default()
        };

        for field in DEPENDENCY_FIELDS {
            manifest.dependencies.extend(Self::extract_dependencies(&obj, field));
        }

        Ok(manifest)
    }

    /// Parse package.json file from a path
    pub fn parse_file(path: &Path) -> Result<PackageManifest> {
        let content = std::fs::read_to_string(path).with_file_context(path)?;

        Self::parse(&content).map_err(|e| match e {
            IndexError::JsonParse { source, .. } => IndexError::JsonParse {
                file: path.to_path_buf(),
                source,
            },
            IndexError::InvalidManifest { message, .. } => IndexError::InvalidManifest {
                path: path.to_path_buf(),
                message,
            },
            _ => e,
        })
    }

    /// Collect `name -> version` entries of one dependency table
    fn extract_dependencies(obj: &Map<String, Value>, field: &str) -> Vec<DependencyEntry> {
        let mut entries = Vec::new();

        if let Some(Value::Object(map)) = obj.get(field) {
            for (name, version) in map {
                if let Some(version_str) = version.as_str() {
                    entries.push(DependencyEntry {
                        name: name.clone(),
                        version_spec: version_str.to_string(),
                        field: field.to_string(),
                    });
                }
            }
        }

        entries
    }

    /// Extract an optional string field from a JSON object
    fn extract_optional_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
        match obj.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Group entries by table, handy for diagnostics
pub fn dependencies_by_field(manifest: &PackageManifest) -> BTreeMap<&str, Vec<&DependencyEntry>> {
    let mut grouped: BTreeMap<&str, Vec<&DependencyEntry>> = BTreeMap::new();
    for entry in &manifest.dependencies {
        grouped.entry(entry.field.as_str()).or_default().push(entry);
    }
    grouped
}
