//! pyproject.toml parsing
//!
//! Reads the PEP 621 `[project]` table, falling back to `[tool.poetry]` for
//! the name and dependency list.

use crate::error::{IndexError, Result, ResultExt};
use std::path::Path;
use toml::Value;

/// The parts of a pyproject.toml the analysis needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PyprojectManifest {
    pub name: Option<String>,
    /// Bare distribution names, version specifiers stripped
    pub dependencies: Vec<String>,
}

pub struct PyprojectParser;

impl PyprojectParser {
    pub fn parse(content: &str) -> Result<PyprojectManifest> {
        let value: Value = toml::from_str(content)?;

        let project = value.get("project");
        let poetry = value.get("tool").and_then(|t| t.get("poetry"));

        let name = project
            .and_then(|p| p.get("name"))
            .or_else(|| poetry.and_then(|p| p.get("name")))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut dependencies = Vec::new();

        if let Some(list) = project.and_then(|p| p.get("dependencies")).and_then(Value::as_array) {
            dependencies.extend(list.iter().filter_map(Value::as_str).filter_map(requirement_name));
        }

        if let Some(table) = poetry.and_then(|p| p.get("dependencies")).and_then(Value::as_table) {
            dependencies.extend(
                table
                    .keys()
                    .filter(|k| k.as_str() != "python")
                    .map(|k| k.to_string()),
            );
        }

        Ok(PyprojectManifest { name, dependencies })
    }

    pub fn parse_file(path: &Path) -> Result<PyprojectManifest> {
        let content = std::fs::read_to_string(path).with_file_context(path)?;
        Self::parse(&content).map_err(|e| IndexError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Distribution name of a PEP 508 requirement string
///
/// `"shared-models[extra]>=1.0; python_version>'3.8'"` gives `shared-models`.
pub fn requirement_name(requirement: &str) -> Option<String> {
    let name: String = requirement
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Python import spelling of a distribution name
pub fn module_name(distribution: &str) -> String {
    distribution.replace('-', "_")
}
