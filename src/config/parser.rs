//! Configuration file parsing utilities

use std::fs;
use std::path::Path;

use super::file::DEFAULT_CONFIG_FILE;
use crate::error::{IndexError, Result};
use crate::models::config::{PartialSettings, Settings};

/// Parse a TOML configuration file into PartialSettings
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IndexError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| IndexError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_config_content(&content, path)
}

/// Parse TOML configuration content into PartialSettings
pub fn parse_config_content<P: AsRef<Path>>(content: &str, path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    let settings: PartialSettings = toml::from_str(content).map_err(|e| IndexError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_partial_settings(&settings, path)?;

    Ok(settings)
}

/// Validate partial settings for obvious errors
pub fn validate_partial_settings<P: AsRef<Path>>(settings: &PartialSettings, path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(root) = &settings.root {
        if root.as_os_str().is_empty() {
            return Err(IndexError::config_error(format!(
                "Invalid empty root in config file: {}",
                path.display()
            )));
        }
    }

    if let Some(workspaces) = &settings.workspaces {
        for (name, ws_path) in workspaces {
            if name.is_empty() {
                return Err(IndexError::config_error(format!(
                    "Empty workspace name in config file: {}",
                    path.display()
                )));
            }
            if ws_path.is_absolute() {
                return Err(IndexError::config_error(format!(
                    "Workspace '{}' must use a root-relative path in config file: {}",
                    name,
                    path.display()
                )));
            }
        }
    }

    if let Some(patterns) = &settings.exclude_patterns {
        for pattern in patterns {
            if pattern.is_empty() {
                return Err(IndexError::config_error(format!(
                    "Empty exclude pattern in config file: {}",
                    path.display()
                )));
            }

            glob::Pattern::new(pattern).map_err(|e| {
                IndexError::config_error(format!(
                    "Invalid exclude pattern '{}' in config file: {}: {}",
                    pattern,
                    path.display(),
                    e
                ))
            })?;
        }
    }

    if let Some(budgets) = &settings.budgets {
        if budgets.root_index_max_bytes == 0 {
            return Err(IndexError::config_error(format!(
                "Invalid root_index_max_bytes 0 in config file: {}",
                path.display()
            )));
        }
    }

    if let Some(compression) = &settings.compression {
        if compression.max_depth == 0 {
            return Err(IndexError::config_error(format!(
                "Invalid compression max_depth 0 in config file: {}. Must be at least 1.",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Find and load `.crossdeps.toml` in the given monorepo root
pub fn find_default_config(root: &Path) -> Result<Option<PartialSettings>> {
    let candidate = root.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        return Ok(Some(parse_config_file(candidate)?));
    }

    Ok(None)
}

/// Create a configuration file holding the default settings at the specified path
pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(IndexError::io_error)?;
        }
    }

    let mut defaults = Settings::default();
    defaults.root = ".".into();
    let content = toml::to_string_pretty(&defaults)
        .map_err(|e| IndexError::config_error(format!("Cannot render default configuration: {}", e)))?;

    fs::write(path, content).map_err(IndexError::io_error)?;

    Ok(())
}
