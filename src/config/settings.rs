//! Settings validation

use crate::error::{IndexError, Result, ResultExt};
use crate::models::config::Settings;

/// Settings validator for ensuring configuration is valid
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate settings and return errors if invalid
    pub fn validate(settings: &Settings) -> Result<()> {
        if !settings.root.is_dir() {
            return Err(IndexError::config_error(format!(
                "Monorepo root does not exist or is not a directory: {}",
                settings.root.display()
            )));
        }

        for (name, path) in &settings.workspaces {
            if path.is_absolute() {
                return Err(IndexError::config_error(format!(
                    "Workspace '{}' path must be relative to the root, got {}",
                    name,
                    path.display()
                )));
            }
        }

        for pattern in &settings.exclude_patterns {
            glob::Pattern::new(pattern).with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
        }

        if settings.threads == Some(0) {
            return Err(IndexError::config_error("Thread count must be at least 1"));
        }

        let budgets = &settings.budgets;
        if budgets.root_index_max_bytes == 0 || budgets.root_generation_secs == 0 || budgets.workspace_load_secs == 0 {
            return Err(IndexError::config_error("Budgets must be non-zero"));
        }

        let cache = &settings.cache;
        let entry_limits = [
            cache.mapping_entries,
            cache.dependency_entries,
            cache.workspace_index_entries,
            cache.root_index_entries,
        ];
        let byte_limits = [cache.mapping_mb, cache.dependency_mb, cache.workspace_index_mb, cache.root_index_mb];
        if entry_limits.contains(&0) || byte_limits.contains(&0) {
            return Err(IndexError::config_error("Cache budgets must be non-zero"));
        }

        if settings.compression.max_depth == 0 {
            return Err(IndexError::config_error("Compression max_depth must be at least 1"));
        }

        Ok(())
    }
}
