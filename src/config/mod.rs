//! Configuration management

pub mod file;
pub mod parser;
pub mod settings;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::config::{PartialSettings, Settings};

pub use file::{EnvConfig, FileConfig, DEFAULT_CONFIG_FILE, DEFAULT_ENV_PREFIX};
pub use parser::{create_default_config, find_default_config, parse_config_content, parse_config_file};
pub use settings::SettingsValidator;

/// Trait for configuration sources
pub trait ConfigSource {
    /// Load configuration from this source
    fn load(&self) -> Result<PartialSettings>;

    /// Check if this configuration source is available
    fn is_available(&self) -> bool;

    /// Get the name of this configuration source for logging
    fn name(&self) -> &str;

    /// Get the priority of this source (higher numbers take precedence)
    fn priority(&self) -> u8 {
        10
    }
}

/// Configuration builder for merging multiple sources
pub struct ConfigBuilder {
    partial: PartialSettings,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self {
            partial: PartialSettings::default(),
        }
    }

    /// Merge settings from a partial configuration
    pub fn merge(mut self, partial: PartialSettings) -> Self {
        self.partial.merge_from(partial);
        self
    }

    /// Load and merge settings from a configuration source
    pub fn load_from<S: ConfigSource>(self, source: &S) -> Result<Self> {
        if source.is_available() {
            tracing::debug!("loading configuration from {}", source.name());
            let partial = source.load()?;
            Ok(self.merge(partial))
        } else {
            Ok(self)
        }
    }

    /// Try to load from a source, ignoring it if unavailable or broken
    pub fn try_load_from<S: ConfigSource>(self, source: &S) -> Self {
        if !source.is_available() {
            return self;
        }
        match source.load() {
            Ok(partial) => self.merge(partial),
            Err(e) => {
                tracing::warn!("ignoring {}: {}", source.name(), e);
                self
            }
        }
    }

    /// Add configuration from a file
    pub fn add_config_file(self, path: &Path) -> Result<Self> {
        let file_config = FileConfig::with_path(path);
        self.load_from(&file_config)
    }

    /// Add `.crossdeps.toml` from the given root when it exists
    pub fn add_default_config_file(self, root: &Path) -> Result<Self> {
        match parser::find_default_config(root)? {
            Some(partial) => Ok(self.merge(partial)),
            None => Ok(self),
        }
    }

    /// Build the final settings with validation
    pub fn build(self) -> Result<Settings> {
        let settings = self.partial.to_settings();
        settings::SettingsValidator::validate(&settings)?;
        Ok(settings)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration for a monorepo rooted at `root`
///
/// Precedence, lowest first: defaults, `<root>/.crossdeps.toml`,
/// `CROSSDEPS_*` environment variables, the explicit root.
pub fn load_config(root: &Path) -> Result<Settings> {
    let explicit = PartialSettings {
        root: Some(root.to_path_buf()),
        ..Default::default()
    };
    load_config_with_env_prefix(explicit, DEFAULT_ENV_PREFIX)
}

/// Load configuration with explicit overrides and a custom environment variable prefix
pub fn load_config_with_env_prefix(explicit: PartialSettings, env_prefix: &str) -> Result<Settings> {
    let root = explicit.root.clone().unwrap_or_else(|| PathBuf::from("."));

    let builder = ConfigBuilder::new()
        .add_default_config_file(&root)?
        .try_load_from(&EnvConfig::new(env_prefix))
        .merge(explicit);

    builder.build()
}
