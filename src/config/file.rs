//! Configuration file and environment sources

use std::path::{Path, PathBuf};

use super::{parser, ConfigSource};
use crate::error::{IndexError, Result};
use crate::models::config::PartialSettings;

/// Default configuration file name, looked up in the monorepo root
pub const DEFAULT_CONFIG_FILE: &str = ".crossdeps.toml";

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "CROSSDEPS";

/// Configuration file source
pub struct FileConfig {
    path: PathBuf,
    name: String,
    priority: u8,
}

impl FileConfig {
    /// Create a new file configuration source with the default path
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            name: "default config file".to_string(),
            priority: 20,
        }
    }

    /// Create a new file configuration source with a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: format!("config file ({})", path.as_ref().display()),
            priority: 20,
        }
    }

    /// Set the priority for this configuration source
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Get the path of this configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a default configuration file at this location
    pub fn create_default(&self) -> Result<()> {
        parser::create_default_config(&self.path)
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PartialSettings> {
        if !self.is_available() {
            return Err(IndexError::ConfigNotFound {
                path: self.path.clone(),
            });
        }

        parser::parse_config_file(&self.path)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::new()
    }
}

const ENV_KEYS: &[&str] = &["ROOT", "EXCLUDE", "MAX_FILE_SIZE", "PARALLEL", "THREADS"];

/// Environment variable configuration source
///
/// Reads `<PREFIX>_ROOT`, `<PREFIX>_EXCLUDE` (comma separated),
/// `<PREFIX>_MAX_FILE_SIZE`, `<PREFIX>_PARALLEL` and `<PREFIX>_THREADS`.
pub struct EnvConfig {
    prefix: String,
    name: String,
    priority: u8,
}

impl EnvConfig {
    /// Create a new environment variable configuration source
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("{} environment variables", &prefix),
            prefix,
            priority: 10,
        }
    }

    /// Set the priority for this configuration source
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, key)).ok()
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<PartialSettings> {
        let mut settings = PartialSettings::default();

        if let Some(root) = self.var("ROOT") {
            settings.root = Some(PathBuf::from(root));
        }

        if let Some(exclude) = self.var("EXCLUDE") {
            settings.exclude_patterns = Some(
                exclude
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Some(size) = self.var("MAX_FILE_SIZE") {
            let size = size.parse().map_err(|_| {
                IndexError::config_error(format!("{}_MAX_FILE_SIZE must be a byte count, got '{}'", self.prefix, size))
            })?;
            settings.max_file_size_bytes = Some(size);
        }

        if let Some(parallel) = self.var("PARALLEL") {
            settings.parallel = Some(matches!(parallel.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"));
        }

        if let Some(threads) = self.var("THREADS") {
            let threads = threads.parse().map_err(|_| {
                IndexError::config_error(format!("{}_THREADS must be a number, got '{}'", self.prefix, threads))
            })?;
            settings.threads = Some(threads);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        ENV_KEYS.iter().any(|key| self.var(key).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        self.priority
    }
}
