//! Per-language import extraction
//!
//! Extractors are pure: they turn file content into raw import tokens and
//! know how their language spells relative imports and package names. They
//! never touch the workspace registry.

pub mod javascript;
pub mod python;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::{EdgeKind, Language};

pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;

/// One import statement as found in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    /// Module specifier, e.g. `../shared/types` or `shared.models`
    pub specifier: String,
    /// The statement text as matched
    pub statement: String,
    /// Names bound by the statement
    pub names: Vec<String>,
}

impl RawImport {
    /// Imported names that look like types (leading uppercase letter)
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .map(String::as_str)
            .filter(|name| name.chars().next().is_some_and(char::is_uppercase))
    }
}

/// Language-specific import extraction and resolution rules
pub trait ImportExtractor: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions handled, without the dot
    fn extensions(&self) -> &'static [&'static str];

    /// Extract raw imports from file content; never fails
    fn extract_imports<'a>(&'a self, content: &'a str) -> Box<dyn Iterator<Item = RawImport> + 'a>;

    /// Whether the specifier is path-relative rather than a module name
    fn is_relative(&self, specifier: &str) -> bool;

    /// Absolute target of a relative specifier imported from `importing_file`
    ///
    /// `root` is the monorepo root, for root-anchored specifiers.
    fn resolve_relative(&self, specifier: &str, importing_file: &Path, root: &Path) -> Option<PathBuf>;

    /// Whether a module specifier refers to a workspace with the given package name
    fn package_match(&self, specifier: &str, package_name: &str) -> bool;

    /// Edge kind recorded for a package-name match
    fn package_edge_kind(&self) -> EdgeKind;
}

/// Extractor lookup by file extension
#[derive(Clone)]
pub struct ExtractorSet {
    extractors: Vec<Arc<dyn ImportExtractor>>,
}

impl ExtractorSet {
    pub fn new(extractors: Vec<Arc<dyn ImportExtractor>>) -> Self {
        Self { extractors }
    }

    /// Extractor handling the extension of `path`
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn ImportExtractor>> {
        let ext = path.extension()?.to_str()?;
        self.extractors.iter().find(|e| e.extensions().contains(&ext))
    }

    pub fn for_language(&self, language: Language) -> Option<&Arc<dyn ImportExtractor>> {
        self.extractors.iter().find(|e| e.language() == language)
    }

    pub fn extractors(&self) -> &[Arc<dyn ImportExtractor>] {
        &self.extractors
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::new(vec![Arc::new(JavaScriptExtractor), Arc::new(PythonExtractor)])
    }
}
