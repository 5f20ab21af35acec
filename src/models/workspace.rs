//! Workspace descriptors

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One independently buildable project inside the monorepo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique workspace name
    pub name: String,
    /// Path relative to the monorepo root
    pub path: PathBuf,
    /// Absolute filesystem path
    pub absolute_path: PathBuf,
}

impl Workspace {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, root: &Path) -> Self {
        let path = path.into();
        let absolute_path = root.join(&path);
        Self {
            name: name.into(),
            path,
            absolute_path,
        }
    }
}

/// Source languages with an import extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
}

impl Language {
    /// Language of a source file, by extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "py" | "pyi" => Some(Language::Python),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::JavaScript => write!(f, "javascript"),
            Language::TypeScript => write!(f, "typescript"),
            Language::Python => write!(f, "python"),
        }
    }
}
