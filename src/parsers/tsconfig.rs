//! tsconfig.json project references

use crate::error::{IndexError, Result, ResultExt};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// String literals, comments and trailing commas, in that order of precedence
static JSONC_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:\\.|[^"\\])*"|//[^\n]*|(?s:/\*.*?\*/)|,(\s*[}\]])"#).expect("valid jsonc token regex")
});

/// Turn tsconfig content into plain JSON
///
/// Drops `//` and `/* */` comments and trailing commas; string values are
/// left untouched.
pub fn strip_comments(content: &str) -> String {
    JSONC_TOKEN
        .replace_all(content, |caps: &Captures| {
            let whole = &caps[0];
            if whole.starts_with('"') {
                whole.to_string()
            } else if let Some(closing) = caps.get(1) {
                closing.as_str().to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

pub struct TsConfigParser;

impl TsConfigParser {
    /// Raw `references[].path` values
    pub fn parse_references(content: &str) -> Result<Vec<String>> {
        let cleaned = strip_comments(content);
        let value: Value = serde_json::from_str(&cleaned).map_err(|e| IndexError::json_parse_error("tsconfig.json", e))?;

        let references = value
            .get("references")
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .filter_map(|r| r.get("path").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(references)
    }

    /// Reference paths of `<workspace_dir>/tsconfig.json`, resolved against the workspace dir
    ///
    /// A missing file yields no references.
    pub fn references_in(workspace_dir: &Path) -> Result<Vec<PathBuf>> {
        let path = workspace_dir.join("tsconfig.json");
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path).with_file_context(&path)?;
        let references = Self::parse_references(&content).map_err(|e| match e {
            IndexError::JsonParse { source, .. } => IndexError::JsonParse { file: path.clone(), source },
            other => other,
        })?;

        Ok(references.into_iter().map(|r| workspace_dir.join(r)).collect())
    }
}
