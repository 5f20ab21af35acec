//! Python import extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{ImportExtractor, RawImport};
use crate::models::{EdgeKind, Language};
use crate::parsers::pyproject::module_name;
use crate::utils::path_resolver::normalize_path;

/// `from pkg.mod import A, b` and the parenthesized multi-line form
static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*from[ \t]+(\.+[\w.]*|[\w.]+)[ \t]+import[ \t]+(\([^)]*\)|[^#\n]+)")
        .expect("valid from-import regex")
});
/// `import a.b, c as d`
static PLAIN_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*import[ \t]+([^#\n]+)").expect("valid import regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct PythonExtractor;

/// Name before an optional `as` alias
fn unaliased(item: &str) -> &str {
    item.split_whitespace().next().unwrap_or("")
}

impl ImportExtractor for PythonExtractor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn extract_imports<'a>(&'a self, content: &'a str) -> Box<dyn Iterator<Item = RawImport> + 'a> {
        let mut found: Vec<(usize, RawImport)> = Vec::new();

        for caps in FROM_IMPORT.captures_iter(content) {
            let (Some(whole), Some(module), Some(items)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let names = items
                .as_str()
                .trim()
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split(',')
                .map(|item| unaliased(item.trim().trim_end_matches('\\')))
                .filter(|name| !name.is_empty() && *name != "*")
                .map(str::to_string)
                .collect();

            found.push((
                whole.start(),
                RawImport {
                    specifier: module.as_str().to_string(),
                    statement: whole.as_str().trim().to_string(),
                    names,
                },
            ));
        }

        for caps in PLAIN_IMPORT.captures_iter(content) {
            let (Some(whole), Some(modules)) = (caps.get(0), caps.get(1)) else { continue };
            for module in modules.as_str().split(',').map(|m| unaliased(m.trim())) {
                if module.is_empty() || !module.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
                    continue;
                }
                found.push((
                    whole.start(),
                    RawImport {
                        specifier: module.to_string(),
                        statement: whole.as_str().trim().to_string(),
                        names: vec![module.to_string()],
                    },
                ));
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        Box::new(found.into_iter().map(|(_, import)| import))
    }

    fn is_relative(&self, specifier: &str) -> bool {
        specifier.starts_with('.')
    }

    /// `n` leading dots ascend `n - 1` directories from the importing file's directory
    fn resolve_relative(&self, specifier: &str, importing_file: &Path, _root: &Path) -> Option<PathBuf> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        if dots == 0 {
            return None;
        }

        let mut base = importing_file.parent()?.to_path_buf();
        for _ in 1..dots {
            base = base.parent()?.to_path_buf();
        }

        for segment in specifier[dots..].split('.').filter(|s| !s.is_empty()) {
            base.push(segment);
        }

        Some(normalize_path(&base))
    }

    /// Segment-aware prefix match: `shared` matches `shared` and `shared.models`, not `shared_utils`
    fn package_match(&self, specifier: &str, package_name: &str) -> bool {
        let module = module_name(package_name);
        specifier == module || specifier.strip_prefix(module.as_str()).is_some_and(|rest| rest.starts_with('.'))
    }

    fn package_edge_kind(&self) -> EdgeKind {
        EdgeKind::Direct
    }
}
