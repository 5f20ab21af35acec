//! JavaScript and TypeScript import extraction

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::{ImportExtractor, RawImport};
use crate::models::{EdgeKind, Language};
use crate::utils::path_resolver::normalize_path;

/// `import X from 'y'`, `import { A, B as C } from "y"`, `export * from 'y'`, type-only forms
static FROM_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:import|export)\s+(?:type\s+)?([\w$\s{},*]*?)\s*from\s*['"]([^'"\n]+)['"]"#)
        .expect("valid ES module regex")
});
/// `import 'y'`
static SIDE_EFFECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*['"]([^'"\n]+)['"]"#).expect("valid side-effect import regex"));
/// `require('y')`
static REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid require regex"));
/// `import('y')`
static DYNAMIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).expect("valid dynamic import regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct JavaScriptExtractor;

impl JavaScriptExtractor {
    /// Names bound by an import clause such as `React, { useState, type Props as P }`
    fn bound_names(clause: &str) -> Vec<String> {
        let mut names = Vec::new();

        let (outside, inside) = match (clause.find('{'), clause.rfind('}')) {
            (Some(open), Some(close)) if open < close => {
                let outside = format!("{} {}", &clause[..open], &clause[close + 1..]);
                (outside, Some(&clause[open + 1..close]))
            }
            _ => (clause.to_string(), None),
        };

        for part in outside.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some(rest) = part.strip_prefix('*') {
                // `* as ns`
                if let Some(alias) = rest.trim().strip_prefix("as") {
                    push_identifier(&mut names, alias);
                }
            } else {
                push_identifier(&mut names, part);
            }
        }

        if let Some(inside) = inside {
            for part in inside.split(',') {
                let part = part.trim();
                let part = part.strip_prefix("type ").unwrap_or(part);
                let imported = part.split_whitespace().next().unwrap_or("");
                push_identifier(&mut names, imported);
            }
        }

        names
    }
}

fn push_identifier(names: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() && candidate.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
        names.push(candidate.to_string());
    }
}

impl ImportExtractor for JavaScriptExtractor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"]
    }

    fn extract_imports<'a>(&'a self, content: &'a str) -> Box<dyn Iterator<Item = RawImport> + 'a> {
        let mut found: Vec<(usize, RawImport)> = Vec::new();

        for caps in FROM_CLAUSE.captures_iter(content) {
            let (Some(whole), Some(spec)) = (caps.get(0), caps.get(2)) else { continue };
            let names = caps.get(1).map(|c| Self::bound_names(c.as_str())).unwrap_or_default();
            found.push((
                whole.start(),
                RawImport {
                    specifier: spec.as_str().to_string(),
                    statement: whole.as_str().to_string(),
                    names,
                },
            ));
        }

        for pattern in [&*SIDE_EFFECT, &*REQUIRE, &*DYNAMIC] {
            for caps in pattern.captures_iter(content) {
                let (Some(whole), Some(spec)) = (caps.get(0), caps.get(1)) else { continue };
                found.push((
                    whole.start(),
                    RawImport {
                        specifier: spec.as_str().to_string(),
                        statement: whole.as_str().to_string(),
                        names: Vec::new(),
                    },
                ));
            }
        }

        found.sort_by_key(|(offset, _)| *offset);
        Box::new(found.into_iter().map(|(_, import)| import))
    }

    fn is_relative(&self, specifier: &str) -> bool {
        specifier.starts_with('.') || specifier.starts_with('/')
    }

    fn resolve_relative(&self, specifier: &str, importing_file: &Path, root: &Path) -> Option<PathBuf> {
        if let Some(from_root) = specifier.strip_prefix('/') {
            return Some(normalize_path(&root.join(from_root)));
        }
        if specifier.starts_with('.') {
            let dir = importing_file.parent()?;
            return Some(normalize_path(&dir.join(specifier)));
        }
        None
    }

    fn package_match(&self, specifier: &str, package_name: &str) -> bool {
        specifier == package_name
    }

    fn package_edge_kind(&self) -> EdgeKind {
        EdgeKind::Package
    }
}
