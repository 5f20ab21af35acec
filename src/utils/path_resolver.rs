//! Path normalization and workspace ownership lookup

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, folding `.` and `..` without touching the filesystem
///
/// `..` past the root of an absolute path is dropped; on a relative path it is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !path.is_absolute() {
                    out.push("..");
                }
            }
            Component::Normal(segment) => {
                out.push(segment);
                depth += 1;
            }
        }
    }

    out
}

/// Make `path` absolute against `root` and normalize it
pub fn absolutize(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    }
}

/// Render `path` relative to `base` with forward slashes, if it lies under it
pub fn relative_display(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(if parts.is_empty() { ".".to_string() } else { parts.join("/") })
}

/// Longest-prefix lookup from absolute paths to workspace names
#[derive(Debug, Clone, Default)]
pub struct PrefixResolver {
    /// Sorted deepest first so the first match is the longest prefix
    entries: Vec<(PathBuf, String)>,
}

impl PrefixResolver {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        let mut entries: Vec<(PathBuf, String)> = entries
            .into_iter()
            .map(|(path, name)| (normalize_path(&path), name))
            .collect();
        entries.sort_by(|(a_path, a_name), (b_path, b_name)| {
            b_path
                .components()
                .count()
                .cmp(&a_path.components().count())
                .then_with(|| a_name.cmp(b_name))
        });
        Self { entries }
    }

    /// Workspace owning `path` (already absolute and normalized)
    pub fn resolve(&self, path: &Path) -> Option<&str> {
        self.entries
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
