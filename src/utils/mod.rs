//! Shared helpers

pub mod path_resolver;

pub use path_resolver::{absolutize, normalize_path, relative_display, PrefixResolver};
