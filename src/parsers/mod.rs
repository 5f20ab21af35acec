//! Parsing functionality for monorepo sources
//!
//! Manifest parsers (package.json, pyproject.toml, tsconfig.json), per-language
//! import extractors and the dependency graph builder that ties them together.

pub mod dependency_graph_builder;
pub mod imports;
pub mod package_json;
pub mod pyproject;
pub mod tsconfig;

pub use dependency_graph_builder::{DependencyGraphBuilder, GraphBuild, GraphBuilderConfig};
pub use imports::{ExtractorSet, ImportExtractor, JavaScriptExtractor, PythonExtractor, RawImport};
pub use package_json::PackageJsonParser;
pub use pyproject::PyprojectParser;
pub use tsconfig::TsConfigParser;
