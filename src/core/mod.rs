//! Core analysis: registry, cycles, caching, compression and orchestration

pub mod analyzer;
pub mod budget;
pub mod cache;
pub mod compressor;
pub mod cycles;
pub mod index_loader;
pub mod parallel;
pub mod registry;

pub use analyzer::{AnalysisMode, Analyzer};
pub use cache::{BoundedCache, CacheStats, EntryInfo};
pub use compressor::{CompressionStats, IndexCompressor};
pub use cycles::CycleDetector;
pub use index_loader::{CacheSet, IndexLoader, LoaderStats};
pub use parallel::{ProcessorReport, WorkspaceProcessor};
pub use registry::{DeclaredDependency, ManifestRegistry, WorkspaceRegistry};
