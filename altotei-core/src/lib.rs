// altotei core library
//
// Turns the ALTO transcriptions of a scanned exhibition catalog into one TEI
// document: pages are put back in reading order, split into numbered entries
// and works, and mapped to TEI list items.

pub mod config;
pub mod error;
pub mod loaders;
pub mod processor;
pub mod reading_order;
pub mod segmentation;
pub mod storage;
pub mod tei;
pub mod types;
pub mod validation;

// Re-export main types and functions for easy use
pub use config::ExtractionConfig;
pub use error::{AltoTeiError, Result, Warning};
pub use loaders::{AltoLoader, PageLoader};
pub use processor::{CatalogProcessor, PipelineStages, RunReport, RunRequest, StepProfiler};
pub use reading_order::{ReadingOrderStrategy, Restructurer, SpatialReadingOrder};
pub use segmentation::{EntrySegmenter, PageEntries, RunCounters, SegmentationState};
pub use storage::{ArtifactStore, FileArtifactStore, NoOpArtifactStore};
pub use tei::{EntryMapper, TeiDocument, TeiDocumentBuilder};
pub use types::*;
pub use validation::{validate_alto, ValidationIssue, ValidationReport};
