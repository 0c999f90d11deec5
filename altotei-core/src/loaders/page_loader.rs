// Page loader abstraction
//
// This module defines the boundary between page-description parsing
// (ALTO file -> Page) and everything that follows (reading order,
// segmentation, TEI). Loaders only describe geometry and text; they never
// interpret catalog semantics.

use crate::error::{AltoTeiError, Result};
use crate::types::Page;
use std::path::Path;

/// PageLoader trait - converts one page-description file into a `Page`
///
/// Loading happens in two steps:
/// 1. File -> markup text (read + UTF-8 decode)
/// 2. Markup -> Page (dialect-specific parsing)
pub trait PageLoader {
    /// Parse markup into a page identified by `page_id`
    ///
    /// Fails with `MalformedInput` when the markup is not well-formed or lacks
    /// the line/geometry structure of the dialect.
    fn parse_markup(&self, markup: &str, page_id: &str) -> Result<Page>;

    /// Convenience method: load from file path
    ///
    /// The page id is the file name without extension. Malformed-input errors
    /// are re-attributed to `path`.
    fn load_file(&self, path: &Path) -> Result<Page> {
        let bytes = std::fs::read(path)?;
        let markup = String::from_utf8(bytes)
            .map_err(|err| AltoTeiError::malformed(path, format!("not valid UTF-8: {err}")))?;

        self.parse_markup(&markup, &page_id_from_path(path))
            .map_err(|err| match err {
                AltoTeiError::MalformedInput { reason, .. } => AltoTeiError::malformed(path, reason),
                other => other,
            })
    }

    /// Get loader name for debugging/logging
    fn name(&self) -> &str;

    /// Check if loader supports the given file type
    fn supports_file_type(&self, path: &Path) -> bool;
}

/// File name minus its last extension
pub fn page_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
