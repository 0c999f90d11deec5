//! Page Loaders
//!
//! This module provides the loading layer for converting page-description
//! files into the `Page` model that feeds the reading-order restructurer.
//!
//! ## Architecture
//!
//! ```text
//! Page file (ALTO v2-v4)
//!     ↓
//! [Dialect-specific PageLoader]
//!     ↓
//! Page (blocks, lines, geometry)
//!     ↓
//! [Restructurer]
//!     ↓
//! RestructuredPage  ──→ [alto_writer] ──→ <stem>_restructuration.xml
//! ```
//!
//! ## Available Loaders
//!
//! - `AltoLoader` - ALTO XML as exported by eScriptorium/kraken

pub mod alto;
pub mod page_loader;

// Re-export main types
pub use alto::{write_alto, AltoLoader};
pub use page_loader::{page_id_from_path, PageLoader};
