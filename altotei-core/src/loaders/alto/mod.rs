//! ALTO page loader
//!
//! Reading goes through `alto_parser` and accepts any ALTO namespace/version,
//! since elements are matched by local name. Writing (`alto_writer`) always
//! produces ALTO v4.

pub mod alto_parser;
pub mod alto_writer;

pub use alto_parser::parse_alto;
pub use alto_writer::write_alto;

use super::page_loader::PageLoader;
use crate::error::Result;
use crate::types::Page;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct AltoLoader;

impl AltoLoader {
    pub fn new() -> Self {
        Self
    }
}

impl PageLoader for AltoLoader {
    fn parse_markup(&self, markup: &str, page_id: &str) -> Result<Page> {
        parse_alto(markup, page_id)
    }

    fn name(&self) -> &str {
        "ALTO"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
    }
}
