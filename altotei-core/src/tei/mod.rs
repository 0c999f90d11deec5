//! TEI output
//!
//! ```text
//! Entry ──[EntryMapper]──→ <item type="entry"> ──┐
//!                                               ├─[TeiDocumentBuilder]──→ TeiDocument ──→ XML
//! teiHeader, xml-model / xml-stylesheet PIs ────┘
//! ```

pub mod builder;
pub mod mapper;
pub mod node;
pub mod serialization;

pub use builder::{TeiDocument, TeiDocumentBuilder, TEI_NS};
pub use mapper::{xml_id, EntryMapper};
pub use node::{TeiElement, TeiNode};
