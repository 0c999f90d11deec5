use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ===== GEOMETRY =====
// Coordinates are ALTO page pixels: HPOS/VPOS is the top-left corner,
// y grows downwards.

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Zero (or negative) area regions carry no usable position data
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Smallest box enclosing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());

        BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Vertical distance from this box's bottom to `below`'s top (negative when they overlap)
    pub fn vertical_gap_to(&self, below: &BoundingBox) -> f32 {
        below.y - self.bottom()
    }
}

// ===== PAGE MODEL =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub id: String,
    pub bbox: BoundingBox,
    /// Verbatim transcription (String CONTENTs joined by single spaces)
    pub text: String,
    /// Resolved TAGREFS label, e.g. "DefaultLine"
    pub tag: Option<String>,
}

impl TextLine {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    pub bbox: BoundingBox,
    pub tag: Option<String>,
    pub lines: Vec<TextLine>,
}

/// One scanned sheet as read from its page-description file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// File name without extension
    pub id: String,
    pub width: f32,
    pub height: f32,
    /// Blocks in file order
    pub blocks: Vec<TextBlock>,
    /// Set when this page is itself a restructuring artifact: SHA-256 of the source page
    pub source_digest: Option<String>,
    /// Artifact of a page kept in source order: the blocks whose geometry was unusable
    pub degenerate_blocks: Vec<String>,
}

impl Page {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|block| block.lines.iter())
    }

    pub fn line_count(&self) -> usize {
        self.blocks.iter().map(|block| block.lines.len()).sum()
    }
}

/// A block in reading order; may gather several source blocks that segmentation split apart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalBlock {
    pub id: String,
    pub bbox: BoundingBox,
    pub source_block_ids: Vec<String>,
    pub lines: Vec<TextLine>,
}

impl LogicalBlock {
    pub fn from_text_block(block: &TextBlock) -> Self {
        Self {
            id: block.id.clone(),
            bbox: block.bbox,
            source_block_ids: vec![block.id.clone()],
            lines: block.lines.clone(),
        }
    }

    /// Append `other` after this block's lines
    pub fn absorb(&mut self, other: LogicalBlock) {
        self.bbox = self.bbox.union(&other.bbox);
        self.source_block_ids.extend(other.source_block_ids);
        self.lines.extend(other.lines);
    }
}

/// Permutation plus re-grouping of a page's lines in logical reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestructuredPage {
    pub page_id: String,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<LogicalBlock>,
    /// Name of the strategy that produced this order
    pub strategy: String,
    /// True when geometry was unusable and the source order was kept
    pub degenerate: bool,
}

impl RestructuredPage {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|block| block.lines.iter())
    }

    pub fn line_texts(&self) -> Vec<&str> {
        self.lines().map(|line| line.text.as_str()).collect()
    }

    /// Blocks with zero-area geometry; only meaningful on a passthrough page
    pub fn degenerate_block_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter(|block| block.bbox.is_degenerate())
            .map(|block| block.id.clone())
            .collect()
    }

    /// Source order kept as-is, one logical block per source block
    pub fn passthrough(page: &Page) -> Self {
        Self {
            page_id: page.id.clone(),
            width: page.width,
            height: page.height,
            blocks: page
                .blocks
                .iter()
                .filter(|block| !block.lines.is_empty())
                .map(LogicalBlock::from_text_block)
                .collect(),
            strategy: "passthrough".to_string(),
            degenerate: false,
        }
    }
}

// ===== CATALOG MODEL =====

/// Field layout of the catalog, chosen once for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogType {
    #[serde(alias = "nulle")]
    None,
    Simple,
    Double,
    Triple,
}

impl CatalogType {
    pub fn works_per_entry(&self) -> usize {
        match self {
            CatalogType::None | CatalogType::Simple => 1,
            CatalogType::Double => 2,
            CatalogType::Triple => 3,
        }
    }

    /// Whether works get a field split at all
    pub fn is_structured(&self) -> bool {
        !matches!(self, CatalogType::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogType::None => "none",
            CatalogType::Simple => "simple",
            CatalogType::Double => "double",
            CatalogType::Triple => "triple",
        }
    }
}

impl fmt::Display for CatalogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "nulle" => Ok(CatalogType::None),
            "simple" => Ok(CatalogType::Simple),
            "double" => Ok(CatalogType::Double),
            "triple" => Ok(CatalogType::Triple),
            other => Err(format!(
                "unknown catalog type '{other}' (expected none, simple, double or triple)"
            )),
        }
    }
}

/// Descriptive role of a piece of work text. Declaration order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    Creator,
    Title,
    Medium,
    Dimensions,
    Date,
    Owner,
    Notes,
    /// Residual role: text that matched no pattern of the active grammar
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Work {
    pub number: u32,
    /// Marker as printed in the catalog ("12.", "3 bis)")
    pub marker: Option<String>,
    pub fields: BTreeMap<FieldRole, Vec<String>>,
}

impl Work {
    pub fn new(number: u32, marker: Option<String>) -> Self {
        Self {
            number,
            marker,
            fields: BTreeMap::new(),
        }
    }

    pub fn push_field(&mut self, role: FieldRole, text: impl Into<String>) {
        self.fields.entry(role).or_default().push(text.into());
    }

    /// Insert fragments ahead of the ones already held for `role`
    pub fn prepend_field(&mut self, role: FieldRole, texts: Vec<String>) {
        self.fields.entry(role).or_default().splice(0..0, texts);
    }

    pub fn field(&self, role: FieldRole) -> Option<&[String]> {
        self.fields.get(&role).map(|values| values.as_slice())
    }

    /// Field fragments joined with a single space
    pub fn field_text(&self, role: FieldRole) -> Option<String> {
        self.field(role).map(|values| values.join(" "))
    }

    pub fn roles(&self) -> impl Iterator<Item = FieldRole> + '_ {
        self.fields.keys().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entry {
    pub number: u32,
    pub works: Vec<Work>,
}

impl Entry {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            works: Vec::new(),
        }
    }
}

/// The output catalog, append-only
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub entries: Vec<Entry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entries: impl IntoIterator<Item = Entry>) {
        self.entries.extend(entries);
    }

    pub fn work_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.works.len()).sum()
    }
}
