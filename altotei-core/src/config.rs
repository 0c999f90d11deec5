use crate::error::{AltoTeiError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

// Default value functions for serde
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Which files of the source directory are pages
    #[serde(default)]
    pub input: InputConfig,
    /// Reading-order restructuring thresholds
    #[serde(default)]
    pub restructuring: RestructuringConfig,
    /// Entry boundary and field patterns
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Fixed parts of the TEI output
    #[serde(default)]
    pub tei: TeiConfig,
    /// Reuse an existing restructuring artifact when its recorded source digest still matches
    #[serde(default = "default_true")]
    pub reuse_restructured: bool,
    /// Persist `<stem>_restructuration.xml` next to each page
    #[serde(default = "default_true")]
    pub write_artifacts: bool,
}

// ===== INPUT =====

fn default_extension() -> String {
    "xml".to_string()
}

fn default_artifact_marker() -> String {
    "restructuration".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Page files must carry this extension (case-insensitive)
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Names containing this marker are restructuring artifacts, never fresh input
    #[serde(default = "default_artifact_marker")]
    pub artifact_marker: String,
    /// Skip dot-files (.DS_Store and friends)
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            artifact_marker: default_artifact_marker(),
            skip_hidden: true,
        }
    }
}

impl InputConfig {
    /// Suffix appended to a page stem to name its artifact
    pub fn artifact_suffix(&self) -> String {
        format!("_{}", self.artifact_marker)
    }
}

// ===== RESTRUCTURING =====

fn default_max_fragment_lines() -> usize {
    1
}

fn default_max_gap_line_ratio() -> f32 {
    1.5 // gap allowed between a fragment and its block, in median line heights
}

fn default_horizontal_alignment_tolerance() -> f32 {
    40.0
}

fn default_overlap_tolerance() -> f32 {
    5.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestructuringConfig {
    /// Merge blocks that segmentation split off their neighbour (headings, stray last lines)
    #[serde(default = "default_true")]
    pub merge_fragments: bool,
    /// A block with at most this many lines counts as a fragment
    #[serde(default = "default_max_fragment_lines")]
    pub max_fragment_lines: usize,
    /// Maximum vertical gap for a merge, as a multiple of the page's median line height
    #[serde(default = "default_max_gap_line_ratio")]
    pub max_gap_line_ratio: f32,
    /// Slack (pixels) on each side when checking that a fragment lies within its block's column
    #[serde(default = "default_horizontal_alignment_tolerance")]
    pub horizontal_alignment_tolerance: f32,
    /// Vertical overlap (pixels) needed for a block to join the current band
    #[serde(default = "default_overlap_tolerance")]
    pub band_overlap_tolerance: f32,
    /// Horizontal overlap (pixels) needed for a block to join the current column
    #[serde(default = "default_overlap_tolerance")]
    pub column_overlap_tolerance: f32,
}

impl Default for RestructuringConfig {
    fn default() -> Self {
        Self {
            merge_fragments: true,
            max_fragment_lines: default_max_fragment_lines(),
            max_gap_line_ratio: default_max_gap_line_ratio(),
            horizontal_alignment_tolerance: default_horizontal_alignment_tolerance(),
            band_overlap_tolerance: default_overlap_tolerance(),
            column_overlap_tolerance: default_overlap_tolerance(),
        }
    }
}

// ===== SEGMENTATION =====

fn default_entry_marker_pattern() -> String {
    // 12. | 12) | 12 bis. | • | *
    r"^\s*(?P<marker>\d{1,4}(?:\s*(?:bis|ter))?\s*[.)]|[•*])\s*(?P<rest>.*)$".to_string()
}

fn default_creator_title_separator() -> String {
    r"\s*[—–]\s*|\s+-\s+|\s*:\s+".to_string()
}

fn default_dimensions_pattern() -> String {
    // 0,55 x 0,46 | 65 x 54 cm | H. 0,65 ; L. 0,54 | 45 cm
    concat!(
        r"(?i)^\s*(?:",
        r"\d+(?:[.,]\d+)?\s*(?:cm|mm|m)?\s*[x×]\s*\d+(?:[.,]\d+)?\s*(?:cm|mm|m)?",
        r"(?:\s*[x×]\s*\d+(?:[.,]\d+)?\s*(?:cm|mm|m)?)?",
        r"|(?:h|haut|hauteur|height)\.?\s*:?\s*\d+(?:[.,]\d+)?\s*(?:cm|mm|m)?",
        r"(?:\s*[,;]?\s*(?:l|larg|largeur|width)\.?\s*:?\s*\d+(?:[.,]\d+)?\s*(?:cm|mm|m)?)?",
        r"|\d+(?:[.,]\d+)?\s*(?:cm|mm)",
        r")\s*\.?\s*$"
    )
    .to_string()
}

fn default_date_pattern() -> String {
    r"^\s*\(?\s*(?:vers\s+|c\.\s*|circa\s+)?(?:1[5-9]|20)\d{2}(?:\s*[-–]\s*(?:1[5-9]|20)?\d{2})?\s*\)?\.?\s*$".to_string()
}

fn default_medium_keywords() -> Vec<String> {
    [
        "huile",
        "aquarelle",
        "gouache",
        "pastel",
        "dessin",
        "fusain",
        "sanguine",
        "crayon",
        "gravure",
        "eau-forte",
        "lithographie",
        "bronze",
        "marbre",
        "plâtre",
        "terre cuite",
        "sur toile",
        "sur bois",
        "sur papier",
        "oil",
        "watercolor",
        "watercolour",
        "charcoal",
        "etching",
        "tempera",
        "marble",
        "plaster",
        "on canvas",
        "on panel",
    ]
    .iter()
    .map(|keyword| keyword.to_string())
    .collect()
}

fn default_owner_prefixes() -> Vec<String> {
    [
        "appartient à",
        "app. à",
        "collection",
        "coll.",
        "lent by",
        "owned by",
        "property of",
        "musée",
        "museum",
    ]
    .iter()
    .map(|prefix| prefix.to_string())
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Line-start pattern opening a new work; needs `marker` and `rest` named groups
    #[serde(default = "default_entry_marker_pattern")]
    pub entry_marker_pattern: String,
    /// Splits a heading into creator and title at its first match
    #[serde(default = "default_creator_title_separator")]
    pub creator_title_separator: String,
    /// Whole-line dimensions pattern
    #[serde(default = "default_dimensions_pattern")]
    pub dimensions_pattern: String,
    /// Whole-line date pattern
    #[serde(default = "default_date_pattern")]
    pub date_pattern: String,
    /// Case-insensitive keywords marking a medium/technique line
    #[serde(default = "default_medium_keywords")]
    pub medium_keywords: Vec<String>,
    /// Case-insensitive line prefixes marking an owner/lender line
    #[serde(default = "default_owner_prefixes")]
    pub owner_prefixes: Vec<String>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            entry_marker_pattern: default_entry_marker_pattern(),
            creator_title_separator: default_creator_title_separator(),
            dimensions_pattern: default_dimensions_pattern(),
            date_pattern: default_date_pattern(),
            medium_keywords: default_medium_keywords(),
            owner_prefixes: default_owner_prefixes(),
        }
    }
}

// ===== TEI =====

fn default_schemas() -> Vec<String> {
    vec![
        r#"href="https://raw.githubusercontent.com/carolinecorbieres/ArtlasCatalogues/master/5_ImproveGROBIDoutput/ODD/ODD_RNG/ODD_Transformation.rng" type="application/xml" schematypens="http://relaxng.org/ns/structure/1.0""#.to_string(),
        r#"href="https://raw.githubusercontent.com/carolinecorbieres/ArtlasCatalogues/master/5_ImproveGROBIDoutput/ODD/ODD_RNG/ODD_Transformation.rng" type="application/xml" schematypens="http://purl.oclc.org/dsdl/schematron""#.to_string(),
    ]
}

fn default_language() -> String {
    "fr".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeiConfig {
    /// Pseudo-attributes of each `<?xml-model?>` instruction
    #[serde(default = "default_schemas")]
    pub schemas: Vec<String>,
    /// CSS stylesheet href; no `<?xml-stylesheet?>` when unset
    #[serde(default)]
    pub stylesheet: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    /// Main language of the catalog (`xml:lang` on `<text>`)
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TeiConfig {
    fn default() -> Self {
        Self {
            schemas: default_schemas(),
            stylesheet: None,
            publisher: None,
            language: default_language(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            restructuring: RestructuringConfig::default(),
            segmentation: SegmentationConfig::default(),
            tei: TeiConfig::default(),
            reuse_restructured: true,
            write_artifacts: true,
        }
    }
}

impl ExtractionConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("⚠️  Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Reject configurations that would make the run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.input.artifact_marker.trim().is_empty() {
            return Err(AltoTeiError::Config(
                "input.artifact_marker must not be empty".to_string(),
            ));
        }
        if self.restructuring.max_gap_line_ratio < 0.0 {
            return Err(AltoTeiError::Config(
                "restructuring.max_gap_line_ratio must be positive".to_string(),
            ));
        }
        let marker = regex::Regex::new(&self.segmentation.entry_marker_pattern)?;
        let names: Vec<_> = marker.capture_names().flatten().collect();
        if !names.contains(&"marker") || !names.contains(&"rest") {
            return Err(AltoTeiError::Config(
                "segmentation.entry_marker_pattern needs `marker` and `rest` groups".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ExtractionConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "restructuring:\n  max_fragment_lines: 2\ntei:\n  stylesheet: catalog.css\n";
        let config: ExtractionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.restructuring.max_fragment_lines, 2);
        assert!(config.restructuring.merge_fragments);
        assert_eq!(config.tei.stylesheet.as_deref(), Some("catalog.css"));
        assert_eq!(config.input.extension, "xml");
        assert!(config.reuse_restructured);
    }

    #[test]
    fn marker_pattern_without_groups_is_rejected() {
        let mut config = ExtractionConfig::default();
        config.segmentation.entry_marker_pattern = r"^\d+\.".to_string();
        assert!(matches!(config.validate(), Err(AltoTeiError::Config(_))));
    }

    #[test]
    fn artifact_suffix_uses_marker() {
        assert_eq!(InputConfig::default().artifact_suffix(), "_restructuration");
    }
}
