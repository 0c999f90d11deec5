// Input validation - structural and content checks run before a page enters the pipeline
//
// Hard issues mean the page cannot be trusted (broken markup, lines without
// text); soft issues are reported and the page is still processed.

use crate::config::SegmentationConfig;
use crate::error::{AltoTeiError, Result};
use crate::loaders::{page_id_from_path, AltoLoader, PageLoader};
use crate::segmentation::{FieldClassifier, MarkerDetector};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub issues: Vec<ValidationIssue>,
    /// 1.0 = no issue, 0.0 = an issue per element or worse
    pub quality_score: f32,
    pub total_elements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValidationIssue {
    /// Not well-formed, wrong root, Page count, non-numeric geometry
    Structure { reason: String },
    LineWithoutText { line_id: String },
    DegenerateBlock { block_id: String },
    NoEntryMarker,
}

impl ValidationIssue {
    pub fn is_hard(&self) -> bool {
        matches!(
            self,
            ValidationIssue::Structure { .. } | ValidationIssue::LineWithoutText { .. }
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Structure { reason } => write!(f, "{reason}"),
            ValidationIssue::LineWithoutText { line_id } => {
                write!(f, "TextLine {line_id} has no String CONTENT")
            }
            ValidationIssue::DegenerateBlock { block_id } => {
                write!(f, "TextBlock {block_id} has zero area")
            }
            ValidationIssue::NoEntryMarker => write!(f, "no line looks like an entry marker"),
        }
    }
}

impl ValidationReport {
    pub fn hard_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_hard())
    }

    pub fn is_valid(&self) -> bool {
        self.hard_issues().next().is_none()
    }

    /// `ValidationFailed` when any hard issue was found
    pub fn into_result(self) -> Result<Self> {
        if self.is_valid() {
            return Ok(self);
        }
        Err(AltoTeiError::ValidationFailed {
            issues: self.hard_issues().map(ToString::to_string).collect(),
            path: self.path,
        })
    }

    pub fn log(&self) {
        tracing::info!(
            "🔍 {}: quality {:.2}/1.00, {} issue(s)",
            self.path.display(),
            self.quality_score,
            self.issues.len()
        );
        for issue in &self.issues {
            if issue.is_hard() {
                tracing::warn!("   ❌ {}", issue);
            } else {
                tracing::debug!("   ⚠️  {}", issue);
            }
        }
    }
}

/// Check one ALTO file
///
/// Only I/O failures are errors here; everything about the content is
/// reported as an issue.
pub fn validate_alto(path: &Path, segmentation: &SegmentationConfig) -> Result<ValidationReport> {
    let bytes = std::fs::read(path)?;
    let mut issues = Vec::new();

    let Ok(markup) = String::from_utf8(bytes) else {
        issues.push(ValidationIssue::Structure {
            reason: "not valid UTF-8".to_string(),
        });
        return Ok(report(path, issues, 0));
    };

    let page = match AltoLoader::new().parse_markup(&markup, &page_id_from_path(path)) {
        Ok(page) => page,
        Err(AltoTeiError::MalformedInput { reason, .. }) => {
            issues.push(ValidationIssue::Structure { reason });
            return Ok(report(path, issues, 0));
        }
        Err(other) => return Err(other),
    };

    for block in &page.blocks {
        if !block.lines.is_empty() && block.bbox.is_degenerate() {
            issues.push(ValidationIssue::DegenerateBlock {
                block_id: block.id.clone(),
            });
        }
        for line in &block.lines {
            if line.is_blank() {
                issues.push(ValidationIssue::LineWithoutText {
                    line_id: line.id.clone(),
                });
            }
        }
    }

    let fields = FieldClassifier::new(segmentation)?;
    let markers = MarkerDetector::new(&segmentation.entry_marker_pattern)?;
    if !page
        .lines()
        .any(|line| markers.detect(line.text.trim(), &fields).is_some())
    {
        issues.push(ValidationIssue::NoEntryMarker);
    }

    let total_elements = page.blocks.len() + page.line_count();
    Ok(report(path, issues, total_elements))
}

fn report(path: &Path, issues: Vec<ValidationIssue>, total_elements: usize) -> ValidationReport {
    let quality_score = if total_elements == 0 {
        if issues.is_empty() {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - (issues.len() as f32 / total_elements as f32)).max(0.0)
    };

    ValidationReport {
        path: path.to_path_buf(),
        issues,
        quality_score,
        total_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    const GOOD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v4#">
  <Layout><Page WIDTH="1000" HEIGHT="1500"><PrintSpace>
    <TextBlock ID="b1" HPOS="10" VPOS="10" WIDTH="800" HEIGHT="80">
      <TextLine ID="l1" HPOS="10" VPOS="10" WIDTH="800" HEIGHT="35">
        <String CONTENT="1. DURAND (Paul) — Vue de Rouen"/>
      </TextLine>
      <TextLine ID="l2" HPOS="10" VPOS="50" WIDTH="800" HEIGHT="35">
        <String CONTENT="Huile sur toile"/>
      </TextLine>
    </TextBlock>
  </PrintSpace></Page></Layout>
</alto>"#;

    #[test]
    fn clean_page_scores_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "p1.xml", GOOD);
        let report = validate_alto(&path, &SegmentationConfig::default()).unwrap();
        assert!(report.issues.is_empty());
        assert_eq!(report.quality_score, 1.0);
        assert_eq!(report.total_elements, 3);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn broken_markup_is_a_hard_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "p2.xml", "<alto><Layout><Page>");
        let report = validate_alto(&path, &SegmentationConfig::default()).unwrap();
        assert!(!report.is_valid());
        let err = report.into_result().unwrap_err();
        assert!(matches!(err, AltoTeiError::ValidationFailed { .. }));
    }

    #[test]
    fn empty_line_fails_but_missing_marker_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let body = GOOD
            .replace("1. DURAND (Paul) — Vue de Rouen", "Préface")
            .replace(r#"<String CONTENT="Huile sur toile"/>"#, "");
        let path = write(dir.path(), "p3.xml", &body);
        let report = validate_alto(&path, &SegmentationConfig::default()).unwrap();

        assert!(report.issues.contains(&ValidationIssue::NoEntryMarker));
        assert!(report.issues.contains(&ValidationIssue::LineWithoutText {
            line_id: "l2".to_string()
        }));
        let hard: Vec<_> = report.hard_issues().collect();
        assert_eq!(hard.len(), 1);
    }

    #[test]
    fn zero_area_block_is_soft() {
        let dir = tempfile::tempdir().unwrap();
        let body = GOOD.replace(r#"WIDTH="800" HEIGHT="80""#, r#"WIDTH="0" HEIGHT="80""#);
        let path = write(dir.path(), "p4.xml", &body);
        let report = validate_alto(&path, &SegmentationConfig::default()).unwrap();
        assert_eq!(
            report.issues,
            vec![ValidationIssue::DegenerateBlock {
                block_id: "b1".to_string()
            }]
        );
        assert!(report.is_valid());
    }
}
