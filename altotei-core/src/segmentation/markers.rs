use super::fields::FieldClassifier;
use crate::error::{AltoTeiError, Result};
use regex::Regex;

/// Printed entry marker at the start of a line, plus what follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// As printed: "12.", "3 bis)", "•"
    pub marker: String,
    /// Remainder of the line, trimmed; empty when the heading sits on the next line
    pub rest: String,
}

/// Detects lines that open a new work
pub struct MarkerDetector {
    pattern: Regex,
}

impl MarkerDetector {
    /// `pattern` must define `marker` and `rest` named groups
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        let names: Vec<&str> = pattern.capture_names().flatten().collect();
        if !names.contains(&"marker") || !names.contains(&"rest") {
            return Err(AltoTeiError::Config(
                "entry marker pattern needs `marker` and `rest` groups".to_string(),
            ));
        }
        Ok(Self { pattern })
    }

    /// Lines that are wholly a field statement (dimensions, date) never open a work
    pub fn detect(&self, text: &str, fields: &FieldClassifier) -> Option<Marker> {
        if fields.is_field_line(text) {
            return None;
        }
        let captures = self.pattern.captures(text)?;
        let marker = captures.name("marker")?.as_str().trim();
        if marker.is_empty() {
            return None;
        }
        Some(Marker {
            marker: marker.to_string(),
            rest: captures
                .name("rest")
                .map(|rest| rest.as_str().trim().to_string())
                .unwrap_or_default(),
        })
    }
}
