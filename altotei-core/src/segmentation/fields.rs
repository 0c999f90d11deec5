use crate::config::SegmentationConfig;
use crate::error::Result;
use crate::types::FieldRole;
use regex::Regex;

/// Pattern rules assigning a role to the lines that follow a work's heading
pub struct FieldClassifier {
    separator: Regex,
    dimensions: Regex,
    date: Regex,
    medium: Option<Regex>,
    owner_prefixes: Vec<String>,
}

impl FieldClassifier {
    pub fn new(config: &SegmentationConfig) -> Result<Self> {
        let keywords: Vec<String> = config
            .medium_keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .map(regex::escape)
            .collect();
        let medium = if keywords.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?i)\b(?:{})\b", keywords.join("|")))?)
        };

        Ok(Self {
            separator: Regex::new(&config.creator_title_separator)?,
            dimensions: Regex::new(&config.dimensions_pattern)?,
            date: Regex::new(&config.date_pattern)?,
            medium,
            owner_prefixes: config
                .owner_prefixes
                .iter()
                .map(|prefix| prefix.trim().to_lowercase())
                .filter(|prefix| !prefix.is_empty())
                .collect(),
        })
    }

    /// Role of a non-heading line, `None` when no rule matches
    pub fn classify(&self, text: &str) -> Option<FieldRole> {
        let text = text.trim();
        if self.dimensions.is_match(text) {
            return Some(FieldRole::Dimensions);
        }
        if self.date.is_match(text) {
            return Some(FieldRole::Date);
        }
        if self.medium.as_ref().is_some_and(|medium| medium.is_match(text)) {
            return Some(FieldRole::Medium);
        }
        let lower = text.to_lowercase();
        if self
            .owner_prefixes
            .iter()
            .any(|prefix| lower.starts_with(prefix.as_str()))
        {
            return Some(FieldRole::Owner);
        }
        if text.starts_with('(') {
            return Some(FieldRole::Notes);
        }
        None
    }

    /// Lines that are wholly a dimensions or date statement; never entry markers
    pub fn is_field_line(&self, text: &str) -> bool {
        let text = text.trim();
        self.dimensions.is_match(text) || self.date.is_match(text)
    }

    /// Split a heading at its first creator/title separator
    pub fn split_heading<'t>(&self, heading: &'t str) -> Option<(&'t str, &'t str)> {
        let found = self.separator.find(heading)?;
        let creator = heading[..found.start()].trim();
        let title = heading[found.end()..].trim();
        if creator.is_empty() || title.is_empty() {
            return None;
        }
        Some((creator, title))
    }
}

/// Open minus closed parentheses
pub fn paren_balance(text: &str) -> i32 {
    text.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}
