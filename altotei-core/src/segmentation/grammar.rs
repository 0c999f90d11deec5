use super::fields::{paren_balance, FieldClassifier};
use super::markers::Marker;
use crate::error::Warning;
use crate::types::{CatalogType, FieldRole, Work};

/// Field grammar of a catalog layout: how one boundary-delimited run of
/// lines (a marker line and its followers) becomes a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogGrammar {
    /// No field split: every line, marker line included, is kept verbatim
    Verbatim,
    /// Heading split into creator and title, following lines classified by
    /// pattern; works grouped `works_per_entry` to an entry
    Fielded { works_per_entry: usize },
}

impl From<CatalogType> for CatalogGrammar {
    fn from(catalog_type: CatalogType) -> Self {
        if catalog_type.is_structured() {
            CatalogGrammar::Fielded {
                works_per_entry: catalog_type.works_per_entry(),
            }
        } else {
            CatalogGrammar::Verbatim
        }
    }
}

/// A work still receiving lines, possibly across a page boundary
#[derive(Debug, Clone, PartialEq)]
pub struct OpenWork {
    pub work: Work,
    heading_pending: bool,
    note_depth: i32,
}

impl OpenWork {
    fn new(work: Work) -> Self {
        Self {
            work,
            heading_pending: false,
            note_depth: 0,
        }
    }

    /// Inside a parenthesised note that has not closed yet
    pub fn in_note(&self) -> bool {
        self.note_depth > 0
    }

    pub fn into_work(self) -> Work {
        self.work
    }
}

impl CatalogGrammar {
    pub fn works_per_entry(&self) -> usize {
        match self {
            CatalogGrammar::Verbatim => 1,
            CatalogGrammar::Fielded { works_per_entry } => *works_per_entry,
        }
    }

    /// Start a work from its marker line
    pub fn open_work(
        &self,
        number: u32,
        marker: Marker,
        line: &str,
        fields: &FieldClassifier,
        page_id: &str,
    ) -> (OpenWork, Option<Warning>) {
        match self {
            CatalogGrammar::Verbatim => {
                let mut open = OpenWork::new(Work::new(number, None));
                open.work.push_field(FieldRole::Unclassified, line);
                (open, None)
            }
            CatalogGrammar::Fielded { .. } => {
                let mut open = OpenWork::new(Work::new(number, Some(marker.marker)));
                if marker.rest.is_empty() {
                    open.heading_pending = true;
                    return (open, None);
                }
                let warning = apply_heading(&mut open, &marker.rest, fields, page_id);
                (open, warning)
            }
        }
    }

    /// Feed one non-marker line to the open work
    pub fn absorb_line(
        &self,
        open: &mut OpenWork,
        line: &str,
        fields: &FieldClassifier,
        page_id: &str,
    ) -> Option<Warning> {
        if let CatalogGrammar::Verbatim = self {
            open.work.push_field(FieldRole::Unclassified, line);
            return None;
        }

        if open.in_note() {
            open.note_depth = (open.note_depth + paren_balance(line)).max(0);
            open.work.push_field(FieldRole::Notes, line);
            return None;
        }

        if open.heading_pending {
            open.heading_pending = false;
            return apply_heading(open, line, fields, page_id);
        }

        match fields.classify(line) {
            Some(FieldRole::Notes) => {
                open.note_depth = paren_balance(line).max(0);
                open.work.push_field(FieldRole::Notes, line);
                None
            }
            Some(role) => {
                open.work.push_field(role, line);
                None
            }
            None => {
                open.work.push_field(FieldRole::Unclassified, line);
                Some(unrecognized(page_id, open.work.number, line))
            }
        }
    }
}

fn apply_heading(
    open: &mut OpenWork,
    heading: &str,
    fields: &FieldClassifier,
    page_id: &str,
) -> Option<Warning> {
    match fields.split_heading(heading) {
        Some((creator, title)) => {
            open.work.push_field(FieldRole::Creator, creator);
            open.work.push_field(FieldRole::Title, title);
            None
        }
        None => {
            open.work.push_field(FieldRole::Unclassified, heading);
            Some(unrecognized(page_id, open.work.number, heading))
        }
    }
}

fn unrecognized(page_id: &str, work_number: u32, line: &str) -> Warning {
    Warning::UnrecognizedField {
        page_id: page_id.to_string(),
        work_number,
        line: line.to_string(),
    }
    .emit()
}
