// Segmentation module - splits reading-ordered lines into catalog entries
// - counters.rs: run-scoped entry/work numbering
// - markers.rs: entry marker detection
// - fields.rs: field role patterns
// - grammar.rs: per-layout field grammars

pub mod counters;
pub mod fields;
pub mod grammar;
pub mod markers;

pub use counters::RunCounters;
pub use fields::FieldClassifier;
pub use grammar::{CatalogGrammar, OpenWork};
pub use markers::{Marker, MarkerDetector};

use crate::config::SegmentationConfig;
use crate::error::{Result, Warning};
use crate::types::{CatalogType, Entry, FieldRole, RestructuredPage, Work};
use serde::Serialize;

/// Entries closed while scanning one page (or at the end of the run)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageEntries {
    pub page_id: String,
    pub entries: Vec<Entry>,
    pub warnings: Vec<Warning>,
}

/// Everything that outlives a single page: counters, the open entry and
/// its open work, and lines seen before the first marker of the run.
#[derive(Debug, Clone, Default)]
pub struct SegmentationState {
    counters: RunCounters,
    open_entry: Option<Entry>,
    open_work: Option<OpenWork>,
    orphans: Vec<String>,
    orphan_page: Option<String>,
    last_page: Option<String>,
}

impl SegmentationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue the numbering of an earlier run
    pub fn resume(counters: RunCounters) -> Self {
        Self {
            counters,
            ..Self::default()
        }
    }

    /// Number of the entry still waiting for its next marker
    pub fn open_entry_number(&self) -> Option<u32> {
        self.open_entry.as_ref().map(|entry| entry.number)
    }

    fn close_work(&mut self) {
        if let Some(open) = self.open_work.take() {
            if let Some(entry) = self.open_entry.as_mut() {
                entry.works.push(open.into_work());
            }
        }
    }
}

pub struct EntrySegmenter {
    grammar: CatalogGrammar,
    markers: MarkerDetector,
    fields: FieldClassifier,
}

impl EntrySegmenter {
    pub fn new(catalog_type: CatalogType, config: &SegmentationConfig) -> Result<Self> {
        Ok(Self {
            grammar: CatalogGrammar::from(catalog_type),
            markers: MarkerDetector::new(&config.entry_marker_pattern)?,
            fields: FieldClassifier::new(config)?,
        })
    }

    /// Scan one page. Returns the entries closed on it; the last entry stays
    /// open in `state` until the next marker or `finish`.
    pub fn segment(&self, page: &RestructuredPage, state: &mut SegmentationState) -> PageEntries {
        let mut out = PageEntries {
            page_id: page.page_id.clone(),
            ..PageEntries::default()
        };
        state.last_page = Some(page.page_id.clone());

        for line in page.lines() {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }

            if let Some(marker) = self.markers.detect(text, &self.fields) {
                self.open_work(marker, text, &page.page_id, state, &mut out);
                continue;
            }

            match state.open_work.as_mut() {
                Some(open) => out.warnings.extend(self.grammar.absorb_line(
                    open,
                    text,
                    &self.fields,
                    &page.page_id,
                )),
                None => {
                    if state.orphan_page.is_none() {
                        state.orphan_page = Some(page.page_id.clone());
                    }
                    state.orphans.push(text.to_string());
                }
            }
        }

        tracing::info!(
            "🔎 {}: {} entries closed ({} works), entry {} open",
            page.page_id,
            out.entries.len(),
            out.entries.iter().map(|entry| entry.works.len()).sum::<usize>(),
            state
                .open_entry_number()
                .map_or_else(|| "none".to_string(), |number| format!("#{number}")),
        );

        out
    }

    /// Close whatever is still open at the end of the run
    pub fn finish(&self, mut state: SegmentationState) -> PageEntries {
        let mut out = PageEntries {
            page_id: state.last_page.clone().unwrap_or_default(),
            ..PageEntries::default()
        };

        state.close_work();
        if let Some(entry) = state.open_entry.take() {
            let expected = self.grammar.works_per_entry();
            if entry.works.len() < expected {
                out.warnings.push(
                    Warning::IncompleteEntry {
                        entry_number: entry.number,
                        works: entry.works.len(),
                        expected,
                    }
                    .emit(),
                );
            }
            out.entries.push(entry);
        }

        // No marker in the whole run: the orphan lines are the catalog
        if !state.orphans.is_empty() {
            out.warnings.push(orphan_warning(&state));
            let mut entry = Entry::new(state.counters.next_entry_number());
            let mut work = Work::new(state.counters.next_work_number(), None);
            for line in state.orphans.drain(..) {
                work.push_field(FieldRole::Unclassified, line);
            }
            entry.works.push(work);
            out.entries.push(entry);
        }

        tracing::info!(
            "🏁 segmentation finished: {} entries, {} works numbered",
            state.counters.last_entry_number(),
            state.counters.last_work_number()
        );

        out
    }

    fn open_work(
        &self,
        marker: Marker,
        line: &str,
        page_id: &str,
        state: &mut SegmentationState,
        out: &mut PageEntries,
    ) {
        state.close_work();

        let full = state
            .open_entry
            .as_ref()
            .map_or(true, |entry| entry.works.len() >= self.grammar.works_per_entry());
        if full {
            if let Some(done) = state.open_entry.take() {
                out.entries.push(done);
            }
            state.open_entry = Some(Entry::new(state.counters.next_entry_number()));
        }

        let number = state.counters.next_work_number();
        let (mut open, warning) = self
            .grammar
            .open_work(number, marker, line, &self.fields, page_id);
        out.warnings.extend(warning);

        if !state.orphans.is_empty() {
            out.warnings.push(orphan_warning(state));
            let orphans = std::mem::take(&mut state.orphans);
            open.work.prepend_field(FieldRole::Unclassified, orphans);
        }

        state.open_work = Some(open);
    }
}

fn orphan_warning(state: &SegmentationState) -> Warning {
    Warning::OrphanLines {
        page_id: state.orphan_page.clone().unwrap_or_default(),
        count: state.orphans.len(),
    }
    .emit()
}
