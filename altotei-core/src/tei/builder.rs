use super::mapper::EntryMapper;
use super::node::TeiElement;
use crate::config::TeiConfig;
use crate::types::CatalogType;
use chrono::{Local, NaiveDate};

pub const TEI_NS: &str = "http://www.tei-c.org/ns/1.0";

/// A TEI tree plus the processing instructions placed before its root
#[derive(Debug, Clone, PartialEq)]
pub struct TeiDocument {
    /// (target, content) pairs, in output order
    pub processing_instructions: Vec<(String, String)>,
    pub root: TeiElement,
}

/// Assembles the fixed parts of the output around the mapped entries
pub struct TeiDocumentBuilder {
    title: String,
    catalog_type: CatalogType,
    config: TeiConfig,
    mapper: EntryMapper,
    date: NaiveDate,
}

impl TeiDocumentBuilder {
    pub fn new(title: &str, catalog_type: CatalogType, config: &TeiConfig) -> Self {
        Self {
            title: title.to_string(),
            catalog_type,
            config: config.clone(),
            mapper: EntryMapper::new(title),
            date: Local::now().date_naive(),
        }
    }

    /// Fix the header date (defaults to today)
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn mapper(&self) -> &EntryMapper {
        &self.mapper
    }

    pub fn header(&self, page_count: usize) -> TeiElement {
        let when = self.date.format("%Y-%m-%d").to_string();

        let title_stmt =
            TeiElement::new("titleStmt").child(TeiElement::new("title").text(self.title.as_str()));

        let mut publication_stmt = TeiElement::new("publicationStmt");
        publication_stmt.push(match &self.config.publisher {
            Some(publisher) => TeiElement::new("publisher").text(publisher.as_str()),
            None => TeiElement::new("p").text("Unpublished"),
        });
        publication_stmt.push(TeiElement::new("date").attr("when", when.as_str()).text(when.as_str()));

        let source_desc = TeiElement::new("sourceDesc")
            .child(TeiElement::new("bibl").child(TeiElement::new("title").text(self.title.as_str())))
            .child(TeiElement::new("p").text(format!(
                "Transcribed from {page_count} scanned page(s) described in ALTO; catalog layout: {}.",
                self.catalog_type
            )));

        let encoding_desc = TeiElement::new("encodingDesc").child(
            TeiElement::new("projectDesc").child(TeiElement::new("p").text(format!(
                "Entries extracted by {} {} from OCR output restructured into reading order.",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))),
        );

        let profile_desc = TeiElement::new("profileDesc").child(
            TeiElement::new("langUsage").child(
                TeiElement::new("language")
                    .attr("ident", self.config.language.as_str())
                    .text(self.config.language.as_str()),
            ),
        );

        TeiElement::new("teiHeader")
            .child(
                TeiElement::new("fileDesc")
                    .child(title_stmt)
                    .child(publication_stmt)
                    .child(source_desc),
            )
            .child(encoding_desc)
            .child(profile_desc)
    }

    /// Wrap already-mapped entry items into a complete document
    pub fn build(&self, items: Vec<TeiElement>, page_count: usize) -> TeiDocument {
        let mut list = TeiElement::new("list");
        for item in items {
            list.push(item);
        }

        let root = TeiElement::new("TEI")
            .attr("xmlns", TEI_NS)
            .attr("xml:id", self.mapper.catalog_id())
            .child(self.header(page_count))
            .child(
                TeiElement::new("text")
                    .attr("xml:lang", self.config.language.as_str())
                    .child(TeiElement::new("body").child(list)),
            );

        let mut processing_instructions: Vec<(String, String)> = self
            .config
            .schemas
            .iter()
            .map(|schema| ("xml-model".to_string(), schema.clone()))
            .collect();
        if let Some(stylesheet) = &self.config.stylesheet {
            processing_instructions.push((
                "xml-stylesheet".to_string(),
                format!(r#"type="text/css" href="{stylesheet}""#),
            ));
        }

        TeiDocument {
            processing_instructions,
            root,
        }
    }
}
