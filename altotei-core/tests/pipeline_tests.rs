//! End-to-end pipeline tests.
//!
//! Each test writes small ALTO pages into a temporary directory, runs the
//! whole conversion and asserts on the report and the TEI file:
//!
//! - reading order: idempotent, never loses or invents a line
//! - numbering: contiguous entry and work numbers across pages
//! - segmentation: cross-page continuation, layout arity, no text loss
//! - failure policy: degenerate pages pass through, malformed pages abort
//! - artifacts: written next to the pages, reused while the source is unchanged

use altotei_core::loaders::alto::parse_alto;
use altotei_core::loaders::write_alto;
use altotei_core::{
    AltoLoader, AltoTeiError, CatalogProcessor, CatalogType, Document, ExtractionConfig, FieldRole,
    PageLoader, RunReport, RunRequest, Restructurer, Warning, Work,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Fixture helpers
// ============================================================================

const LINE_HEIGHT: f32 = 30.0;
const LINE_PITCH: f32 = 40.0;

/// (block id, HPOS, VPOS, WIDTH, line texts); an empty text is a line without String
type BlockSpec<'a> = (&'a str, f32, f32, f32, &'a [&'a str]);

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

fn alto(blocks: &[BlockSpec]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <alto xmlns=\"http://www.loc.gov/standards/alto/ns-v4#\">\n\
         <Layout><Page WIDTH=\"2000\" HEIGHT=\"3000\"><PrintSpace>\n",
    );
    for (id, x, y, width, lines) in blocks {
        let height = LINE_PITCH * lines.len().max(1) as f32;
        xml.push_str(&format!(
            "<TextBlock ID=\"{id}\" HPOS=\"{x}\" VPOS=\"{y}\" WIDTH=\"{width}\" HEIGHT=\"{height}\">\n"
        ));
        for (i, text) in lines.iter().enumerate() {
            let line_y = y + LINE_PITCH * i as f32;
            let open = format!(
                "<TextLine ID=\"{id}_l{i}\" HPOS=\"{x}\" VPOS=\"{line_y}\" WIDTH=\"{width}\" HEIGHT=\"{LINE_HEIGHT}\""
            );
            if text.is_empty() {
                xml.push_str(&format!("{open}/>\n"));
            } else {
                xml.push_str(&format!(
                    "{open}><String CONTENT=\"{}\"/></TextLine>\n",
                    escape(text)
                ));
            }
        }
        xml.push_str("</TextBlock>\n");
    }
    xml.push_str("</PrintSpace></Page></Layout>\n</alto>\n");
    xml
}

/// One single-block page per entry of `pages`, named p001.xml, p002.xml, ...
fn write_pages(dir: &Path, pages: &[&[&str]]) {
    for (index, lines) in pages.iter().enumerate() {
        let markup = alto(&[("b1", 100.0, 100.0, 800.0, lines)]);
        fs::write(dir.join(format!("p{:03}.xml", index + 1)), markup).unwrap();
    }
}

struct Run {
    source: TempDir,
    out: TempDir,
}

impl Run {
    fn new() -> Self {
        Self {
            source: tempfile::tempdir().unwrap(),
            out: tempfile::tempdir().unwrap(),
        }
    }

    fn output(&self) -> PathBuf {
        self.out.path().join("salon.xml")
    }

    fn request(&self, catalog_type: CatalogType) -> RunRequest {
        RunRequest {
            capture_stages: true,
            ..RunRequest::new(self.source.path(), self.output(), catalog_type)
        }
    }

    fn run(&self, catalog_type: CatalogType) -> altotei_core::Result<RunReport> {
        CatalogProcessor::new(ExtractionConfig::default())?.run(&self.request(catalog_type))
    }

    fn tei(&self) -> String {
        fs::read_to_string(self.output()).unwrap()
    }
}

fn works(document: &Document) -> Vec<&Work> {
    document.entries.iter().flat_map(|entry| entry.works.iter()).collect()
}

/// Every non-blank input line is found verbatim in a field, or is the heading
/// of a work whose marker, creator and title were taken from it
fn assert_no_text_loss(input: &[&str], document: &Document) {
    let works = works(document);
    let fragments: Vec<&str> = works
        .iter()
        .flat_map(|work| work.fields.values().flatten().map(String::as_str))
        .collect();

    for line in input.iter().map(|line| line.trim()).filter(|line| !line.is_empty()) {
        if fragments.contains(&line) {
            continue;
        }
        let heading = works.iter().any(|work| {
            let (Some(marker), Some(creator), Some(title)) = (
                work.marker.as_deref(),
                work.field_text(FieldRole::Creator),
                work.field_text(FieldRole::Title),
            ) else {
                return false;
            };
            line.starts_with(marker) && line.contains(&creator) && line.ends_with(&title)
        });
        assert!(heading, "line lost: {line}");
    }
}

const SIX_WORKS: [&str; 8] = [
    "1. DURAND (Paul) — Vue de Rouen",
    "Huile sur toile",
    "2. MARTIN (Jules) — Le Port",
    "0,55 x 0,46",
    "3. LEROY (Louis) — Étude",
    "4. MOREAU (Gustave) — Salomé",
    "5. BONNAT (Léon) — Portrait de M. X",
    "6. CAROLUS-DURAN — La Dame au gant",
];

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn two_simple_pages_give_five_numbered_entries() {
    let run = Run::new();
    write_pages(
        run.source.path(),
        &[
            &[
                "1. DURAND (Paul) — Vue de Rouen",
                "Huile sur toile",
                "2. MARTIN (Jules) — Le Port",
                "1885",
                "3. LEROY (Louis) — Étude",
            ],
            &["4. MOREAU (Gustave) — Salomé", "5. BONNAT (Léon) — Portrait"],
        ],
    );

    let report = run.run(CatalogType::Simple).unwrap();

    assert_eq!(report.pages, vec!["p001", "p002"]);
    let entry_numbers: Vec<_> = report.document.entries.iter().map(|e| e.number).collect();
    assert_eq!(entry_numbers, vec![1, 2, 3, 4, 5]);
    for entry in &report.document.entries {
        assert_eq!(entry.works.len(), 1);
        assert_eq!(entry.works[0].number, entry.number);
    }
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    let tei = run.tei();
    assert!(tei.contains(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0" xml:id="salon">"#));
    assert!(tei.contains(r#"<item type="entry" n="5" xml:id="salon_e5">"#));
    assert!(tei.contains("<persName>DURAND (Paul)</persName>"));
    assert!(tei.contains("<title>Vue de Rouen</title>"));
    assert!(tei.contains("<material>Huile sur toile</material>"));
    assert!(tei.contains("<date>1885</date>"));
}

#[test]
fn work_split_by_a_page_break_stays_one_entry() {
    let run = Run::new();
    write_pages(
        run.source.path(),
        &[
            &["1. DURAND (Paul) — Vue de Rouen", "(Exposé au Salon"],
            &["de 1880, n° 12.)", "Huile sur toile", "2. MARTIN (Jules) — Le Port"],
        ],
    );

    let report = run.run(CatalogType::Simple).unwrap();

    assert_eq!(report.entry_count(), 2);
    let first = &report.document.entries[0].works[0];
    assert_eq!(
        first.field(FieldRole::Notes).unwrap(),
        &["(Exposé au Salon", "de 1880, n° 12.)"]
    );
    assert_eq!(first.field_text(FieldRole::Medium).as_deref(), Some("Huile sur toile"));

    // Nothing closes on the first page, the open entry waits for page two
    assert!(report.stages[0].entries.entries.is_empty());
    assert_eq!(report.stages[1].entries.entries.len(), 1);

    assert!(run.tei().contains("<note>(Exposé au Salon<lb/>de 1880, n° 12.)</note>"));
}

#[test]
fn layout_arity_groups_works_into_entries() {
    let expected = [
        (CatalogType::Simple, 6, 1),
        (CatalogType::Double, 3, 2),
        (CatalogType::Triple, 2, 3),
    ];
    for (catalog_type, entries, per_entry) in expected {
        let run = Run::new();
        write_pages(run.source.path(), &[&SIX_WORKS]);
        let report = run.run(catalog_type).unwrap();

        assert_eq!(report.entry_count(), entries, "{catalog_type}");
        assert!(report
            .document
            .entries
            .iter()
            .all(|entry| entry.works.len() == per_entry));
        assert_eq!(report.work_count(), 6);
        assert_no_text_loss(&SIX_WORKS, &report.document);
    }
}

#[test]
fn unstructured_layout_keeps_lines_verbatim() {
    let run = Run::new();
    write_pages(run.source.path(), &[&SIX_WORKS]);
    let report = run.run(CatalogType::None).unwrap();

    assert_eq!(report.entry_count(), 6);
    for work in works(&report.document) {
        assert_eq!(work.marker, None);
        assert_eq!(work.roles().collect::<Vec<_>>(), vec![FieldRole::Unclassified]);
    }
    assert_eq!(
        report.document.entries[0].works[0].field(FieldRole::Unclassified).unwrap(),
        &["1. DURAND (Paul) — Vue de Rouen", "Huile sur toile"]
    );
    assert_no_text_loss(&SIX_WORKS, &report.document);
    assert!(run.tei().contains(r#"<ab type="unclassified">"#));
}

#[test]
fn numbering_is_contiguous_across_pages() {
    let run = Run::new();
    write_pages(
        run.source.path(),
        &[
            &["1. A — a", "2. B — b"],
            &["3. C — c", "Coll. M. Dupont", "4. D — d", "5. E — e"],
            &["6. F — f", "7. G — g"],
        ],
    );

    let report = run.run(CatalogType::Triple).unwrap();

    let entry_numbers: Vec<_> = report.document.entries.iter().map(|e| e.number).collect();
    assert_eq!(entry_numbers, vec![1, 2, 3]);
    let work_numbers: Vec<_> = works(&report.document).iter().map(|w| w.number).collect();
    assert_eq!(work_numbers, (1..=7).collect::<Vec<_>>());
    assert_eq!(
        report.document.entries[0].works[2].field_text(FieldRole::Owner).as_deref(),
        Some("Coll. M. Dupont")
    );
    assert_eq!(
        report.warnings,
        vec![Warning::IncompleteEntry {
            entry_number: 3,
            works: 1,
            expected: 3
        }]
    );
}

#[test]
fn two_columns_are_read_column_by_column() {
    let run = Run::new();
    let markup = alto(&[
        ("right_top", 1100.0, 400.0, 800.0, &["3. C — c", "Huile sur toile", "1880"]),
        ("left_top", 100.0, 400.0, 800.0, &["1. A — a", "Bronze", "1890"]),
        ("heading", 100.0, 100.0, 1800.0, &["SALON DE 1890", "PEINTURE"]),
        ("left_bottom", 100.0, 700.0, 800.0, &["2. B — b", "Marbre", "1885"]),
        ("right_bottom", 1100.0, 700.0, 800.0, &["4. D — d", "Pastel", "1889"]),
    ]);
    fs::write(run.source.path().join("p001.xml"), markup).unwrap();

    let report = run.run(CatalogType::Simple).unwrap();

    let markers: Vec<_> = works(&report.document)
        .iter()
        .map(|work| work.marker.clone().unwrap())
        .collect();
    assert_eq!(markers, vec!["1.", "2.", "3.", "4."]);
    assert_eq!(
        report.document.entries[0].works[0].field(FieldRole::Unclassified).unwrap(),
        &["SALON DE 1890", "PEINTURE"]
    );
    assert!(matches!(
        report.warnings.as_slice(),
        [Warning::OrphanLines { count: 2, .. }]
    ));
}

// ============================================================================
// Reading order properties
// ============================================================================

#[test]
fn reading_order_is_idempotent_and_preserves_lines() {
    let column_heading: &[BlockSpec] = &[
        ("right", 1100.0, 400.0, 800.0, &["3. C — c", "Huile"]),
        ("left", 100.0, 400.0, 800.0, &["1. A — a", "Bronze"]),
        ("head", 110.0, 340.0, 600.0, &["CATALOGUE"]),
    ];
    // One-line heading spanning both columns, just above them
    let page_heading: &[BlockSpec] = &[
        ("heading", 100.0, 340.0, 1800.0, &["PEINTURE"]),
        ("left_top", 100.0, 400.0, 800.0, &["1. A — a", "Bronze"]),
        ("right_top", 1100.0, 400.0, 800.0, &["3. C — c", "Huile"]),
        ("left_bottom", 100.0, 700.0, 800.0, &["2. B — b", "Marbre"]),
        ("right_bottom", 1100.0, 700.0, 800.0, &["4. D — d", "Pastel"]),
    ];
    let restructurer = Restructurer::spatial(&ExtractionConfig::default().restructuring);

    for blocks in [column_heading, page_heading] {
        let page = AltoLoader::new().parse_markup(&alto(blocks), "p001").unwrap();

        let first = restructurer.restructure(&page).page;
        let artifact = parse_alto(&write_alto(&first, None).unwrap(), "p001").unwrap();
        let second = restructurer.restructure(&artifact).page;
        assert_eq!(first.line_texts(), second.line_texts());

        let mut before: Vec<_> = page.lines().map(|line| line.id.clone()).collect();
        let mut after: Vec<_> = first.lines().map(|line| line.id.clone()).collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    let page = AltoLoader::new().parse_markup(&alto(page_heading), "p001").unwrap();
    let first = restructurer.restructure(&page).page;
    assert_eq!(
        first.line_texts(),
        vec![
            "PEINTURE", "1. A — a", "Bronze", "2. B — b", "Marbre", "3. C — c", "Huile",
            "4. D — d", "Pastel",
        ]
    );
}

#[test]
fn degenerate_page_keeps_source_order_with_a_warning() {
    let run = Run::new();
    let markup = alto(&[
        ("b_low", 100.0, 700.0, 800.0, &["2. MARTIN (Jules) — Le Port"]),
        ("b_high", 100.0, 100.0, 0.0, &["1. DURAND (Paul) — Vue de Rouen"]),
    ]);
    fs::write(run.source.path().join("p001.xml"), markup).unwrap();

    let report = run.run(CatalogType::Simple).unwrap();

    assert!(report.warnings.contains(&Warning::DegenerateGeometry {
        page_id: "p001".to_string(),
        block_ids: vec!["b_high".to_string()],
    }));
    let restructured = &report.stages[0].restructured;
    assert!(restructured.degenerate);
    assert_eq!(
        restructured.line_texts(),
        vec!["2. MARTIN (Jules) — Le Port", "1. DURAND (Paul) — Vue de Rouen"]
    );
    assert!(run.output().exists());

    // The reused artifact still reports the unusable geometry
    let second = run.run(CatalogType::Simple).unwrap();
    assert_eq!(second.reused_artifacts, 1);
    assert!(second.stages[0].restructured.degenerate);
    assert!(second.warnings.contains(&Warning::DegenerateGeometry {
        page_id: "p001".to_string(),
        block_ids: vec!["b_high".to_string()],
    }));
    assert_eq!(second.document, report.document);
}

// ============================================================================
// Failure policy and input selection
// ============================================================================

#[test]
fn malformed_page_aborts_without_output() {
    let run = Run::new();
    write_pages(run.source.path(), &[&["1. A — a"]]);
    fs::write(run.source.path().join("p002.xml"), "<alto><Layout><Page>").unwrap();

    let err = run.run(CatalogType::Simple).unwrap_err();

    match err {
        AltoTeiError::MalformedInput { path, .. } => {
            assert_eq!(path.file_name().unwrap(), "p002.xml")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!run.output().exists());
}

#[test]
fn hidden_foreign_and_artifact_files_are_ignored() {
    let run = Run::new();
    write_pages(run.source.path(), &[&["1. A — a"]]);
    let dir = run.source.path();
    fs::write(dir.join(".p000.xml"), "not xml at all").unwrap();
    fs::write(dir.join("readme.txt"), "notes").unwrap();
    fs::write(dir.join("p000_restructuration.xml"), "<broken").unwrap();

    let report = run.run(CatalogType::Simple).unwrap();
    assert_eq!(report.pages, vec!["p001"]);
}

#[test]
fn verification_rejects_lines_without_text() {
    let run = Run::new();
    write_pages(run.source.path(), &[&["1. A — a", ""]]);

    let mut request = run.request(CatalogType::Simple);
    request.verify = true;
    let err = CatalogProcessor::new(ExtractionConfig::default())
        .unwrap()
        .run(&request)
        .unwrap_err();
    assert!(matches!(err, AltoTeiError::ValidationFailed { .. }));
    assert!(!run.output().exists());

    // Without verification the blank line is simply skipped
    let report = run.run(CatalogType::Simple).unwrap();
    assert_eq!(report.work_count(), 1);
}

// ============================================================================
// Artifacts
// ============================================================================

#[test]
fn artifacts_are_reused_until_the_source_changes() {
    let run = Run::new();
    write_pages(run.source.path(), &[&["1. DURAND (Paul) — Vue de Rouen"]]);
    let artifact = run.source.path().join("p001_restructuration.xml");

    let first = run.run(CatalogType::Simple).unwrap();
    assert_eq!(first.reused_artifacts, 0);
    assert!(artifact.exists());

    // A manual correction of the artifact survives the next run
    let corrected = fs::read_to_string(&artifact)
        .unwrap()
        .replace("Vue de Rouen", "Vue du Havre");
    fs::write(&artifact, corrected).unwrap();

    let second = run.run(CatalogType::Simple).unwrap();
    assert_eq!(second.reused_artifacts, 1);
    assert_eq!(
        second.document.entries[0].works[0].field_text(FieldRole::Title).as_deref(),
        Some("Vue du Havre")
    );

    // Editing the source makes the artifact stale
    write_pages(run.source.path(), &[&["1. DURAND (Paul) — Vue de Dieppe"]]);
    let third = run.run(CatalogType::Simple).unwrap();
    assert_eq!(third.reused_artifacts, 0);
    assert_eq!(
        third.document.entries[0].works[0].field_text(FieldRole::Title).as_deref(),
        Some("Vue de Dieppe")
    );
}

#[test]
fn artifacts_can_be_disabled() {
    let run = Run::new();
    write_pages(run.source.path(), &[&["1. A — a"]]);

    let config = ExtractionConfig {
        write_artifacts: false,
        reuse_restructured: false,
        ..ExtractionConfig::default()
    };
    CatalogProcessor::new(config)
        .unwrap()
        .run(&run.request(CatalogType::Simple))
        .unwrap();

    assert!(!run.source.path().join("p001_restructuration.xml").exists());
    assert!(run.output().exists());
}
