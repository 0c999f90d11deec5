use crate::config::ExtractionConfig;
use crate::error::{Result, Warning};
use crate::loaders::{AltoLoader, PageLoader};
use crate::reading_order::Restructurer;
use crate::segmentation::{EntrySegmenter, PageEntries, SegmentationState};
use crate::storage::{calculate_source_digest, ArtifactStore, FileArtifactStore, NoOpArtifactStore};
use crate::tei::TeiDocumentBuilder;
use crate::types::*;
use crate::validation::validate_alto;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Captured intermediate outputs for one page
/// Used for diagnostics (`--dump-stages`) and tests
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStages {
    pub source: PathBuf,
    pub restructured: RestructuredPage,
    pub entries: PageEntries,
    pub artifact_reused: bool,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        // Per-page steps accumulate under one name
        match self.timings.iter_mut().find(|(name, _)| name == step_name) {
            Some((_, total)) => *total += elapsed,
            None => self.timings.push((step_name.to_string(), elapsed)),
        }
        tracing::debug!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        tracing::info!("📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            tracing::info!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        tracing::info!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// One conversion: a directory of pages into one TEI file
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source_dir: PathBuf,
    pub output: PathBuf,
    pub catalog_type: CatalogType,
    /// Catalog title and id; defaults to the output file stem
    pub title: Option<String>,
    /// Validate each page before processing it
    pub verify: bool,
    pub profile: bool,
    /// Keep per-page intermediate outputs in the report
    pub capture_stages: bool,
}

impl RunRequest {
    pub fn new(source_dir: impl Into<PathBuf>, output: impl Into<PathBuf>, catalog_type: CatalogType) -> Self {
        Self {
            source_dir: source_dir.into(),
            output: output.into(),
            catalog_type,
            title: None,
            verify: false,
            profile: false,
            capture_stages: false,
        }
    }

    pub fn catalog_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.strip_suffix(".xml").unwrap_or(title).to_string();
        }
        self.output
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "catalog".to_string())
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub output: PathBuf,
    pub pages: Vec<String>,
    pub document: Document,
    pub warnings: Vec<Warning>,
    pub reused_artifacts: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<PipelineStages>,
}

impl RunReport {
    pub fn entry_count(&self) -> usize {
        self.document.entries.len()
    }

    pub fn work_count(&self) -> usize {
        self.document.work_count()
    }
}

pub struct CatalogProcessor {
    config: ExtractionConfig,
    loader: Box<dyn PageLoader>,
    store: Box<dyn ArtifactStore>,
    restructurer: Restructurer,
}

impl CatalogProcessor {
    /// ALTO input, spatial reading order, artifacts next to the pages
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let store: Box<dyn ArtifactStore> = if config.write_artifacts || config.reuse_restructured {
            Box::new(FileArtifactStore::new(&config.input.artifact_marker))
        } else {
            Box::new(NoOpArtifactStore::new())
        };
        let restructurer = Restructurer::spatial(&config.restructuring);
        Self::new_with_dependencies(config, Box::new(AltoLoader::new()), store, restructurer)
    }

    /// Create CatalogProcessor with full dependency injection
    pub fn new_with_dependencies(
        config: ExtractionConfig,
        loader: Box<dyn PageLoader>,
        store: Box<dyn ArtifactStore>,
        restructurer: Restructurer,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            store,
            restructurer,
        })
    }

    /// Page files of `dir` in name order, artifacts and foreign files excluded
    pub fn list_page_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let input = &self.config.input;
        let extension = input.extension.trim_start_matches('.').to_lowercase();

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
                continue;
            };
            if input.skip_hidden && name.starts_with('.') {
                continue;
            }
            if name.contains(&input.artifact_marker) {
                continue;
            }
            let matches_extension = path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == extension);
            if !matches_extension || !self.loader.supports_file_type(&path) {
                tracing::debug!("   ⏭️  skipping {}", name);
                continue;
            }
            files.push(path);
        }

        files.sort();
        Ok(files)
    }

    /// Load one page and put it in reading order, reusing a matching artifact
    ///
    /// Returns the restructured page, the warnings raised and whether a stored
    /// artifact was reused.
    pub fn restructure_file(&self, path: &Path) -> Result<(RestructuredPage, Vec<Warning>, bool)> {
        let bytes = std::fs::read(path)?;
        let digest = calculate_source_digest(&bytes);

        if self.config.reuse_restructured {
            if let Some(stored) = self.store.load(path, &digest)? {
                tracing::info!("♻️  {}: reusing stored reading order", stored.page.page_id);
                return Ok((stored.page, stored.warnings, true));
            }
        }

        tracing::debug!("   📄 {} ({} loader)", path.display(), self.loader.name());
        let page = self.loader.load_file(path)?;
        let restructured = self.restructurer.restructure(&page);
        if self.config.write_artifacts {
            self.store.store(path, &restructured.page, &digest)?;
        }
        Ok((restructured.page, restructured.warnings, false))
    }

    /// Convert every page of the request's directory into one TEI file
    ///
    /// The output is written only once all pages went through; any error
    /// aborts the run before that.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(request.profile);

        let files = self.list_page_files(&request.source_dir)?;
        if files.is_empty() {
            tracing::warn!(
                "⚠️  No page files in {}, the catalog will be empty",
                request.source_dir.display()
            );
        }
        tracing::info!(
            "📚 Converting {} page(s) from {} as a {} catalog ({} reading order)",
            files.len(),
            request.source_dir.display(),
            request.catalog_type,
            self.restructurer.strategy_name()
        );

        let segmenter = EntrySegmenter::new(request.catalog_type, &self.config.segmentation)?;
        let title = request.catalog_title();
        let builder = TeiDocumentBuilder::new(&title, request.catalog_type, &self.config.tei);

        let mut state = SegmentationState::new();
        let mut report = RunReport {
            output: request.output.clone(),
            pages: Vec::with_capacity(files.len()),
            document: Document::new(),
            warnings: Vec::new(),
            reused_artifacts: 0,
            stages: Vec::new(),
        };
        let mut items = Vec::new();

        for path in &files {
            if request.verify {
                let validation = profiler
                    .time_step("1. Validation", || validate_alto(path, &self.config.segmentation))?;
                validation.log();
                validation.into_result()?;
            }

            let (restructured, warnings, reused) =
                profiler.time_step("2. Load + Reading Order", || self.restructure_file(path))?;
            report.warnings.extend(warnings);
            if reused {
                report.reused_artifacts += 1;
            }

            let page_entries =
                profiler.time_step("3. Segmentation", || segmenter.segment(&restructured, &mut state));
            items.extend(profiler.time_step("4. TEI Mapping", || {
                builder.mapper().map_entries(&page_entries.entries)
            }));

            report.pages.push(restructured.page_id.clone());
            report.warnings.extend(page_entries.warnings.iter().cloned());
            report.document.append(page_entries.entries.iter().cloned());
            if request.capture_stages {
                report.stages.push(PipelineStages {
                    source: path.clone(),
                    restructured,
                    entries: page_entries,
                    artifact_reused: reused,
                });
            }
        }

        let tail = segmenter.finish(state);
        items.extend(builder.mapper().map_entries(&tail.entries));
        report.warnings.extend(tail.warnings);
        report.document.append(tail.entries);

        let tei = builder.build(items, files.len());
        profiler.time_step("5. TEI Output", || tei.save(&request.output))?;

        profiler.print_summary();
        tracing::info!(
            "✅ {} entries, {} works, {} warning(s) → {} ({:.3}s)",
            report.entry_count(),
            report.work_count(),
            report.warnings.len(),
            request.output.display(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(report)
    }
}
