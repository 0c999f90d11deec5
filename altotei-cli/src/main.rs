use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

// Import from altotei-core
use altotei_core::{CatalogProcessor, CatalogType, ExtractionConfig, PipelineStages, RunReport, RunRequest};

// Import CLI utilities
use altotei::KrakenRunner;

#[derive(Parser)]
#[command(name = "altotei")]
#[command(about = "Extract the entries of OCRed exhibition catalogs (ALTO) into a TEI catalog")]
struct Args {
    /// Directory holding one ALTO file per page (images with --segtrans)
    directory: PathBuf,

    /// Path of the TEI file to write
    output: PathBuf,

    /// Catalog layout: none (nulle), simple, double or triple
    #[arg(value_parser = parse_catalog_type)]
    typecat: CatalogType,

    /// Catalog title, also used as its xml:id (default: output file stem)
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Segment and transcribe page images with kraken first
    #[arg(short = 's', long)]
    segtrans: bool,

    /// Validate every ALTO file before processing it
    #[arg(short = 'v', long)]
    verify: bool,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Neither read nor write *_restructuration.xml artifacts
    #[arg(long)]
    no_artifacts: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Dump per-page intermediate outputs (reading order, entries) to a directory
    #[arg(long, value_name = "DIR")]
    dump_stages: Option<PathBuf>,

    /// Path to the kraken binary (default: found on PATH)
    #[arg(long)]
    kraken_bin: Option<String>,

    /// Path to the kraken recognition model
    /// If not specified, uses <data dir>/altotei/models/default.mlmodel
    #[arg(long)]
    kraken_model: Option<String>,
}

fn parse_catalog_type(raw: &str) -> std::result::Result<CatalogType, String> {
    raw.parse()
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("🦀 altotei {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        tracing::error!("❌ Processing failed: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // Load config using the fallback pattern
    let mut config = ExtractionConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        tracing::info!("📋 Loaded config from: {}", config_path);
    } else {
        tracing::info!("📋 Using default config");
    }

    // Apply CLI overrides to config
    if args.no_artifacts {
        config.write_artifacts = false;
        config.reuse_restructured = false;
    }

    let source_dir = if args.segtrans {
        let runner = KrakenRunner::new(args.kraken_bin.as_deref(), args.kraken_model.as_deref())?;
        runner.transcribe_dir(&args.directory, Path::new("."))?
    } else {
        args.directory.clone()
    };

    let processor = CatalogProcessor::new(config)?;
    let request = RunRequest {
        title: args.name.clone(),
        verify: args.verify,
        profile: args.profile,
        capture_stages: args.dump_stages.is_some(),
        ..RunRequest::new(source_dir, args.output.clone(), args.typecat)
    };

    let report = processor.run(&request)?;

    if let Some(stages_dir) = &args.dump_stages {
        save_stages(&report, stages_dir)?;
        tracing::info!("🔬 All stages dumped to: {}", stages_dir.display());
    }

    tracing::info!("💾 TEI catalog saved to: {}", report.output.display());
    Ok(())
}

fn save_stages(report: &RunReport, output_dir: &Path) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    for stages in &report.stages {
        let path = output_dir.join(format!("{}.json", stages.restructured.page_id));
        fs::write(&path, serde_json::to_string_pretty::<PipelineStages>(stages)?)?;
        tracing::info!(
            "  💾 {} ({} lines, {} entries closed)",
            path.display(),
            stages.restructured.lines().count(),
            stages.entries.entries.len()
        );
    }

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "output": report.output,
        "pages": report.pages,
        "entries": report.entry_count(),
        "works": report.work_count(),
        "reused_artifacts": report.reused_artifacts,
        "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });
    let summary_path = output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    tracing::info!("  💾 {}", summary_path.display());

    Ok(())
}
