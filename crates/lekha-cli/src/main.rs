//! Lekha CLI - multi-pass licence recognition from the command line
//!
//! Runs the recognition pipeline on a card image (or on recorded passes), re-validates
//! stored records and prints the effective recognition catalog.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lekha::engine::ReplayScript;
use lekha::{
    CancelToken, DocumentPipeline, EngineFactory, ExtractedRecord, FieldName, LekhaConfig, Outcome, ProcessedDocument,
    ProgressEvent, ProgressSink, ProgressTracker, ValidationLayer, ValidationSummary,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lekha",
    version,
    about = "Multi-pass OCR and field extraction for Nepali driving licences",
    after_help = "EXAMPLES:\n  \
                  # Recognize a card with the native engine\n  \
                  lekha extract card.png\n\n  \
                  # Re-extract from recorded passes, no engine needed\n  \
                  lekha extract --replay card.passes.json --format text\n\n  \
                  # Re-validate a stored record\n  \
                  lekha validate record.json\n\n  \
                  # Show the catalog from ./lekha.toml or the defaults\n  \
                  lekha catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (.toml, .yaml, .json). Defaults to the nearest lekha.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize a card image and print the extracted record with diagnostics
    Extract {
        /// Card image. Optional with --replay.
        image: Option<PathBuf>,

        /// Recorded passes (JSON) to replay instead of running an engine
        #[arg(long)]
        replay: Option<PathBuf>,

        /// Override the worker pool size
        #[arg(long)]
        pool_size: Option<usize>,

        /// Override the per-pass timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Grayscale and contrast-stretch the image first (feature `preprocessing`)
        #[arg(long)]
        enhance: bool,

        /// Print progress milestones to stderr
        #[arg(long)]
        progress: bool,
    },

    /// Re-validate a stored record (or a full `extract` result) from JSON
    Validate {
        record: PathBuf,
    },

    /// Print the effective recognition catalog
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            image,
            replay,
            pool_size,
            timeout_ms,
            enhance,
            progress,
        } => {
            let mut config = config;
            if pool_size.is_some() {
                config.pool_size = pool_size;
            }
            if timeout_ms.is_some() {
                config.job_timeout_ms = timeout_ms;
            }
            let options = ExtractOptions {
                image,
                replay,
                enhance,
                progress,
            };
            extract(&config, options, cli.format).await
        }
        Commands::Validate { record } => validate(&config, &record, cli.format),
        Commands::Catalog => catalog(&config, cli.format),
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "lekha=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

fn load_config(path: Option<&Path>) -> Result<LekhaConfig> {
    match path {
        Some(path) => {
            LekhaConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(LekhaConfig::discover()
            .context("Failed to discover lekha.toml")?
            .unwrap_or_default()),
    }
}

struct ExtractOptions {
    image: Option<PathBuf>,
    replay: Option<PathBuf>,
    enhance: bool,
    progress: bool,
}

async fn extract(config: &LekhaConfig, options: ExtractOptions, format: OutputFormat) -> Result<ExitCode> {
    let image: Arc<[u8]> = match (&options.image, &options.replay) {
        (Some(path), _) => Arc::from(std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?),
        (None, Some(_)) => Arc::from(Vec::new()),
        (None, None) => anyhow::bail!("an image path is required unless --replay is given"),
    };

    let factory = engine_factory(options.replay.as_deref())?;
    let mut pipeline = DocumentPipeline::from_config(factory, config).context("Failed to start worker pool")?;
    if options.enhance {
        pipeline = with_enhancement(pipeline)?;
    }

    let progress = if options.progress {
        let sink: Arc<dyn ProgressSink> =
            Arc::new(|event: &ProgressEvent| eprintln!("[{:>3}%] {}", event.percent, event.stage));
        ProgressTracker::new(Some(sink))
    } else {
        ProgressTracker::disabled()
    };

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let outcome = pipeline.process(image, &progress, &cancel).await;
    pipeline.pool().shutdown();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => match &outcome {
            Outcome::Completed(document) => print_document(document),
            Outcome::Failed(reason) => println!("No record: {} ({})", reason, reason.code()),
            Outcome::Cancelled => println!("Cancelled"),
        },
    }

    Ok(match outcome {
        Outcome::Completed(_) => ExitCode::SUCCESS,
        Outcome::Failed(_) => ExitCode::from(1),
        Outcome::Cancelled => ExitCode::from(130),
    })
}

fn engine_factory(replay: Option<&Path>) -> Result<Arc<dyn EngineFactory>> {
    if let Some(path) = replay {
        let script = ReplayScript::from_json_file(path)
            .with_context(|| format!("Failed to load recorded passes {}", path.display()))?;
        return Ok(Arc::new(script.into_factory()));
    }

    #[cfg(feature = "tesseract")]
    return Ok(Arc::new(lekha::engine::TesseractEngine::factory()?));

    #[cfg(not(feature = "tesseract"))]
    anyhow::bail!("no recognition engine available: pass --replay or build with --features tesseract");
}

#[cfg(feature = "preprocessing")]
fn with_enhancement(pipeline: DocumentPipeline) -> Result<DocumentPipeline> {
    Ok(pipeline.with_preprocessor(Arc::new(lekha::preprocessing::ContrastStretch::default())))
}

#[cfg(not(feature = "preprocessing"))]
fn with_enhancement(_pipeline: DocumentPipeline) -> Result<DocumentPipeline> {
    anyhow::bail!("--enhance requires building with --features preprocessing")
}

fn validate(config: &LekhaConfig, path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let record = parse_record(&content).with_context(|| format!("{} is not a record", path.display()))?;

    let summary = ValidationLayer::new(config.validation.clone()).validate(&record);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_summary(&summary),
    }

    Ok(if summary.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Accepts a bare record, a processed document, or a completed `extract` outcome.
fn parse_record(content: &str) -> Result<ExtractedRecord> {
    let mut value: serde_json::Value = serde_json::from_str(content)?;
    if value.get("status").and_then(|s| s.as_str()) == Some("completed")
        && let Some(inner) = value.get_mut("value")
    {
        value = inner.take();
    }
    if let Some(record) = value.get_mut("record") {
        value = record.take();
    }
    Ok(serde_json::from_value(value)?)
}

fn catalog(config: &LekhaConfig, format: OutputFormat) -> Result<ExitCode> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config.catalog)?),
        OutputFormat::Text => {
            for (index, entry) in config.catalog.iter().enumerate() {
                let whitelist = if entry.character_whitelist.is_empty() {
                    "unrestricted".to_string()
                } else {
                    format!("{} chars", entry.character_whitelist.chars().count())
                };
                println!(
                    "{}. {:<12} psm={:<2} lang={:<10} whitelist={} interword_spacing={}",
                    index + 1,
                    entry.name,
                    entry.page_segmentation_mode.as_u8(),
                    entry.language,
                    whitelist,
                    entry.preserve_interword_spacing
                );
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_document(document: &ProcessedDocument) {
    for field in FieldName::ALL {
        let Some(extracted) = document.record.get(field) else {
            continue;
        };
        match &extracted.value {
            Some(value) => println!(
                "{:<20} {:<36} {:.2}  [{}]",
                field.as_str(),
                value,
                extracted.confidence,
                extracted.sources.join(", ")
            ),
            None => println!("{:<20} -", field.as_str()),
        }
        for alternative in &extracted.alternatives {
            println!(
                "{:<20}   or {:<33} {:.2}  [{}]",
                "",
                alternative.value,
                alternative.confidence,
                alternative.sources.join(", ")
            );
        }
    }

    if !document.record.failed_passes.is_empty() {
        println!();
        println!("Failed passes: {}", document.record.failed_passes.join(", "));
    }
    println!();
    print_summary(&document.validation);
}

fn print_summary(summary: &ValidationSummary) {
    for message in summary.messages() {
        println!("{}", message);
    }
    println!(
        "Valid: {} ({} errors, {} warnings)",
        if summary.is_valid() { "yes" } else { "no" },
        summary.error_count(),
        summary.warning_count()
    );
}
