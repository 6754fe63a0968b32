//! # taxocorpus CLI
//!
//! Command-line front end for the corpus pipeline.
//!
//! ## Subcommands
//!
//! - `categories`: build, filter and extract taxonomies
//! - `pages`: also list the pages of every taxonomy category
//! - `run`: also collect and save page content
//! - `content`: fetch and print the blocks of one page
//!
//! Settings come from an optional JSON file (`--config`); flags override it.

mod telemetry;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use indicatif::ProgressStyle;
use std::path::PathBuf;
use taxocorpus::category::{Blacklist, FilterMode, TaxonomyMode};
use taxocorpus::content::{ContentCollector, ExtractionConfig};
use taxocorpus::pipeline::{ContentOutcome, Pipeline, PipelineConfig, RunReport, Stage};
use taxocorpus::source::{MediaWikiClient, SourceConfig};
use taxocorpus::timing::TracingTelemetry;
use tracing::{info, instrument};

#[derive(Parser)]
#[command(author, version, about = "Build topic-scoped text corpora from encyclopedia category trees", long_about = None)]
struct Cli {
    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,

    /// Directory for log files
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build, filter and save the taxonomy of every seed
    Categories(RunArgs),

    /// Build taxonomies and list the pages of their categories
    Pages(RunArgs),

    /// Run every phase, including page content
    Run(RunArgs),

    /// Fetch one page and print its text blocks
    Content(ContentArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed domain (repeatable)
    #[arg(short, long = "seed")]
    seeds: Vec<String>,

    /// Maximum expansion depth below each seed
    #[arg(short, long)]
    degree: Option<usize>,

    /// Category excluded on exact match, for every domain (repeatable)
    #[arg(short, long)]
    exact: Vec<String>,

    /// Fragment excluding every category containing it, for every domain (repeatable)
    #[arg(short = 'x', long)]
    substring: Vec<String>,

    /// Skip expanding blacklisted categories while building
    #[arg(long)]
    in_place: bool,

    /// Reference entries already held by an earlier domain instead of copying them
    #[arg(long)]
    shared: bool,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File name prefix
    #[arg(short, long)]
    prefix: Option<String>,

    /// Hide progress bars
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct ContentArgs {
    /// Page title
    #[arg(required = true)]
    title: String,

    /// JSON configuration file (for source and extraction settings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (text|json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let telemetry_guard = telemetry::init_tracing_subscriber(&cli.log_dir, cli.otel)?;
    if telemetry_guard.otel_enabled() {
        info!("Exporting traces and metrics over OTLP");
    }

    match cli.command {
        Some(Commands::Categories(args)) => {
            run_command(args, Stage::Categories).await?;
        }
        Some(Commands::Pages(args)) => {
            run_command(args, Stage::Pages).await?;
        }
        Some(Commands::Run(args)) => {
            run_command(args, Stage::Content).await?;
        }
        Some(Commands::Content(args)) => {
            content_command(args).await?;
        }
        None => {
            let _ = Cli::parse_from(["taxocorpus", "--help"]);
        }
    }

    Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::read_config(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Apply command-line overrides on top of the file configuration
fn apply_overrides(config: &mut PipelineConfig, args: &RunArgs) {
    if !args.seeds.is_empty() {
        config.seeds = args.seeds.clone();
    }
    if let Some(degree) = args.degree {
        config.degree = degree;
    }
    if !args.exact.is_empty() || !args.substring.is_empty() {
        config
            .blacklists
            .extend_wildcard(&Blacklist::new(args.exact.clone(), args.substring.clone()));
    }
    if args.in_place {
        config.filter_mode = FilterMode::InPlace;
    }
    if args.shared {
        config.taxonomy_mode = TaxonomyMode::Shared;
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.clone();
    }
}

#[instrument]
async fn run_command(args: RunArgs, stage: Stage) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref()).await?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let client = MediaWikiClient::new(config.source.clone())?;
    let telemetry = TracingTelemetry;

    println!(
        "Building taxonomies for {} (degree {})...",
        config.seeds.join(", "),
        config.degree
    );

    let mut pipeline = Pipeline::new(&config, &client).with_telemetry(&telemetry);
    if !args.quiet {
        pipeline = pipeline.with_progress(
            ProgressStyle::default_bar()
                .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
                .progress_chars("##-"),
        );
    }

    let report = pipeline.run(stage).await?;
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "Tree: {} categories recorded with {} requests",
        report.tree.len(),
        report.build.requests
    );
    if !report.build.incomplete.is_empty() {
        println!(
            "Warning: {} subcategory listings ended early",
            report.build.incomplete.len()
        );
    }

    for domain in &report.domains {
        println!("\n{}", domain.taxonomy.domain);
        println!(
            "  taxonomy: {} categories, {} removed",
            domain.taxonomy.labels().len(),
            domain.partition.reasons.len()
        );
        if !domain.taxonomy.shared.is_empty() {
            println!("  shared with other domains: {}", domain.taxonomy.shared.len());
        }
        if let Some(pages) = &domain.pages {
            println!(
                "  pages: {} ({} listings incomplete)",
                pages.pages.page_labels().len(),
                pages.incomplete.len()
            );
        }
        match &domain.content {
            Some(ContentOutcome::AlreadySaved) => println!("  content: already saved"),
            Some(ContentOutcome::Collected(collected)) => println!(
                "  content: {} pages ({} fetched, {} cached, {} failed)",
                collected.corpus.len(),
                collected.fetched,
                collected.cached,
                collected.failed.len()
            ),
            None => {}
        }
    }

    println!("\nWrote {} files", report.files.len());
    for file in &report.files {
        println!("  {}", file.display());
    }
}

#[instrument]
async fn content_command(args: ContentArgs) -> anyhow::Result<()> {
    let (source, extraction): (SourceConfig, ExtractionConfig) = match &args.config {
        Some(_) => {
            let config = load_config(args.config.as_ref()).await?;
            (config.source, config.extraction)
        }
        None => (SourceConfig::default(), ExtractionConfig::default()),
    };

    let client = MediaWikiClient::new(source)?;
    let content = ContentCollector::new(&client, &extraction)
        .fetch_page(&args.title)
        .await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        for block in content.iter() {
            match block.kind.heading_level() {
                Some(level) => println!("\n{} {}\n", "#".repeat(level as usize), block.text),
                None => println!("{}", block.text),
            }
        }
    }

    Ok(())
}
