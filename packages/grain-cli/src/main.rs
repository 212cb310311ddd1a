//! `grains`: scrape news articles and record their claim graphs.
//!
//! Every subcommand builds its collaborators explicitly from configuration
//! (environment, `.env`, then flags) and passes them into the library.

mod config;
mod output;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use grain_graph::ai::{ExtractionShape, OpenAIExtractor};
use grain_graph::matching::DEFAULT_SEMANTIC_CANDIDATES;
use grain_graph::{
    read_url_list, AnyMatcher, BatchConfig, BuilderConfig, ClaimExtractor, ClaimGraphBuilder,
    HttpTextSource, IndexStore, JournalLedger, JsonFileStore, LedgerWriter, MatchPolicy,
    MintTarget, Pipeline, RelayLedger, RetryingLedger, StaticTextSource, TextSource, TopicIndex,
    TopicJudge, DEFAULT_INDEX_CAPACITY,
};
use openai_client::OpenAIClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{AppConfig, LedgerKind};

#[derive(Parser)]
#[command(name = "grains")]
#[command(about = "Record news articles as linked claim graphs on a ledger")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Topic index file (overrides GRAIN_INDEX_PATH)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Ledger writer: journal or relay (overrides GRAIN_LEDGER)
    #[arg(long, global = true)]
    ledger: Option<LedgerKind>,

    /// Topic matching: containment, exact or semantic (overrides GRAIN_MATCH_POLICY)
    #[arg(long, global = true)]
    match_policy: Option<MatchPolicy>,

    /// Extraction shape: hierarchy or flat
    #[arg(long, global = true, default_value_t = ExtractionShape::Hierarchy)]
    shape: ExtractionShape,

    /// Add a "Source: <url>" leaf under every terminal claim
    #[arg(long, global = true)]
    provenance: bool,

    /// Print machine-readable JSON instead of colored text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract and record one article
    Run {
        /// Article URL
        #[arg(required_unless_present = "text")]
        url: Option<String>,

        /// Use this text instead of fetching (requires --source)
        #[arg(long, requires = "source", conflicts_with = "url")]
        text: Option<String>,

        /// Source URL recorded with --text
        #[arg(long)]
        source: Option<String>,
    },

    /// Record several articles in sequence
    Batch {
        /// Article URLs
        urls: Vec<String>,

        /// File with one URL per line
        #[arg(long)]
        file: Option<PathBuf>,

        /// Clear the topic index before the first URL
        #[arg(long)]
        fresh: bool,

        /// Pause between URLs in milliseconds
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,
    },

    /// Fetch and extract an article, print the extraction, write nothing
    Extract { url: String },

    /// Inspect or reset the topic index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// List remembered topics, newest first
    List,
    /// Forget every remembered topic
    Clear,
    /// Print the index file location
    Path,
}

type CliPipeline =
    Pipeline<Arc<dyn TextSource>, OpenAIExtractor, Arc<dyn LedgerWriter>, AnyMatcher, JsonFileStore>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grain_graph=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(index) = cli.index.clone() {
        config.index_path = index;
    }
    if let Some(ledger) = cli.ledger {
        config.ledger = ledger;
    }
    if let Some(policy) = cli.match_policy {
        config.match_policy = policy;
    }

    tracing::debug!(
        index = %config.index_path.display(),
        ledger = %config.ledger,
        match_policy = %config.match_policy,
        "Configuration loaded"
    );

    let options = cli_options(&cli);

    match cli.command {
        Commands::Run { url, text, source } => {
            let (source, url): (Arc<dyn TextSource>, String) = match (text, source, url) {
                (Some(text), Some(source_url), _) => (Arc::new(StaticTextSource::new(text)), source_url),
                (None, _, Some(url)) => (Arc::new(http_source(&config)), url),
                _ => bail!("either a URL or --text with --source is required"),
            };
            cmd_run(&config, &options, source, &url).await
        }
        Commands::Batch {
            urls,
            file,
            fresh,
            delay_ms,
        } => {
            cmd_batch(
                &config,
                &options,
                urls,
                file,
                fresh,
                Duration::from_millis(delay_ms),
            )
            .await
        }
        Commands::Extract { url } => cmd_extract(&config, options.shape, &url).await,
        Commands::Index { action } => cmd_index(&config, action, options.json),
    }
}

/// Flags shared by the commands that build a pipeline.
struct RunOptions {
    shape: ExtractionShape,
    provenance: bool,
    json: bool,
}

fn cli_options(cli: &Cli) -> RunOptions {
    RunOptions {
        shape: cli.shape,
        provenance: cli.provenance,
        json: cli.json,
    }
}

// ============================================================================
// Wiring
// ============================================================================

fn http_source(config: &AppConfig) -> HttpTextSource {
    HttpTextSource::new().with_reader_url(config.reader_url.clone())
}

fn build_extractor(config: &AppConfig, shape: ExtractionShape) -> Result<OpenAIExtractor> {
    let client = OpenAIClient::new(config.require_openai_key()?);
    Ok(OpenAIExtractor::new(client)
        .with_model(config.openai_model.clone())
        .with_shape(shape))
}

async fn build_ledger(config: &AppConfig) -> Result<Arc<dyn LedgerWriter>> {
    match config.ledger {
        LedgerKind::Journal => {
            let journal = JournalLedger::open(&config.journal_path)
                .await
                .with_context(|| {
                    format!("Failed to open journal {}", config.journal_path.display())
                })?;
            Ok(Arc::new(journal))
        }
        LedgerKind::Relay => {
            let relay = config.require_relay()?;
            let target = MintTarget::new(relay.package_id.clone())
                .with_module(relay.module.clone())
                .with_function(relay.function.clone());
            let mut writer = RelayLedger::new(relay.url.clone(), target);
            if let Some(explorer) = &relay.explorer_url {
                writer = writer.with_explorer_url(explorer.clone());
            }
            Ok(Arc::new(RetryingLedger::new(writer)))
        }
    }
}

async fn build_pipeline(
    config: &AppConfig,
    options: &RunOptions,
    source: Arc<dyn TextSource>,
) -> Result<CliPipeline> {
    let extractor = build_extractor(config, options.shape)?;
    let ledger = build_ledger(config).await?;

    let judge: Arc<dyn TopicJudge> = Arc::new(extractor.clone());
    let matcher = AnyMatcher::from_policy(config.match_policy, Some(judge), DEFAULT_SEMANTIC_CANDIDATES);

    let builder = ClaimGraphBuilder::new(
        ledger,
        matcher,
        JsonFileStore::new(&config.index_path),
        BuilderConfig::default().with_provenance_leaves(options.provenance),
    );

    tracing::info!(
        ledger = builder.ledger().name(),
        known_topics = builder.index().len(),
        "Pipeline ready"
    );

    Ok(Pipeline::new(source, extractor, builder))
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_run(
    config: &AppConfig,
    options: &RunOptions,
    source: Arc<dyn TextSource>,
    url: &str,
) -> Result<()> {
    let mut pipeline = build_pipeline(config, options, source).await?;
    let outcome = pipeline.run_url(url).await;

    if options.json {
        output::print_json(&outcome)
    } else {
        output::print_outcome(url, &outcome);
        Ok(())
    }
}

async fn cmd_batch(
    config: &AppConfig,
    options: &RunOptions,
    mut urls: Vec<String>,
    file: Option<PathBuf>,
    fresh: bool,
    delay: Duration,
) -> Result<()> {
    if let Some(file) = file {
        let listed = read_url_list(&file)
            .with_context(|| format!("Failed to read URL list {}", file.display()))?;
        urls.extend(listed);
    }
    if urls.is_empty() {
        bail!("no URLs given (pass them as arguments or with --file)");
    }

    let source: Arc<dyn TextSource> = Arc::new(http_source(config));
    let mut pipeline = build_pipeline(config, options, source).await?;

    if fresh {
        pipeline
            .builder_mut()
            .clear_index()
            .context("Failed to clear topic index")?;
        tracing::info!("Topic index cleared for a fresh batch");
    }

    let summary = pipeline
        .run_batch(&urls, &BatchConfig::default().with_delay(delay))
        .await;

    if options.json {
        output::print_json(&summary)
    } else {
        output::print_summary(&summary);
        Ok(())
    }
}

async fn cmd_extract(config: &AppConfig, shape: ExtractionShape, url: &str) -> Result<()> {
    let extractor = build_extractor(config, shape)?;
    let text = http_source(config)
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let extraction = extractor
        .extract(&text)
        .await
        .context("Claim extraction failed")?;

    output::print_json(&extraction)
}

fn cmd_index(config: &AppConfig, action: IndexAction, json: bool) -> Result<()> {
    let store = JsonFileStore::new(&config.index_path);

    match action {
        IndexAction::List => {
            let index = TopicIndex::load(&store, DEFAULT_INDEX_CAPACITY);
            if json {
                output::print_json(index.entries())
            } else {
                output::print_index(index.entries(), index.capacity());
                Ok(())
            }
        }
        IndexAction::Clear => {
            store.clear().with_context(|| {
                format!("Failed to clear {}", config.index_path.display())
            })?;
            println!("{} {}", "Cleared".bright_green(), config.index_path.display());
            Ok(())
        }
        IndexAction::Path => {
            println!("{}", config.index_path.display());
            Ok(())
        }
    }
}
