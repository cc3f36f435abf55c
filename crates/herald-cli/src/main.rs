use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use herald_client::{HtmlExtractor, ReqwestFetcher};
use herald_core::traits::Extractor;
use herald_core::{
    AppError, Article, Candidate, HeraldConfig, IngestionSink, Language, LanguagePostProcessor,
    SourceConfig, SourceKind, SourceWorker, TemplateResolver, TracingSourceReporter,
};
use herald_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "herald", version, about = "Multi-source news ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll every source and persist articles until interrupted
    Run {
        /// JSON source configuration (built-in sources when omitted)
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Poll sources once and print the extracted articles as JSON
    Once {
        /// JSON source configuration (built-in sources when omitted)
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: Option<PathBuf>,

        /// Only poll the source with this name
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Print the effective source configuration
    Sources {
        /// JSON source configuration (built-in sources when omitted)
        #[arg(short, long, env = "HERALD_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Extraction capability of one source, chosen by its configured kind.
#[derive(Clone)]
enum SourceExtractor {
    Html(HtmlExtractor),
    Feed(TemplateResolver),
}

impl SourceExtractor {
    fn for_source(source: &SourceConfig, lexicon: &LanguagePostProcessor) -> Result<Self, AppError> {
        match &source.kind {
            SourceKind::Html { rules } => Ok(Self::Html(HtmlExtractor::new(rules)?)),
            SourceKind::TemplateFeed => Ok(Self::Feed(TemplateResolver::new(lexicon.clone()))),
        }
    }
}

impl Extractor for SourceExtractor {
    fn extract(&self, raw: &str, language: Language) -> Result<Vec<Candidate>, AppError> {
        match self {
            Self::Html(extractor) => extractor.extract(raw, language),
            Self::Feed(resolver) => resolver.extract(raw, language),
        }
    }
}

type Worker = SourceWorker<ReqwestFetcher, SourceExtractor>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("herald=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config.as_deref())?;
            cmd_run(config).await?;
        }
        Commands::Once { config, source } => {
            let config = load_config(config.as_deref())?;
            cmd_once(&config, source.as_deref()).await?;
        }
        Commands::Sources { config } => {
            let config = load_config(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<HeraldConfig> {
    match path {
        Some(path) => HeraldConfig::from_file(path)
            .with_context(|| format!("Failed to load source config {}", path.display())),
        None => {
            tracing::info!("No config file given, using built-in sources");
            Ok(HeraldConfig::builtin())
        }
    }
}

fn build_workers(config: &HeraldConfig) -> Result<Vec<Worker>> {
    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
    config
        .sources
        .iter()
        .map(|source| {
            let extractor = SourceExtractor::for_source(source, &config.lexicon)
                .with_context(|| format!("Invalid extraction rules for source '{}'", source.name))?;
            Ok(SourceWorker::new(fetcher.clone(), extractor, source.worker_config()))
        })
        .collect()
}

async fn cmd_run(config: HeraldConfig) -> Result<()> {
    let db_config = DatabaseConfig::from_env()?;
    let db = Database::connect(&db_config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await?;
    db.article_repo()
        .health_check()
        .await
        .context("Database health check failed")?;

    let workers = build_workers(&config)?;
    let (queue, rx) = mpsc::channel::<Article>(config.queue_capacity);
    let cancel_token = CancellationToken::new();

    let sink = IngestionSink::new(db.article_repo());
    let sink_handle = tokio::spawn(async move { sink.run(rx).await });

    let mut tasks = JoinSet::new();
    for worker in workers {
        let queue = queue.clone();
        let token = cancel_token.clone();
        tasks.spawn(async move {
            let reporter = TracingSourceReporter;
            let result = worker.run(queue, token, &reporter).await;
            (worker.config().source.clone(), result)
        });
    }
    // The sink stops once every worker has dropped its sender.
    drop(queue);

    tracing::info!(
        sources = config.sources.len(),
        queue_capacity = config.queue_capacity,
        "Herald running, press Ctrl+C to stop"
    );

    shutdown_signal().await;
    cancel_token.cancel();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source, Ok(()))) => tracing::debug!(%source, "Worker finished"),
            Ok((source, Err(e))) => tracing::warn!(%source, error = %e, "Worker exited with error"),
            Err(e) => tracing::error!(error = %e, "Worker task panicked"),
        }
    }

    let stats = sink_handle.await.context("Ingestion task failed")?;
    tracing::info!(
        inserted = stats.inserted,
        updated = stats.updated,
        failed = stats.failed,
        "Shutdown complete"
    );

    Ok(())
}

async fn cmd_once(config: &HeraldConfig, only: Option<&str>) -> Result<()> {
    if let Some(name) = only {
        if !config.sources.iter().any(|s| s.name == name) {
            bail!("Unknown source '{name}'");
        }
    }

    let mut output: BTreeMap<String, Vec<Article>> = BTreeMap::new();
    for worker in build_workers(config)? {
        let source = worker.config().source.clone();
        if only.is_some_and(|name| name != source) {
            continue;
        }

        tracing::info!(%source, url = %worker.config().url, "Polling");
        match worker.poll_once().await {
            Ok(articles) => {
                tracing::info!(%source, count = articles.len(), "Poll complete");
                output.insert(source, articles);
            }
            Err(e) => tracing::error!(%source, error = %e, "Poll failed"),
        }
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C, stopping now");
        return;
    }
    tracing::info!("Shutdown signal received");
}
