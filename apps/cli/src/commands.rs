//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use awsdigest_catalog::{LibsqlCatalogStore, ServiceCatalog};
use awsdigest_core::{ArticleProcessor, BatchProgress, BatchReport, Pipeline, run_batch};
use awsdigest_fetcher::FeedReader;
use awsdigest_shared::{
    AppConfig, ArticleOutcome, EnvSecrets, FeedArticle, init_config, load_config,
    load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// awsdigest: tag, translate and summarize AWS announcements into Notion.
#[derive(Parser)]
#[command(
    name = "awsdigest",
    version,
    about = "Enrich AWS what's-new announcements and publish them to a Notion database.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.awsdigest/awsdigest.toml).
    #[arg(long, global = true, env = "AWSDIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich and publish a single article.
    Process {
        /// Article URL (also the dedup key).
        link: String,

        /// Article title.
        #[arg(short, long)]
        title: String,

        /// Publish timestamp (RFC 3339 or ISO-8601).
        #[arg(short, long)]
        published: Option<String>,
    },

    /// Read the what's-new feed and process every recent article.
    Run {
        /// Maximum articles in flight (defaults to config).
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Only articles newer than this many days (defaults to config).
        #[arg(long)]
        lookback_days: Option<i64>,

        /// List the selected articles without processing them.
        #[arg(long)]
        dry_run: bool,

        /// Print the batch report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Service catalog management.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
pub(crate) enum CatalogAction {
    /// Print every catalog entry.
    List,
    /// Canonicalize raw service names (one per line) and store them.
    Import {
        /// File with one service name per line; `#` starts a comment.
        file: PathBuf,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "awsdigest=info",
        1 => "awsdigest=debug",
        _ => "awsdigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Process {
            link,
            title,
            published,
        } => cmd_process(config_path, link, title, published).await,
        Command::Run {
            concurrency,
            lookback_days,
            dry_run,
            json,
        } => cmd_run(config_path, concurrency, lookback_days, dry_run, json).await,
        Command::Catalog { action } => match action {
            CatalogAction::List => cmd_catalog_list(config_path).await,
            CatalogAction::Import { file } => cmd_catalog_import(config_path, &file).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

async fn open_catalog(config: &AppConfig) -> Result<ServiceCatalog> {
    let db_path = config.catalog.resolved_db_path()?;
    let store = LibsqlCatalogStore::open(&db_path)
        .await
        .wrap_err_with(|| format!("opening catalog at {}", db_path.display()))?;
    Ok(ServiceCatalog::new(Arc::new(store), config.catalog.page_size))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_process(
    config_path: Option<&Path>,
    link: String,
    title: String,
    published: Option<String>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    Url::parse(&link).map_err(|e| eyre!("invalid URL '{link}': {e}"))?;

    let pipeline = Pipeline::from_config(&config, &EnvSecrets).await?;
    let article = FeedArticle {
        title,
        link,
        published,
    };

    info!(title = %article.title, link = %article.link, "processing article");
    let outcome = pipeline.process(article).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.succeeded() {
        return Err(eyre!(
            "article was not published{}",
            outcome
                .error
                .as_deref()
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        ));
    }
    Ok(())
}

async fn cmd_run(
    config_path: Option<&Path>,
    concurrency: Option<usize>,
    lookback_days: Option<i64>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let concurrency = concurrency.unwrap_or(config.defaults.concurrency);
    let lookback_days = lookback_days.unwrap_or(config.defaults.lookback_days);

    let feed = FeedReader::new(&config.defaults.feed_url, config.fetch.timeout_secs)?;
    let articles = feed.fetch_recent(lookback_days).await?;
    info!(count = articles.len(), lookback_days, "recent articles selected");

    if dry_run {
        for article in &articles {
            println!(
                "{}  {}\n    {}",
                article.published.as_deref().unwrap_or("-"),
                article.title,
                article.link
            );
        }
        println!("\n{} article(s) would be processed.", articles.len());
        return Ok(());
    }

    let pipeline: Arc<dyn ArticleProcessor> =
        Arc::new(Pipeline::from_config(&config, &EnvSecrets).await?);
    let progress = Arc::new(CliProgress::new(articles.len()));
    let report = run_batch(pipeline, articles, concurrency, progress.clone()).await;
    progress.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.failed > 0 {
        return Err(eyre!("{} article(s) were not published", report.failed));
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    println!();
    for outcome in &report.outcomes {
        let mark = if outcome.succeeded() { "ok  " } else { "FAIL" };
        let tag = outcome.tags.first().map(String::as_str).unwrap_or("-");
        println!("  [{mark}] {}  ({tag})", outcome.title);
        if let Some(err) = &outcome.error {
            println!("         {err}");
        }
    }
    println!();
    println!("  Run:       {}", report.run_id);
    println!("  Published: {}", report.published);
    println!("  Failed:    {}", report.failed);
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_catalog_list(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let catalog = open_catalog(&config).await?;
    let snapshot = catalog.list().await?;

    for (full, abbr) in &snapshot.abbreviations {
        if full == abbr {
            println!("{full}");
        } else {
            println!("{full}  ->  {abbr}");
        }
    }
    println!(
        "\n{} service(s), {} distinct name(s).",
        snapshot.abbreviations.len(),
        snapshot.names.len()
    );
    Ok(())
}

async fn cmd_catalog_import(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let content = std::fs::read_to_string(file)
        .wrap_err_with(|| format!("reading {}", file.display()))?;
    let names = parse_name_list(&content);

    let catalog = open_catalog(&config).await?;
    let written = catalog.import(&names).await?;

    println!("Imported {written} service name(s) from {}.", file.display());
    Ok(())
}

/// Non-empty, non-comment lines, trimmed.
fn parse_name_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Batch progress shown as an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let spinner = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.set_message("processing articles");
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl BatchProgress for CliProgress {
    fn article_done(&self, outcome: &ArticleOutcome, completed: usize, _total: usize) {
        self.spinner.set_position(completed as u64);
        self.spinner.set_message(outcome.title.clone());
    }
}
