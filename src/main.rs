use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blog_digest::config::Config;
use blog_digest::db::Database;
use blog_digest::digest::{self, Fetcher};
use blog_digest::routes::{self, AppState};
use blog_digest::{extractor, store, tabular};

#[derive(Parser)]
#[command(name = "blog-digest", about = "Daily blog digest: fetch, convert, browse")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "digest.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all feeds and print yesterday's entries as a digest
    Digest {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a digest file into CSV rows
    Convert {
        #[arg(short, long, default_value = "index.html")]
        input: PathBuf,
        /// Defaults to `data_path` from the configuration
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum rows to write; overrides `export_limit`
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Serve the browser and message board
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_digest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration; every setting has a default
    let config = if cli.config.exists() {
        Config::load(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        info!("{} not found, using defaults", cli.config.display());
        Config::default()
    };

    match cli.command {
        Command::Digest { output } => run_digest(&config, output).await,
        Command::Convert { input, output, limit } => run_convert(&config, input, output, limit),
        Command::Serve => run_serve(config).await,
    }
}

async fn run_digest(config: &Config, output: Option<PathBuf>) -> anyhow::Result<()> {
    info!("Loaded {} feeds from configuration", config.feeds.len());

    let day = digest::yesterday();
    let fetcher = Fetcher::new()?;
    let entries = fetcher.collect(&config.feeds, day, &Local).await;
    let text = digest::render(day, &entries);

    match output {
        Some(path) => {
            std::fs::write(&path, text)?;
            info!("Wrote {} entries for {} to {}", entries.len(), day, path.display());
        }
        None => print!("{}", text),
    }

    Ok(())
}

fn run_convert(
    config: &Config,
    input: PathBuf,
    output: Option<PathBuf>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("reading {}", input.display()))?;

    let records = store::normalize(extractor::extract(&text));
    if records.is_empty() {
        info!("No blog entries found in {}", input.display());
        return Ok(());
    }

    let output = output.unwrap_or_else(|| config.data_path.clone());
    tabular::export(&output, records.records(), limit.or(config.export_limit))?;

    for record in records.iter().take(5) {
        info!("{}, {}, {}", record.date, record.title, record.source);
    }

    Ok(())
}

async fn run_serve(config: Config) -> anyhow::Result<()> {
    // Initialize database
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database_url.clone());
    let db = Database::new(&database_url).await?;
    db.initialize().await?;
    info!("Database initialized");

    let state = Arc::new(AppState::load(
        &config.data_path,
        Arc::new(db),
        config.page_size,
        &config.date_format,
    ));
    info!("Serving {} records", state.store.len());

    let app = routes::router(state)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Server starting on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
