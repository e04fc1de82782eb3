//! fintrack main entry point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use fintrack_api::start_server;
use fintrack_charts::{render_report, write_chart};
use fintrack_config::{Config, ConfigOrigin};
use fintrack_core::{build_report, CategoryMode, CategoryView, ChartKind, FinanceTracker};
use fintrack_notion::{MemorySource, NotionClient, SourceRef};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "fintrack")]
#[command(version = "0.1.0")]
#[command(about = "Monthly finance charts from a Notion transactions workspace", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the chart server and dashboard
    Serve {
        /// Serve from a saved JSON dump instead of Notion
        #[arg(long)]
        fixture: Option<PathBuf>,
    },
    /// Build one chart by slug (see `list`)
    Chart {
        slug: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Personal expenses by sub-category
    Categories {
        /// stacked or percent
        #[arg(long, alias = "chart_type", default_value = "stacked")]
        chart_type: CategoryMode,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print every chart slug
    List,
    /// Print a default configuration file
    InitConfig,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Save the chart as HTML instead of printing the report as JSON
    #[arg(long)]
    write: bool,
    /// Output filename, defaults to output.default_filename
    #[arg(long)]
    filename: Option<String>,
    /// Read records from a saved JSON dump instead of Notion
    #[arg(long)]
    fixture: Option<PathBuf>,
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> anyhow::Result<(Config, ConfigOrigin)> {
    Config::load_or_default(path).map_err(|e| anyhow!("{}", e.to_details()))
}

/// Notion, or the fixture file when one is given
async fn open_source(config: &Config, fixture: Option<&Path>) -> anyhow::Result<SourceRef> {
    match fixture {
        Some(path) => {
            log::info!("Reading records from {}", path.display());
            let source = MemorySource::from_file(path)
                .await
                .with_context(|| format!("Failed to load fixture {}", path.display()))?;
            Ok(Arc::new(source))
        }
        None => {
            config
                .require_remote()
                .map_err(|e| anyhow!("{}", e.to_details()))?;
            let client = NotionClient::new(&config.notion).context("Failed to build Notion client")?;
            Ok(Arc::new(client))
        }
    }
}

async fn run_chart(config: Config, kind: ChartKind, output: OutputArgs) -> anyhow::Result<()> {
    let source = open_source(&config, output.fixture.as_deref()).await?;
    let tracker = FinanceTracker::new(config.clone(), source);
    let snapshot = tracker
        .fetch_snapshot()
        .await
        .map_err(|e| anyhow!("{}", e.to_details()))?;

    let report = build_report(kind, &snapshot.table);
    if !output.write {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let html = render_report(&report, &config.charts)?;
    let filename = output
        .filename
        .unwrap_or_else(|| config.output.default_filename.clone());
    let path = write_chart(&config.output.dir, &filename, &html)?;
    println!("Chart written to {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    match args.command {
        Command::List => {
            for kind in ChartKind::all() {
                println!("{:<50} {}", kind.slug(), kind.title());
            }
            return Ok(());
        }
        Command::InitConfig => {
            print!("{}", Config::generate_default());
            return Ok(());
        }
        _ => {}
    }

    let (config, origin) = load_config(&args.config)?;
    init_logging(&config.logging.level);
    match origin {
        ConfigOrigin::File => log::info!("Config loaded from {}", args.config.display()),
        ConfigOrigin::Defaults => log::warn!(
            "Config file {} not found, using defaults",
            args.config.display()
        ),
    }

    let rt = Runtime::new()?;
    rt.block_on(run(config, args.command))
}

async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve { fixture } => {
            let source = open_source(&config, fixture.as_deref()).await?;
            start_server(config, source).await?;
            Ok(())
        }
        Command::Chart { slug, output } => {
            let kind: ChartKind = slug.parse().map_err(|e: String| anyhow!(e))?;
            run_chart(config, kind, output).await
        }
        Command::Categories { chart_type, output } => {
            let kind = ChartKind::Category {
                view: CategoryView::PersonalExpenses,
                mode: chart_type,
            };
            run_chart(config, kind, output).await
        }
        Command::List | Command::InitConfig => Ok(()),
    }
}
