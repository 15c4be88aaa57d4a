mod http;
mod reports;
mod util;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use reports::ReportFormat;
use tsl_engine::{EngineConfig, ListEngine, ListKind, RouletteOptions};
use util::{build_stores, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Player standings across the whole list
    Leaderboard,
    /// Every list position with its loaded level or failure
    Levels,
    /// A seeded roulette draw from the main list
    Roulette,
    /// The list team roster
    Editors,
    /// Level packs
    Packs,
}

#[derive(Debug, Parser)]
#[command(name = "tsl-cli", version)]
#[command(about = "Leaderboards, level tables and roulette draws for the TSL list")]
struct Args {
    /// What to report
    #[arg(long, value_enum, default_value_t = View::Leaderboard)]
    view: View,

    /// List to load: main, challenge, or a list file name
    #[arg(long, default_value = "main")]
    list: String,

    /// Search paths in priority order (comma-separated directories or http(s) URLs)
    #[arg(long, env = "TSL_SOURCES")]
    sources: Option<String>,

    /// JSON engine configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upper bound for one fetch from one search path, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Show only the top N players
    #[arg(long)]
    limit: Option<usize>,

    /// Roulette seed
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Roulette pools (comma-separated: top, extended)
    #[arg(long, default_value = "top,extended")]
    pools: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = resolve_config(&args)?;
    log::debug!("Search paths: {:?}", config.search_paths);
    let stores = build_stores(&config.search_paths, config.fetch_timeout())?;
    let engine = ListEngine::with_stores(config, stores);
    let format = ReportFormat::parse(&args.report);

    if format == ReportFormat::Console && args.output.is_none() {
        announce_banner();
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    let outcome = write_view(&args, &engine, format, output_target.writer()).await;
    output_target.flush_inner()?;

    if let Err(err) = outcome {
        eprintln!("{} {err:#}", "❌".red());
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn announce_banner() {
    println!("{}", "📋 TSL List Engine".bright_cyan().bold());
    println!("{}", "==================".cyan());
}

fn resolve_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(sources) = &args.sources {
        let paths = split_csv(sources);
        if paths.is_empty() {
            bail!("--sources must name at least one search path");
        }
        config.search_paths = paths;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.fetch_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn parse_pools(pools: &str) -> Result<RouletteOptions> {
    let mut options = RouletteOptions {
        top: false,
        extended: false,
    };
    for pool in split_csv(pools) {
        match pool.to_lowercase().as_str() {
            "top" | "main" => options.top = true,
            "extended" => options.extended = true,
            other => bail!("unknown roulette pool: {other}"),
        }
    }
    Ok(options)
}

async fn write_view(
    args: &Args,
    engine: &ListEngine,
    format: ReportFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let generated_at = Utc::now();
    let kind = ListKind::parse(&args.list);

    match args.view {
        View::Leaderboard => {
            let list = engine.load_list(&kind).await?;
            let board = engine.aggregate(&list);
            reports::write_leaderboard(out, format, &list.name, &board, args.limit, generated_at)
        }
        View::Levels => {
            let list = engine.load_list(&kind).await?;
            reports::write_levels(out, format, &list, generated_at)
        }
        View::Roulette => {
            let options = parse_pools(&args.pools)?;
            let run = engine.roulette(options, args.seed).await?;
            reports::write_roulette(out, format, &run, args.seed, generated_at)
        }
        View::Editors => {
            let editors = engine.editors().await;
            reports::write_editors(out, format, editors.as_deref())
        }
        View::Packs => {
            let packs = engine.packs().await;
            reports::write_packs(out, format, &packs)
        }
    }
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
