//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use filingcast_artifacts::{ArtifactPaths, archive_all, parse_date_token};
use filingcast_core::external::{acquirer_from, narrator_from, publisher_from, renderer_from};
use filingcast_core::schedule::{self, JsonScheduleStore, ScheduleConfig};
use filingcast_core::stages::MetricsSource;
use filingcast_core::{
    BatchOptions, BatchOrchestrator, HtmlSectionExtractor, ItemProcessor, NoMetrics,
    ProcessorSettings, StageSelection, StageSet,
};
use filingcast_quote::QuoteClient;
use filingcast_section::SectionRules;
use filingcast_shared::{
    AppConfig, Stage, StockMetrics, Visibility, init_config, init_config_at, load_config,
    load_config_from,
};

use crate::menu;
use crate::progress::{CliProgress, print_summary};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Filingcast: turn financial filings into narrated videos.
#[derive(Parser)]
#[command(
    name = "filingcast",
    version,
    about = "Turn financial filings into narrated, published videos.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.filingcast/filingcast.toml).
    #[arg(long, global = true, env = "FILINGCAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run the scheduled automatic mode once and exit.
    #[arg(long)]
    pub auto: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Without a subcommand the interactive menu is shown.
    #[command(subcommand)]
    pub command: Option<Command>,
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
    /// Run the pipeline over the documents in the processed directory.
    Run {
        /// Only items published on this date (YYYYMMDD).
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Maximum number of items to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Run a single stage: acquire, extract, narrate, render or publish.
        #[arg(long)]
        only: Option<Stage>,

        /// Visibility of published videos (overrides the config).
        #[arg(long)]
        visibility: Option<Visibility>,

        /// Skip the acquisition phase and use documents already on disk.
        #[arg(long)]
        no_acquire: bool,
    },

    /// Move every artifact into the archive directory.
    Reset {
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Show or change the automatic-run settings.
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },

    /// Look up market metrics for one or more companies.
    Quote {
        /// Company names as they appear in filings.
        #[arg(required = true)]
        companies: Vec<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Schedule subcommands.
#[derive(Subcommand)]
pub(crate) enum ScheduleAction {
    /// Print the current record and a matching crontab line.
    Show,
    /// Enable automatic runs.
    Enable,
    /// Disable automatic runs.
    Disable,
    /// Set the time of day (HH:MM).
    Time { time: String },
    /// Set the item limit per automatic run.
    Limit { limit: usize },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date_token(s).ok_or_else(|| format!("'{s}' is not a YYYYMMDD date"))
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "filingcast=info",
        1 => "filingcast=debug",
        _ => "filingcast=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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

    if cli.auto {
        if cli.command.is_some() {
            return Err(eyre!("--auto cannot be combined with a subcommand"));
        }
        return cmd_auto(&load_app_config(config_path)?).await;
    }

    let Some(command) = cli.command else {
        return menu::run_menu(&load_app_config(config_path)?).await;
    };

    match command {
        Command::Run {
            date,
            limit,
            only,
            visibility,
            no_acquire,
        } => {
            let config = load_app_config(config_path)?;
            let options = BatchOptions {
                date_filter: date,
                limit,
                selection: only.map_or(StageSelection::All, StageSelection::Only),
                visibility: visibility.unwrap_or(config.publish.visibility),
                acquire: !no_acquire,
                ..Default::default()
            };
            cmd_run(&config, &options).await
        }
        Command::Reset { yes } => {
            let config = load_app_config(config_path)?;
            if !yes && !menu::confirm("Move all artifacts to the archive?")? {
                println!("Reset cancelled.");
                return Ok(());
            }
            cmd_reset(&config)
        }
        Command::Schedule { action } => cmd_schedule(&load_app_config(config_path)?, action),
        Command::Quote { companies } => {
            cmd_quote(&load_app_config(config_path)?, &companies).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

pub(crate) fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Assemble the stage adapters and orchestrator described by `config`.
pub(crate) fn build_orchestrator(config: &AppConfig) -> Result<BatchOrchestrator> {
    let metrics: Box<dyn MetricsSource> = if config.quote.enabled {
        Box::new(QuoteClient::new(&config.quote)?)
    } else {
        Box::new(NoMetrics)
    };

    let stages = StageSet {
        acquirer: acquirer_from(&config.stages),
        extractor: Box::new(HtmlSectionExtractor::new(SectionRules::from(
            &config.extraction,
        ))),
        narrator: narrator_from(&config.stages),
        renderer: renderer_from(&config.stages),
        publisher: publisher_from(&config.stages),
        metrics,
    };
    let paths = ArtifactPaths::new(&config.paths.processed_dir, config.suffixes.clone());
    let processor = ItemProcessor::new(stages, paths, ProcessorSettings::from(config));
    Ok(BatchOrchestrator::new(processor))
}

fn schedule_store(config: &AppConfig) -> JsonScheduleStore {
    JsonScheduleStore::new(&config.paths.schedule_file)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

pub(crate) async fn cmd_run(config: &AppConfig, options: &BatchOptions) -> Result<()> {
    info!(
        selection = %options.selection,
        date = ?options.date_filter,
        limit = ?options.limit,
        "starting batch"
    );

    let orchestrator = build_orchestrator(config)?;
    let reporter = CliProgress::new();
    let result = orchestrator.run(options, &reporter).await?;
    print_summary(&result);
    Ok(())
}

async fn cmd_auto(config: &AppConfig) -> Result<()> {
    let schedule = schedule::load_or_init(&schedule_store(config));
    let today = chrono::Local::now().date_naive();
    info!(
        enabled = schedule.enabled,
        limit = schedule.item_limit,
        %today,
        "automatic run"
    );

    let orchestrator = build_orchestrator(config)?;
    let reporter = CliProgress::new();
    match orchestrator
        .run_automatic(&schedule, today, config.publish.auto_visibility, &reporter)
        .await?
    {
        Some(result) => print_summary(&result),
        None => println!("Automatic runs are disabled; nothing to do."),
    }
    Ok(())
}

pub(crate) fn cmd_reset(config: &AppConfig) -> Result<()> {
    let paths = ArtifactPaths::new(&config.paths.processed_dir, config.suffixes.clone());
    let report = archive_all(&paths, &config.paths.download_dir, &config.paths.archive_dir)?;

    println!();
    println!("  Archived {} file(s) to {}", report.total_moved(), config.paths.archive_dir.display());
    for (dir, count) in &report.moved {
        println!("    {dir:<10} {count}");
    }
    for (file, error) in &report.failures {
        println!("  ! {}: {error}", file.display());
    }
    println!();
    Ok(())
}

fn cmd_schedule(config: &AppConfig, action: ScheduleAction) -> Result<()> {
    let store = schedule_store(config);
    let updated = match action {
        ScheduleAction::Show => schedule::load_or_init(&store),
        ScheduleAction::Enable => schedule::set_enabled(&store, true)?,
        ScheduleAction::Disable => schedule::set_enabled(&store, false)?,
        ScheduleAction::Time { time } => schedule::set_time(&store, &time)?,
        ScheduleAction::Limit { limit } => schedule::set_item_limit(&store, limit)?,
    };
    print_schedule(&updated, store.path());
    Ok(())
}

pub(crate) fn print_schedule(schedule: &ScheduleConfig, path: &Path) {
    println!();
    println!("  Automatic runs: {}", if schedule.enabled { "enabled" } else { "disabled" });
    println!("  Time:           {}", schedule.time);
    println!("  Item limit:     {}", schedule.item_limit);
    println!("  Record:         {}", path.display());
    println!("  Crontab:        {}", schedule.cron_hint("filingcast"));
    println!();
}

pub(crate) async fn cmd_quote(config: &AppConfig, companies: &[String]) -> Result<()> {
    let client = QuoteClient::new(&config.quote)?;
    for company in companies {
        match client.fetch(company).await {
            Ok(Some(metrics)) => print_metrics(company, &metrics),
            Ok(None) => println!("  {company}: no metrics found"),
            Err(e) => println!("  {company}: lookup failed: {e}"),
        }
    }
    Ok(())
}

fn print_metrics(company: &str, metrics: &StockMetrics) {
    println!();
    println!("  {company} ({})", metrics.code.as_deref().unwrap_or("?"));
    println!("    PER:        {}", metrics.per);
    println!("    PBR:        {}", metrics.pbr);
    let optional = [
        ("ROE", &metrics.roe),
        ("PEG", &metrics.peg),
        ("Dividend", &metrics.dividend_yield),
        ("Equity", &metrics.equity_ratio),
        ("Op. margin", &metrics.operating_margin),
        ("Market cap", &metrics.market_cap),
        ("Sector", &metrics.sector),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("    {label:<11} {value}");
        }
    }
}

async fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => {
            init_config_at(path)?;
            path.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_app_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
