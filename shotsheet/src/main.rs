use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use shotsheet_core::auth::{CredentialStore, GoogleOAuth};
use shotsheet_core::config::{AppConfig, DEFAULT_CONFIG_FILE, SCOPES_ENV};
use shotsheet_core::service::GoogleSheets;
use shotsheet_core::{Syncer, UpdateRecord};
use std::path::{Path, PathBuf};

mod formatter;

#[derive(Parser)]
#[command(name = "shotsheet")]
#[command(about = "Apply a shot/task status update to a tracking spreadsheet", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON-encoded update record
    #[arg(value_name = "PAYLOAD")]
    payload: String,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Resolve the target range without writing
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for webhook callers
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(&cli) {
        match cli.format {
            OutputFormat::Human => formatter::print_error_human(&err),
            OutputFormat::Json => formatter::print_error_json(&err),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    config.validate().context("Invalid configuration")?;

    // Decode before touching credentials so bad payloads fail fast.
    let record = UpdateRecord::from_json(&cli.payload)?;
    log::info!(
        "{} update for shot '{}' task '{}' in '{}'",
        record.record_type(),
        record.shot,
        record.task,
        record.sheet_name
    );

    let program_dir = program_dir()?;
    let scopes = config.resolve_scopes(std::env::var(SCOPES_ENV).ok().as_deref());
    let store = CredentialStore::new(config.token_path(&program_dir), scopes.clone());
    let oauth = GoogleOAuth::new(
        config.client_secret_path(&program_dir),
        scopes,
        config.api.timeout(),
    )?;
    let access_token = store
        .access_token(&oauth)
        .context("Failed to obtain Google credentials")?;

    let service = GoogleSheets::new(&config.api.base_url, access_token, config.api.timeout())?;
    let syncer = Syncer::with_layouts(config.layouts.clone());

    if cli.dry_run {
        let plan = syncer.plan(&record, &service)?;
        match cli.format {
            OutputFormat::Human => formatter::print_plan_human(&record, &plan),
            OutputFormat::Json => formatter::print_plan_json(&record, &plan)?,
        }
    } else {
        let outcome = syncer.apply(&record, &service)?;
        match cli.format {
            OutputFormat::Human => formatter::print_outcome_human(&record, &outcome),
            OutputFormat::Json => formatter::print_outcome_json(&record, &outcome)?,
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(config_path) = path {
        return AppConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // Try to load default config from current directory if it exists
    let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
    if default_config_path.exists() {
        AppConfig::from_file(&default_config_path).with_context(|| {
            format!(
                "Failed to load config from {}",
                default_config_path.display()
            )
        })
    } else {
        Ok(AppConfig::default())
    }
}

/// Directory holding the executable; credential files default to living here
fn program_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
