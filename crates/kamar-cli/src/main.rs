//! kamar - KAMAR parent portal timetable CLI.

/// Application configuration (TOML).
mod config;
/// Terminal table rendering.
mod table;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;

use crate::config::{AppConfig, CredentialsConfig, resolve_config_path};
use kamar_api::portal::{PortalClient, Weekday};
use kamar_cache::{CacheStore, convert_calendar, convert_timetable, load_calendar, load_timetable};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/cache directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Log in to the parent portal and store credentials.
    Login(LoginArgs),
    /// Build the timetable JSON artifact from portal data.
    Convert(ConvertArgs),
    /// Print a week of the timetable as JSON.
    Json(JsonArgs),
    /// Render a week of the timetable as a table.
    Table(TableArgs),
}

/// Arguments for the `login` subcommand.
#[derive(clap::Args)]
struct LoginArgs {
    /// The username that you use on parent portal.
    #[arg(long, required = true)]
    username: String,

    /// The password that you use on parent portal.
    #[arg(long, required = true)]
    password: String,
}

/// Arguments for the `convert` subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Refetch data from the API instead of using the cache.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `json` subcommand.
#[derive(clap::Args)]
struct JsonArgs {
    /// The number of the week you want the timetable for.
    #[arg(long, required = true)]
    week: u32,

    /// Restrict output to a single weekday (e.g. "Monday").
    #[arg(long)]
    day: Option<String>,

    /// Refetch data from the API instead of using the cache.
    #[arg(long)]
    refresh: bool,
}

/// Arguments for the `table` subcommand.
#[derive(clap::Args)]
struct TableArgs {
    /// The number of the week you want the timetable for
    /// (default: the current week, resolved from the calendar).
    #[arg(long)]
    week: Option<u32>,

    /// Refetch data from the API instead of using the cache.
    #[arg(long)]
    refresh: bool,
}

/// Builds a `PortalClient` from stored credentials.
///
/// # Errors
///
/// Returns an error if no credentials are stored or the client fails to
/// build.
fn build_client(dir: Option<&PathBuf>) -> Result<PortalClient> {
    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;
    let username = config
        .credentials
        .username
        .context("no stored username; run `kamar login` first")?;
    let password = config
        .credentials
        .password
        .context("no stored password; run `kamar login` first")?;

    PortalClient::builder()
        .username(username)
        .password(password)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build portal client")
}

/// Prints pipeable data output.
#[allow(clippy::print_stdout)]
fn print_data(data: &str) {
    println!("{data}");
}

/// Runs the `login` subcommand.
///
/// Verifies the credentials against the portal, stores them, and primes
/// the caches with fresh fetches.
///
/// # Errors
///
/// Returns an error if login fails or config/cache operations fail.
#[instrument(skip_all)]
async fn run_login(args: &LoginArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = PortalClient::builder()
        .username(args.username.as_str())
        .password(args.password.as_str())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build portal client")?;

    client.session_key().await.context("login failed")?;
    tracing::info!("Login succeeded");

    let config_path = resolve_config_path(dir).context("failed to resolve config path")?;
    let config = AppConfig {
        credentials: CredentialsConfig {
            username: Some(args.username.clone()),
            password: Some(args.password.clone()),
        },
    };
    config.save(&config_path).context("failed to save config")?;
    tracing::info!("Credentials stored in {}", config_path.display());

    let store = CacheStore::open(dir).context("failed to open cache")?;
    convert_timetable(&client, &store, true)
        .await
        .context("failed to prime timetable cache")?;
    convert_calendar(&client, &store, true)
        .await
        .context("failed to prime calendar cache")?;

    Ok(())
}

/// Runs the `convert` subcommand.
///
/// # Errors
///
/// Returns an error if fetching, parsing, or cache operations fail.
#[instrument(skip_all)]
async fn run_convert(args: &ConvertArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_client(dir)?;
    let store = CacheStore::open(dir).context("failed to open cache")?;

    let timetable = convert_timetable(&client, &store, args.refresh).await?;

    tracing::info!(
        "Timetable ({} weeks) converted to JSON and saved to {}",
        timetable.len(),
        store.path(kamar_cache::CacheKind::TimetableJson).display()
    );
    Ok(())
}

/// Runs the `json` subcommand.
///
/// # Errors
///
/// Returns an error if the requested week or day is not in the timetable,
/// or if fetching/parsing fails.
#[instrument(skip_all)]
async fn run_json(args: &JsonArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_client(dir)?;
    let store = CacheStore::open(dir).context("failed to open cache")?;

    let timetable = load_timetable(&client, &store, args.refresh).await?;

    let key = format!("W{}", args.week);
    let Some(week) = timetable.get(&key) else {
        bail!("timetable data for week {} was not found", args.week);
    };

    let output = match args.day.as_deref() {
        Some(day) => {
            let weekday: Weekday = day.parse()?;
            let day_data = week
                .days
                .get(&weekday)
                .with_context(|| format!("no data for {weekday} in week {}", args.week))?;
            serde_json::to_string_pretty(day_data)
        }
        None => serde_json::to_string_pretty(week),
    }
    .context("failed to serialize timetable output")?;

    print_data(&output);
    Ok(())
}

/// Runs the `table` subcommand.
///
/// When `--week` is omitted, the current week is resolved from today's
/// calendar entry.
///
/// # Errors
///
/// Returns an error if the week cannot be resolved or the timetable or
/// calendar data is unavailable.
#[instrument(skip_all)]
async fn run_table(args: &TableArgs, dir: Option<&PathBuf>) -> Result<()> {
    let client = build_client(dir)?;
    let store = CacheStore::open(dir).context("failed to open cache")?;

    let timetable = load_timetable(&client, &store, args.refresh).await?;
    let calendar = load_calendar(&client, &store, args.refresh).await?;

    let week = match args.week {
        Some(week) => week,
        None => {
            let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
            let number = calendar
                .week_for_date(&today)
                .context("could not resolve the current week; specify one with `--week`")?;
            number
                .parse()
                .with_context(|| format!("calendar week number `{number}` is not numeric"))?
        }
    };

    let key = format!("W{week}");
    let Some(week_data) = timetable.get(&key) else {
        bail!("timetable data for week {week} was not found");
    };
    let week_days = calendar
        .weeks
        .get(&week.to_string())
        .with_context(|| format!("calendar data for week {week} was not found"))?;

    let dates = table::weekday_dates(week_days);
    for line in table::render_week(week_data, week, &dates) {
        tracing::info!("{line}");
    }
    tracing::info!("Empty cells are breaks, before/after school, or the continuation of a class");

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Login(args) => run_login(&args, cli.dir.as_ref()).await,
        Commands::Convert(args) => run_convert(&args, cli.dir.as_ref()).await,
        Commands::Json(args) => run_json(&args, cli.dir.as_ref()).await,
        Commands::Table(args) => run_table(&args, cli.dir.as_ref()).await,
    }
}
