//! Playout operator console.
//!
//! Reads unit command lines from `-c` arguments, a script file or stdin,
//! executes them against the in-memory reference engine and prints each
//! response in its wire form.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use playout_core::commands::CommandExecutor;
use playout_core::memory::{FileProbe, MemoryRegistry, XmlServiceFactory};
use playout_core::settings::{ServerSettings, SettingsManager, SETTINGS_FILE};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser)]
#[command(name = "playout-cli", about = "Playout unit command console", version)]
struct Cli {
    /// Settings file (default: <config dir>/playout/settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Root directory override for resource paths
    #[arg(long)]
    root: Option<String>,

    /// Number of units override
    #[arg(long)]
    units: Option<usize>,

    /// Read command lines from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Command line to execute; may be repeated
    #[arg(short = 'c', long = "command")]
    commands: Vec<String>,

    /// Also write a daily rolling log file into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_logging(log_dir: Option<&PathBuf>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.map(|dir| {
        let _ = std::fs::create_dir_all(dir);
        let file_appender = tracing_appender::rolling::daily(dir, "playout.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn settings_path(cli: &Cli) -> PathBuf {
    cli.settings.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playout")
            .join(SETTINGS_FILE)
    })
}

fn load_settings(cli: &Cli) -> ServerSettings {
    let mut settings = SettingsManager::new(settings_path(cli)).load();
    if let Some(root) = &cli.root {
        settings.root_dir = root.clone();
    }
    if let Some(units) = cli.units {
        settings.units = units;
    }
    settings.normalize();
    settings
}

/// Executes one line and writes the response; blank lines and `#` comments
/// produce no output
fn run_line(executor: &CommandExecutor, line: &str, out: &mut impl Write) -> io::Result<()> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }
    if line.eq_ignore_ascii_case("help") {
        return write!(out, "{}", executor.help());
    }
    write!(out, "{}", executor.execute_line(line))?;
    out.flush()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_ref());

    let settings = load_settings(&cli);
    info!(
        root = %settings.root_dir,
        units = settings.units,
        profile = %settings.profile.name,
        "Starting playout console"
    );

    let probe = FileProbe::new(settings.media.default_length, settings.profile.fps);
    let registry =
        MemoryRegistry::with_units(settings.units, settings.unit_profile(), Arc::new(probe));
    let executor = CommandExecutor::new(
        Arc::new(registry),
        Arc::new(XmlServiceFactory::new(settings.media.default_length)),
        settings.root_dir.clone(),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !cli.commands.is_empty() {
        for line in &cli.commands {
            run_line(&executor, line, &mut out)?;
        }
        return Ok(());
    }

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    for line in input.lines() {
        let line = line.context("Failed to read command line")?;
        run_line(&executor, &line, &mut out)?;
    }
    Ok(())
}
