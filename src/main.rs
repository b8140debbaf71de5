use scrollreel::cli::Args;
use scrollreel::paths::{self, PathConfig};
use scrollreel::runner;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};

fn main() {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Warning: {:#}", e);
    }

    info!("scrollreel v{} starting...", env!("CARGO_PKG_VERSION"));
    debug!("Command-line args: {:?}", args);

    if let Err(e) = runner::run(args) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let Some(log_path_opt) = &args.log_file else {
        log_builder(args.verbosity).init();
        return Ok(());
    };

    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    let log_path = log_path_opt
        .clone()
        .unwrap_or_else(|| paths::data_file(paths::LOG_FILE, &path_config));
    paths::ensure_parent(&log_path)?;

    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

    log_builder(args.verbosity)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("Logging to file: {} (level: {})", log_path.display(), log::max_level());
    Ok(())
}

/// Logger for the `-v` count; RUST_LOG overrides it when set
fn log_builder(verbosity: u8) -> env_logger::Builder {
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str().to_lowercase()),
    );
    builder.format_timestamp_millis();
    builder
}
