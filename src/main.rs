use std::path::Path;
use std::process::exit;
use std::sync::Arc;

use clap::Parser;

use certaudit::config::{Config, DEFAULT_CONFIG_FILE};
use certaudit::logging::init_logger;
use certaudit::output::summary_table;
use certaudit::{run_audit, LogObserver};

#[derive(Parser, Debug)]
#[command(name = "certaudit", version, author, about, long_about = None)]
struct Cli {
    /// File with one domain per line
    #[arg(short, long)]
    input: Option<String>,

    /// Where to write the JSON report
    #[arg(long)]
    json_output: Option<String>,

    /// Where to write the CSV report
    #[arg(long)]
    csv_output: Option<String>,

    /// TLS port to connect to
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect plus handshake timeout per domain, in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Number of domains checked at the same time
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Exit code to use when at least one domain failed
    #[arg(long)]
    exit_code: Option<i32>,

    /// Print a summary table to stdout
    #[arg(long)]
    summary: bool,

    /// Log level: error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// PEM bundle of extra trusted root certificates
    #[arg(long)]
    ca_file: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,
}

fn load_config(cli: &Cli) -> Result<Config, certaudit::ConfigError> {
    let mut config = Config::defaults();
    match &cli.config {
        Some(path) => config = config.merge_with(Config::from_file(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            config = config.merge_with(Config::from_file(DEFAULT_CONFIG_FILE)?)
        }
        None => {}
    }
    Ok(config.merge_with(Config::from_cli_args(
        cli.input.clone(),
        cli.json_output.clone(),
        cli.csv_output.clone(),
        cli.port,
        cli.timeout,
        cli.concurrency,
        cli.exit_code,
        cli.summary.then_some(true),
        cli.log_level.clone(),
        cli.ca_file.clone(),
    )))
}

fn main() {
    let cli = Cli::parse();

    if cli.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            exit(2);
        }
    };

    if let Err(e) = init_logger(config.log_level()) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let outcomes = match run_audit(&config, Arc::new(LogObserver)) {
        Ok(Some(outcomes)) => outcomes,
        Ok(None) => exit(0),
        Err(e) => {
            log::error!("{}", e);
            exit(1);
        }
    };

    if config.summary.unwrap_or(false) {
        println!("{}", summary_table(&outcomes));
    }

    if outcomes.iter().any(|o| !o.is_valid()) {
        exit(config.exit_code.unwrap_or(0));
    }
}
