// logvault - main.rs
// Bootstrap: load layered config, initialize tracing, dispatch the CLI.

use clap::Parser;
use std::process::exit;
use tracing::Level;

use logvault::cli::{dispatch, Cli};
use logvault::config_loader::load_config;

fn init_tracing(level: &str) {
    let max_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(max_level).init();
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(std::env::var("LOGVAULT_CONFIG_PATH").ok().as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            exit(1);
        }
    };

    init_tracing(&config.log_level);

    if let Err(e) = dispatch(cli, &config) {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}
