//! btcwill: headless client for the Bitcoin will service
//!
//! Drives the same flows as the web client (login, subscription checkout,
//! will wizard, PDF download) from the command line.
//!
//! # Usage
//!
//! ```bash
//! btcwill login alice@example.com
//! btcwill wills
//! btcwill submit my-will.json
//! btcwill download 12 ./wills
//! ```

mod commands;

use anyhow::{Context, Result};
use btcwill_app::config::{default_config_path, ClientConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Parse CLI args (minimal, no clap dependency)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut validate_only = false;
    let mut rest = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(PathBuf::from(&args[i]));
                } else {
                    anyhow::bail!("--config requires a path argument");
                }
            }
            "--validate" => {
                validate_only = true;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("btcwill {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    // Load config
    let mut config = ClientConfig::load(config_path.as_deref()).with_context(|| {
        format!(
            "Failed to load config from {}",
            config_path
                .clone()
                .unwrap_or_else(default_config_path)
                .display()
        )
    })?;

    // Apply env overrides
    config.apply_env_overrides();

    // Validate
    config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    std::env::set_var("RUST_LOG", &config.client.log_level);
    env_logger::init();

    if validate_only {
        println!("✅ Configuration is valid.");
        println!("  API:           {}", config.api.base_url);
        match config.api.timeout_secs {
            Some(secs) => println!("  Timeout:       {} secs", secs),
            None => println!("  Timeout:       none"),
        }
        println!("  Data dir:      {}", config.storage.data_dir.display());
        println!("  Wizard steps:  {}", config.wizard.steps);
        println!("  Enforce 100%:  {}", config.wizard.enforce_primary_total);
        println!("  Session only:  {}", config.wizard.session_only);
        return Ok(());
    }

    let command = commands::Command::parse(&rest)?;
    log::debug!("Running {:?}", command);

    // Build tokio runtime
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    rt.block_on(commands::run(command, &config))
}

fn print_help() {
    println!(
        r#"btcwill - Bitcoin will client

USAGE:
    btcwill [OPTIONS] [COMMAND]

OPTIONS:
    -c, --config <PATH>   Config file path (default: ~/.btcwill/config.toml)
    --validate            Validate config file and exit
    -h, --help            Show this help message
    -V, --version         Show version

COMMANDS:
    status                          Session, subscription and will count (default)
    login <email>                   Log in and remember the session
    register <email>                Create an account
    logout                          Forget the saved session
    wills                           List saved wills
    submit <file>                   Create a will from a JSON file
    update <id> <file>              Apply a JSON file to a saved will
    download <id> [dir]             Save a will's PDF (default: current directory)
    delete <id> --yes               Delete a will
    checkout <plan> <stripe|btcpay> Start a subscription payment
    manage                          Open the billing portal
    return <query>                  Handle a payment return query string

ENVIRONMENT VARIABLES (override config file):
    BTCWILL_API_URL        Backend base URL
    BTCWILL_TIMEOUT_SECS   Request timeout in seconds
    BTCWILL_DATA_DIR       Directory for the saved session
    BTCWILL_LOG_LEVEL      Log level (error/warn/info/debug/trace)
    BTCWILL_WIZARD_STEPS   4 or 5
    BTCWILL_SESSION_ONLY   Generate PDFs without storing wills (true/false)
    BTCWILL_PASSWORD       Password for login/register instead of prompting

EXAMPLES:
    # Log in against a local backend
    BTCWILL_API_URL=http://localhost:5000/api btcwill login alice@example.com

    # Pay for a yearly plan with bitcoin
    btcwill checkout yearly btcpay

    # Validate configuration
    btcwill --config config.toml --validate
"#
    );
}
