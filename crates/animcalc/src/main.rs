//! # Animcalc CLI
//!
//! Runs the Animation Calculator server, the desktop shell, or a single
//! calculation from the terminal.

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "animcalc")]
#[command(author = "Animcalc Contributors")]
#[command(version)]
#[command(about = "Animation Calculator: arithmetic over HTTP with an animated UI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    json_logs: bool,

    /// Export traces to this OTLP endpoint
    #[arg(long, global = true)]
    otlp_endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,
    },

    /// Run one calculation, e.g. `animcalc calc 2 pow 8`
    #[command(allow_negative_numbers = true)]
    Calc {
        /// First operand
        num1: String,

        /// Operator: +, -, *, / or pow
        operator: String,

        /// Second operand
        num2: String,
    },

    /// Start the server locally and open the calculator page
    Desktop {
        /// Port to listen on (0 picks a free port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Display version and build info
    Version,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init,

    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let mut telemetry_config =
        animcalc_telemetry::TelemetryConfig::new("animcalc").with_log_level(&cli.log_level);
    if cli.json_logs {
        telemetry_config = telemetry_config.with_json_logs();
    }
    if let Some(endpoint) = &cli.otlp_endpoint {
        telemetry_config = telemetry_config.with_otlp(endpoint);
    }

    let tracing_guard = animcalc_telemetry::init_telemetry(&telemetry_config)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to initialize telemetry: {e}"))?;
    if tracing_guard.is_exporting() {
        tracing::debug!("Exporting spans over OTLP");
    }

    let cfg = config::Config::load();

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            let host = host.unwrap_or(cfg.server_host);
            let port = port.unwrap_or(cfg.server_port);
            commands::serve(host, port, cfg.cors && !no_cors).await?;
        }

        Commands::Calc {
            num1,
            operator,
            num2,
        } => {
            commands::calc(num1, operator, num2)?;
        }

        Commands::Desktop { port, no_browser } => {
            let port = port.unwrap_or(cfg.server_port);
            commands::desktop(
                cfg.desktop_host,
                port,
                Duration::from_secs(cfg.ready_timeout_secs),
                cfg.open_browser && !no_browser,
            )
            .await?;
        }

        Commands::Version => {
            commands::version();
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                config::show_config();
            }
            ConfigAction::Init => match cfg.save() {
                Ok(()) => {
                    println!("Config saved to: {}", config::Config::config_path().display());
                }
                Err(e) => {
                    eprintln!("Failed to save config: {}", e);
                }
            },
            ConfigAction::Path => {
                println!("{}", config::Config::config_path().display());
            }
        },
    }

    Ok(())
}
