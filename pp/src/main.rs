//! pp - ping-pong grid fill service and operator CLI

use std::fs;
use std::path::Path;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use pingpong::cli::{Cli, Command, OutputFormat};
use pingpong::config::Config;
use pingpong::{ColorValidation, PingPongClient, ProgressStatus, RoundStatus, RoundSummary};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, log_file: Option<&Path>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).context("Failed to create log directory")?;
            }
            let file = fs::File::create(path).context("Failed to create log file")?;
            tracing_subscriber::fmt()
                .with_writer(file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(
        cli.log_level.as_deref(),
        config_log_level.as_deref(),
        cli.log_file.as_deref(),
    )
    .context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            pingpong::serve(&config).await
        }
        Command::Configure { m, n } => cmd_configure(&config, m, n).await,
        Command::Generate => cmd_generate(&config).await,
        Command::Status { format } => cmd_status(&config, format).await,
        Command::Image { format } => cmd_image(&config, format).await,
        Command::Validate { format } => cmd_validate(&config, format).await,
    }
}

fn client(config: &Config) -> Result<PingPongClient> {
    PingPongClient::new(&config.relay.base_url)
}

async fn cmd_configure(config: &Config, m: u64, n: u64) -> Result<()> {
    debug!(m, n, "cmd_configure: called");
    let configured = client(config)?.configure(m, n).await?;
    println!(
        "{} {}x{} grid (run {})",
        "Configured".green().bold(),
        configured.m,
        configured.n,
        configured.run_id
    );
    Ok(())
}

async fn cmd_generate(config: &Config) -> Result<()> {
    debug!("cmd_generate: called");
    let summary = client(config)?.generate().await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RoundSummary) {
    match summary.status {
        RoundStatus::Done => println!("{} grid already complete", "Done:".green().bold()),
        _ => {
            let target = summary.forwarded_to.map(|p| p.to_string()).unwrap_or_default();
            println!(
                "{} {} strategy, handed to {}",
                "Started:".green().bold(),
                summary.strategy.method(),
                target
            );
        }
    }
}

async fn cmd_status(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_status: called");
    let status = client(config)?.status().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Text => print_status(&status),
    }
    Ok(())
}

fn print_status(status: &ProgressStatus) {
    println!("Pingpong Status");
    println!("---------------");
    println!("Run: {}", status.run_id);
    println!("Grid: {}x{}", status.m, status.n);
    println!(
        "Painted: {}/{} ({:.2}%)",
        status.colored_pixels, status.total_pixels, status.progress_percentage
    );
    match status.current_position {
        Some(pos) => println!("Cursor: ({}, {})", pos.x(), pos.y()),
        None => println!("Cursor: -"),
    }
    if status.done {
        println!("State: {}", "done".green().bold());
    } else {
        println!("State: {}", "filling".yellow());
    }
}

async fn cmd_image(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_image: called");
    let image = client(config)?.image().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&image)?),
        OutputFormat::Text => {
            println!(
                "{}x{} grid, {}/{} pixels",
                image.m, image.n, image.colored_pixels, image.total_pixels
            );
            for pixel in &image.image {
                let [r, g, b] = pixel.color.0;
                println!("({}, {}) {}", pixel.x, pixel.y, "##".truecolor(r, g, b));
            }
        }
    }
    Ok(())
}

async fn cmd_validate(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_validate: called");
    let validation = client(config)?.validate().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&validation)?),
        OutputFormat::Text => print_validation(&validation),
    }
    Ok(())
}

fn print_validation(validation: &ColorValidation) {
    if validation.is_valid {
        println!(
            "{} all {} pixels have unique colors",
            "OK:".green().bold(),
            validation.total_pixels
        );
    } else {
        println!(
            "{} found {} duplicate colors among {} pixels",
            "Invalid:".red().bold(),
            validation.duplicate_colors.len(),
            validation.total_pixels
        );
    }
}
