mod adapters;
mod app;
mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dockwatch_core::config::DashboardConfig;
use dockwatch_core::model::Entity;
use dockwatch_core::runtime::ContainerRuntime;
use dockwatch_core::sampler::Sampler;

use adapters::DockerCli;

#[derive(Parser)]
#[command(name = "dockwatch")]
#[command(about = "Terminal dashboard for local containers", long_about = None)]
struct Cli {
    /// Config file (default: dockwatch.yml in the working directory)
    #[arg(short, long, global = true, env = "DOCKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Refresh period in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Points kept per container in the charts
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Runtime binary (docker, podman, ...)
    #[arg(long, global = true)]
    runtime: Option<String>,

    /// Write diagnostics here; the terminal belongs to the dashboard
    #[arg(long, global = true, env = "DOCKWATCH_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard (default)
    Tui,
    /// Sample once and print containers and usage
    Snapshot,
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            match DashboardConfig::discover(&cwd).context("failed to load config")? {
                Some((path, config)) => {
                    info!(path = %path.display(), "loaded config");
                    config
                }
                None => DashboardConfig::default(),
            }
        }
    };

    if let Some(ms) = cli.interval_ms {
        config.refresh_interval_ms = ms;
    }
    if let Some(window) = cli.window {
        config.history_window = window;
    }
    if let Some(binary) = &cli.runtime {
        config.runtime.binary = binary.clone();
    }
    config.validate().context("invalid command-line override")?;
    Ok(config)
}

fn entity_row(e: &Entity) -> String {
    format!("{:<14}{:<28}{:<28}{}", e.id, e.image, e.status, e.ports)
}

async fn run_snapshot(runtime: Arc<dyn ContainerRuntime>) -> Result<()> {
    let sampler = Sampler::new(runtime);
    let (entities, samples) = tokio::join!(sampler.fetch_entities(), sampler.fetch_samples());

    println!("{:<14}{:<28}{:<28}PORTS", "ID", "IMAGE", "STATUS");
    if entities.is_empty() {
        println!("No Containers");
    }
    for e in &entities {
        println!("{}", entity_row(e));
    }

    println!();
    println!("{:<28}{:>8}{:>14}", "NAME", "CPU %", "MEM (MiB)");
    for s in &samples {
        println!("{:<28}{:>8.2}{:>14.1}", s.entity_id, s.cpu_percent, s.memory_mb);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = load_config(&cli)?;
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerCli::new(&config.runtime));
    info!(
        runtime = %config.runtime.binary,
        interval_ms = config.refresh_interval_ms,
        window = config.history_window,
        "starting"
    );

    match cli.command {
        Some(Commands::Snapshot) => run_snapshot(runtime).await,
        Some(Commands::Tui) | None => app::run(&config, runtime).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "dockwatch",
            "--config",
            "/nonexistent/dockwatch.yml",
            "--interval-ms",
            "250",
        ]);
        assert!(load_config(&cli).is_err());

        let cli = Cli::parse_from(["dockwatch", "snapshot", "--window", "5", "--runtime", "podman"]);
        assert!(matches!(cli.command, Some(Commands::Snapshot)));
        assert_eq!(cli.window, Some(5));
        assert_eq!(cli.runtime.as_deref(), Some("podman"));
    }

    #[test]
    fn test_zero_interval_flag_rejected() {
        let dir = std::env::temp_dir().join(format!("dockwatch-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dockwatch.yml");
        std::fs::write(&path, "history_window: 10\n").unwrap();

        let cli = Cli::parse_from([
            "dockwatch",
            "--config",
            path.to_str().unwrap(),
            "--interval-ms",
            "0",
        ]);
        assert!(load_config(&cli).is_err());

        let cli = Cli::parse_from(["dockwatch", "--config", path.to_str().unwrap()]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.history_window, 10);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
