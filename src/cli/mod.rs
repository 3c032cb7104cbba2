//! CLI command handling
//!
//! Resolves configuration for each command and formats output.

use std::path::Path;
use std::process::Stdio;

use colored::Colorize;
use tokio::process::Command;

use crate::commands::{Commands, OutputFormat};
use crate::common::config::Config;
use crate::common::{paths, Error, Result};
use crate::profile::EnvironmentProfile;
use crate::run_config::RunConfiguration;
use crate::server::{Launcher, ReadinessMode, RunningServers};

/// Environment variable pointing the runner at the resolved configuration
pub const RUN_CONFIG_ENV: &str = "E2E_RUN_CONFIG";

/// Conventional exit code for termination by SIGINT
const INTERRUPTED_EXIT: i32 = 130;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<i32> {
    let config = Config::load(config_path)?;
    let profile = EnvironmentProfile::detect(&config.timeouts)?;
    tracing::debug!(?profile, "Resolved environment profile");

    match command {
        Commands::Resolve { format, args } => {
            let run = RunConfiguration::assemble(args.as_slice(), profile, &config)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&run)?),
                OutputFormat::Text => print_summary(&run),
            }
            Ok(0)
        }

        Commands::Projects => {
            let run = RunConfiguration::assemble::<&str>(&[], profile, &config)?;
            for project in &run.projects {
                println!(
                    "{:<22} {:<34} {}",
                    project.name.bold(),
                    project.test_dir.display(),
                    project.base_url.as_str().dimmed()
                );
            }
            Ok(0)
        }

        Commands::Serve { args } => {
            let run = RunConfiguration::assemble(args.as_slice(), profile, &config)?;
            let mut running = RunningServers::default();
            if !launch_interruptible(&run, &mut running).await? {
                return Ok(INTERRUPTED_EXIT);
            }
            print_servers(&running);

            println!("{}", "Servers are up. Press Ctrl+C to stop.".cyan());
            let signal = tokio::signal::ctrl_c().await;
            running.shutdown().await;
            signal?;
            Ok(0)
        }

        Commands::Run { command } => {
            let run = RunConfiguration::assemble(command.as_slice(), profile, &config)?;
            let config_file = write_run_config(&run, &config.output.dir)?;

            let mut running = RunningServers::default();
            if !launch_interruptible(&run, &mut running).await? {
                return Ok(INTERRUPTED_EXIT);
            }
            print_servers(&running);

            let status = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, stopping tests and servers");
                    Ok(INTERRUPTED_EXIT)
                }
                status = run_test_command(&command, &config_file) => status,
            };
            running.shutdown().await;
            status
        }
    }
}

/// Start the servers unless Ctrl+C arrives first
///
/// Server processes run in their own process groups and never see the
/// terminal's SIGINT, so an interrupt shuts down whatever has started.
/// Returns false when interrupted.
async fn launch_interruptible(run: &RunConfiguration, running: &mut RunningServers) -> Result<bool> {
    let launcher = Launcher::new()?;
    let interrupted = tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => true,
        result = launcher.launch_into(&run.servers, running) => {
            result?;
            false
        }
    };

    if interrupted {
        tracing::warn!("Interrupted during startup, stopping servers");
        running.shutdown().await;
    }
    Ok(!interrupted)
}

fn write_run_config(run: &RunConfiguration, output_dir: &Path) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = paths::run_config_path(output_dir);
    std::fs::write(&path, serde_json::to_string_pretty(run)?)?;
    tracing::debug!(path = %path.display(), "Wrote resolved configuration");
    Ok(path)
}

async fn run_test_command(command: &[String], config_file: &Path) -> Result<i32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Config("No test command given".to_string()))?;

    tracing::info!(command = %command.join(" "), "Running tests");
    // Killed if the caller abandons the wait on interrupt
    let mut child = Command::new(program)
        .args(args)
        .env(RUN_CONFIG_ENV, config_file)
        .stdin(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Config(format!("Failed to run '{}': {}", program, e)))?;
    let status = child.wait().await?;

    // Killed by a signal: report failure
    Ok(status.code().unwrap_or(1))
}

fn print_summary(run: &RunConfiguration) {
    let profile = &run.profile;
    println!("{}", "Environment".blue().bold());
    println!("  CI:        {}", profile.is_ci);
    println!("  Headless:  {}", profile.headless);
    println!("  Workers:   {}", run.workers);
    println!("  Retries:   {}", run.retries);
    println!(
        "  Timeouts:  test {}ms, navigation {}ms, expect {}ms",
        profile.test_timeout_ms, profile.navigation_timeout_ms, profile.default_timeout_ms
    );
    println!("  Base URL:  {}", run.shared.base_url);

    println!("\n{}", "Projects".blue().bold());
    for project in &run.projects {
        println!(
            "  {} {} {}",
            project.name.white().bold(),
            project.test_dir.display(),
            project.base_url.as_str().dimmed()
        );
    }

    println!("\n{}", "Servers".blue().bold());
    for (i, server) in run.servers.iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            readiness_label(&server.readiness),
            server.command.dimmed()
        );
        println!(
            "     timeout {}ms, reuse existing: {}",
            server.timeout_ms, server.reuse_existing
        );
    }
}

fn print_servers(running: &RunningServers) {
    for server in running.servers() {
        let state = if server.is_reused() {
            "reused".yellow()
        } else {
            "started".green()
        };
        println!(
            "  {} {} [{}]",
            "✓".green(),
            readiness_label(&server.spec.readiness),
            state
        );
    }
}

fn readiness_label(readiness: &ReadinessMode) -> String {
    match readiness {
        ReadinessMode::Port { port } => format!("port {}", port.to_string().cyan()),
        ReadinessMode::Url { url } => format!("url {}", url.as_str().cyan()),
    }
}
