//! Configuration and artifact paths
//!
//! The user config file lives in the platform config directory:
//! - Linux: `~/.config/e2e-orchestrator/`
//! - macOS: `~/Library/Application Support/e2e-orchestrator/`
//! - Windows: `%APPDATA%\e2e-orchestrator\`

use std::path::{Path, PathBuf};

const APP_NAME: &str = "e2e-orchestrator";

/// Project-local configuration file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "e2e-orchestrator.toml";

/// Name of the resolved configuration written for the runner
const RUN_CONFIG_FILE: &str = "run-config.json";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Directory for per-test runner output
pub fn results_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("results")
}

/// Directory for reports
pub fn reports_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("reports")
}

/// Where `run` writes the resolved configuration
pub fn run_config_path(output_dir: &Path) -> PathBuf {
    output_dir.join(RUN_CONFIG_FILE)
}
