//! Configuration file handling
//!
//! Every field has a default, so an absent or partial file yields the
//! standard topology.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// The application server every project depends on
    #[serde(default)]
    pub primary: PrimaryServerConfig,

    /// Servers started only when their project is selected
    #[serde(default = "default_auxiliary")]
    pub auxiliary: Vec<AuxiliaryServerConfig>,

    /// Timeout settings in milliseconds
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Report and artifact locations
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary: PrimaryServerConfig::default(),
            auxiliary: default_auxiliary(),
            timeouts: Timeouts::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Primary application server
///
/// `{port}` in the command is replaced with the configured port.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PrimaryServerConfig {
    #[serde(default = "default_primary_command")]
    pub command: String,

    #[serde(default = "default_primary_port")]
    pub port: u16,

    #[serde(default = "default_server_timeout")]
    pub timeout_ms: u64,

    /// Path probed on the primary server once an embed project is selected
    #[serde(default = "default_embed_probe_path")]
    pub embed_probe_path: String,
}

impl Default for PrimaryServerConfig {
    fn default() -> Self {
        Self {
            command: default_primary_command(),
            port: default_primary_port(),
            timeout_ms: default_server_timeout(),
            embed_probe_path: default_embed_probe_path(),
        }
    }
}

fn default_primary_command() -> String {
    r#"NEXT_PUBLIC_IS_E2E=1 NODE_OPTIONS="--dns-result-order=ipv4first" yarn workspace @calcom/web start -p {port}"#
        .to_string()
}
fn default_primary_port() -> u16 {
    3000
}
fn default_server_timeout() -> u64 {
    60_000
}
fn default_embed_probe_path() -> String {
    "/embed/embed.js".to_string()
}

/// Server tied to one selectable project
///
/// `{port}` in the command is replaced with the configured port.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AuxiliaryServerConfig {
    /// Project name whose selection starts this server
    pub project: String,

    pub command: String,

    pub port: u16,

    #[serde(default = "default_server_timeout")]
    pub timeout_ms: u64,
}

fn default_auxiliary() -> Vec<AuxiliaryServerConfig> {
    vec![
        AuxiliaryServerConfig {
            project: "@calcom/embed-core".to_string(),
            command: "yarn workspace @calcom/embed-core dev".to_string(),
            port: 3100,
            timeout_ms: default_server_timeout(),
        },
        AuxiliaryServerConfig {
            project: "@calcom/embed-react".to_string(),
            command: "yarn workspace @calcom/embed-react dev".to_string(),
            port: 3101,
            timeout_ms: default_server_timeout(),
        },
    ]
}

/// Timeout settings in milliseconds, short under CI and long locally
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Timeouts {
    #[serde(default = "default_ci_short")]
    pub ci_navigation_ms: u64,

    #[serde(default = "default_ci_short")]
    pub ci_default_ms: u64,

    #[serde(default = "default_ci_test")]
    pub ci_test_ms: u64,

    #[serde(default = "default_local_short")]
    pub local_navigation_ms: u64,

    #[serde(default = "default_local_short")]
    pub local_default_ms: u64,

    #[serde(default = "default_local_test")]
    pub local_test_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ci_navigation_ms: default_ci_short(),
            ci_default_ms: default_ci_short(),
            ci_test_ms: default_ci_test(),
            local_navigation_ms: default_local_short(),
            local_default_ms: default_local_short(),
            local_test_ms: default_local_test(),
        }
    }
}

fn default_ci_short() -> u64 {
    30_000
}
fn default_ci_test() -> u64 {
    60_000
}
fn default_local_short() -> u64 {
    120_000
}
fn default_local_test() -> u64 {
    240_000
}

/// Output locations, relative to the working directory
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Third-party reporters, by package name, run alongside the built-in ones
    #[serde(default = "default_reporters")]
    pub reporters: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            reporters: default_reporters(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("test-results")
}
fn default_reporters() -> Vec<String> {
    vec!["@deploysentinel/playwright".to_string()]
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise the project-local file is tried,
    /// then the user config file, then built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = std::iter::once(PathBuf::from(paths::LOCAL_CONFIG_FILE))
            .chain(paths::config_path());
        for path in candidates {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Get the auxiliary server configured for a project
    pub fn auxiliary_for(&self, project: &str) -> Option<&AuxiliaryServerConfig> {
        self.auxiliary.iter().find(|aux| aux.project == project)
    }
}
