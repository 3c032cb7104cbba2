//! Error types for the orchestrator
//!
//! Configuration errors abort before any server is started or any test runs.
//! Readiness failures abort the whole run since no dependent project can proceed.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum Error {
    // === Project Selection Errors ===
    #[error("Project '{name}' is not registered. Known projects: {known}")]
    UnknownProject { name: String, known: String },

    #[error("Project '{0}' is registered more than once")]
    DuplicateProject(String),

    #[error("Auxiliary server for '{0}' references a project absent from the registry")]
    AuxiliaryProjectNotRegistered(String),

    // === Server Definition Errors ===
    #[error("Invalid server definition '{command}': {reason}")]
    InvalidServer { command: String, reason: String },

    #[error("{target} is already in use and reusing an existing server is not allowed. Stop it or run outside CI")]
    ServerAlreadyRunning { target: String },

    // === Server Startup Errors ===
    #[error("Failed to start server '{command}': {error}")]
    ServerSpawn { command: String, error: String },

    #[error("Server '{command}' exited with code {code:?} before {target} became ready")]
    ServerExited {
        command: String,
        target: String,
        code: Option<i32>,
    },

    #[error("Timed out after {timeout_ms}ms waiting for {target} (server '{command}')")]
    ReadinessTimeout {
        command: String,
        target: String,
        timeout_ms: u64,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid URL '{url}': {error}")]
    InvalidUrl { url: String, error: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an unknown project error listing the registered names
    pub fn unknown_project<S: AsRef<str>>(name: &str, known: &[S]) -> Self {
        Self::UnknownProject {
            name: name.to_string(),
            known: known.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create an invalid server definition error
    pub fn invalid_server(command: &str, reason: &str) -> Self {
        Self::InvalidServer {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a readiness timeout error
    pub fn readiness_timeout(command: &str, target: &str, timeout_ms: u64) -> Self {
        Self::ReadinessTimeout {
            command: command.to_string(),
            target: target.to_string(),
            timeout_ms,
        }
    }

    /// Whether this error was raised while resolving configuration,
    /// i.e. before anything was spawned
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownProject { .. }
                | Error::DuplicateProject(_)
                | Error::AuxiliaryProjectNotRegistered(_)
                | Error::InvalidServer { .. }
                | Error::ServerAlreadyRunning { .. }
                | Error::Config(_)
                | Error::ConfigParse(_)
                | Error::InvalidUrl { .. }
                | Error::FileRead { .. }
        )
    }
}
