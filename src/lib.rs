//! e2e-orchestrator - Resolves end-to-end test projects and their backing servers
//!
//! The core is the server topology resolver: given the projects selected on
//! the runner's command line, it decides which auxiliary servers must start
//! and whether the primary server is probed by port or by URL.

pub mod cli;
pub mod commands;
pub mod common;
pub mod profile;
pub mod projects;
pub mod run_config;
pub mod server;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use profile::EnvironmentProfile;
pub use run_config::RunConfiguration;
pub use server::{ReadinessMode, ServerSpec};
