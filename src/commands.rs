//! CLI command definitions
//!
//! Runner arguments are everything after `--`; only `--project=<name>`
//! tokens among them are interpreted.

use clap::{Subcommand, ValueEnum};

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved run configuration
    Resolve {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Arguments the test runner will be invoked with
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// List the registered test projects
    Projects,

    /// Start the servers needed by the selected projects and keep them up until Ctrl+C
    Serve {
        /// Arguments the test runner will be invoked with
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Start the servers, run a test command, then stop the servers
    ///
    /// Example: e2e-orchestrator run -- npx playwright test --project=@calcom/embed-core
    Run {
        /// The runner command and its arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

/// Output format for `resolve`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Runner-shaped JSON
    Json,
    /// Runner-shaped YAML
    Yaml,
}
