//! Run configuration assembly
//!
//! Composes the environment profile, the project registry and the server
//! topology into the single immutable object handed to the test runner.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use url::Url;

use crate::common::config::Config;
use crate::common::{paths, selected_projects, Error, Result};
use crate::profile::{self, EnvironmentProfile};
use crate::projects::{self, ProjectSpec};
use crate::server::{topology, ServerSpec};

/// A reporter the runner writes results with
///
/// Serialized as a name-first tuple: `["list"]`, `["html", { ... }]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reporter {
    /// Annotations for GitHub Actions
    Github,
    /// One line per test on the console
    List,
    Html {
        output_folder: PathBuf,
        open: String,
    },
    Junit {
        output_file: PathBuf,
    },
    /// A third-party reporter referenced by package name, without options
    Named(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HtmlOptions<'a> {
    output_folder: &'a Path,
    open: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JunitOptions<'a> {
    output_file: &'a Path,
}

impl Serialize for Reporter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Reporter::Github => ("github",).serialize(serializer),
            Reporter::List => ("list",).serialize(serializer),
            Reporter::Html {
                output_folder,
                open,
            } => (
                "html",
                HtmlOptions {
                    output_folder,
                    open,
                },
            )
                .serialize(serializer),
            Reporter::Junit { output_file } => ("junit", JunitOptions { output_file }).serialize(serializer),
            Reporter::Named(name) => (name.as_str(),).serialize(serializer),
        }
    }
}

impl Reporter {
    fn defaults(profile: &EnvironmentProfile, output_dir: &Path, extra: &[String]) -> Vec<Self> {
        let reports = paths::reports_dir(output_dir);
        let console = if profile.is_ci {
            Reporter::Github
        } else {
            Reporter::List
        };

        std::iter::once(console)
            .chain(extra.iter().cloned().map(Reporter::Named))
            .chain([
                Reporter::Html {
                    output_folder: reports.join("playwright-html-report"),
                    open: "never".to_string(),
                },
                Reporter::Junit {
                    output_file: reports.join("results.xml"),
                },
            ])
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextOptions {
    pub permissions: Vec<String>,
}

/// Options shared by every project unless a project overrides them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedOptions {
    #[serde(rename = "baseURL")]
    pub base_url: Url,
    pub locale: String,
    pub trace: String,
    pub headless: bool,
    pub context_options: ContextOptions,
}

/// Everything the external runner needs for one invocation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfiguration {
    #[serde(skip)]
    pub profile: EnvironmentProfile,
    pub forbid_only: bool,
    pub retries: u32,
    pub workers: usize,
    /// Per-test overall timeout
    pub timeout: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_failures: Option<u32>,
    pub fully_parallel: bool,
    pub output_dir: PathBuf,
    pub reporter: Vec<Reporter>,
    #[serde(rename = "use")]
    pub shared: SharedOptions,
    pub projects: Vec<ProjectSpec>,
    #[serde(rename = "webServer")]
    pub servers: Vec<ServerSpec>,
}

impl RunConfiguration {
    /// Assemble the configuration for the given runner arguments
    pub fn assemble<S: AsRef<str>>(
        args: &[S],
        profile: EnvironmentProfile,
        config: &Config,
    ) -> Result<Self> {
        let base_url = match &profile.base_url {
            Some(url) => url.clone(),
            None => {
                let fallback = format!("http://localhost:{}", config.primary.port);
                tracing::debug!(url = %fallback, "No base URL in environment, using primary server");
                profile::parse_url(&fallback)?
            }
        };

        let projects = projects::registry(&profile, &base_url)?;
        validate_selection(args, &projects, config)?;
        let servers = topology::build(args, &profile, config, &base_url)?;

        let output_dir = config.output.dir.clone();
        Ok(Self {
            forbid_only: profile.is_ci,
            retries: profile.retries(),
            workers: profile.worker_count,
            timeout: profile.test_timeout_ms,
            max_failures: profile.max_failures(),
            fully_parallel: true,
            reporter: Reporter::defaults(&profile, &output_dir, &config.output.reporters),
            output_dir: paths::results_dir(&output_dir),
            shared: SharedOptions {
                base_url,
                locale: "en-US".to_string(),
                trace: "retain-on-failure".to_string(),
                headless: profile.headless,
                context_options: ContextOptions {
                    permissions: vec!["clipboard-read".to_string(), "clipboard-write".to_string()],
                },
            },
            projects,
            servers,
            profile,
        })
    }

    pub fn project(&self, name: &str) -> Option<&ProjectSpec> {
        self.projects.iter().find(|p| p.name == name)
    }
}

/// Every selected project and every auxiliary server's project must be registered
fn validate_selection<S: AsRef<str>>(
    args: &[S],
    projects: &[ProjectSpec],
    config: &Config,
) -> Result<()> {
    let known: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();

    for aux in &config.auxiliary {
        if !known.contains(&aux.project.as_str()) {
            return Err(Error::AuxiliaryProjectNotRegistered(aux.project.clone()));
        }
    }

    for name in selected_projects(args) {
        if !known.contains(&name) {
            return Err(Error::unknown_project(name, &known));
        }
    }

    Ok(())
}
