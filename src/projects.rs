//! Project registry
//!
//! One project per independently testable application surface. The embed
//! projects point at their own local ports because their pages are served by
//! dedicated auxiliary servers.

use std::path::PathBuf;

use regex::Regex;
use serde::{Serialize, Serializer};
use url::Url;

use crate::common::{Error, Result};
use crate::profile::EnvironmentProfile;

pub const WEB: &str = "@calcom/web";
pub const APP_STORE: &str = "@calcom/app-store";
pub const EMBED_CORE: &str = "@calcom/embed-core";
pub const EMBED_REACT: &str = "@calcom/embed-react";

const TEST_MATCH: &str = r".*\.e2e\.tsx?";
const LOCALE: &str = "en-US";

/// Browser emulation preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePreset {
    /// Preset name as known to the runner
    #[serde(skip)]
    pub name: &'static str,
    pub user_agent: &'static str,
    pub viewport: Viewport,
    pub device_scale_factor: u8,
    pub is_mobile: bool,
    pub has_touch: bool,
    pub default_browser_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl DevicePreset {
    pub fn desktop_chrome() -> Self {
        Self {
            name: "Desktop Chrome",
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            viewport: Viewport {
                width: 1280,
                height: 720,
            },
            device_scale_factor: 1,
            is_mobile: false,
            has_touch: false,
            default_browser_type: "chromium",
        }
    }
}

/// Per-project browser and context options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserOptions {
    #[serde(flatten)]
    pub device: DevicePreset,
    pub locale: String,
    pub navigation_timeout: u64,
    /// Overrides the shared base URL
    #[serde(rename = "baseURL", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

impl BrowserOptions {
    fn baseline(profile: &EnvironmentProfile) -> Self {
        Self {
            device: DevicePreset::desktop_chrome(),
            locale: LOCALE.to_string(),
            navigation_timeout: profile.navigation_timeout_ms,
            base_url: None,
        }
    }

    fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectOptions {
    pub timeout: u64,
}

/// An independently selectable group of test files
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    pub name: String,
    pub test_dir: PathBuf,
    #[serde(serialize_with = "serialize_regex")]
    pub test_match: Regex,
    #[serde(skip)]
    pub base_url: Url,
    pub expect: ExpectOptions,
    #[serde(rename = "use")]
    pub browser_options: BrowserOptions,
}

impl ProjectSpec {
    /// Whether a test file path belongs to this project
    pub fn matches(&self, file: &str) -> bool {
        self.test_match.is_match(file)
    }
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

/// Build the fixed, ordered project list
///
/// `default_base_url` is used by projects served from the primary server.
pub fn registry(profile: &EnvironmentProfile, default_base_url: &Url) -> Result<Vec<ProjectSpec>> {
    let test_match = Regex::new(TEST_MATCH)
        .map_err(|e| Error::Config(format!("Invalid test match pattern: {}", e)))?;
    let baseline = BrowserOptions::baseline(profile);

    let project = |name: &str, dir: &str, base_url: Option<&str>| -> Result<ProjectSpec> {
        let (base_url, browser_options) = match base_url {
            Some(raw) => {
                let url = crate::profile::parse_url(raw)?;
                (url.clone(), baseline.clone().with_base_url(url))
            }
            None => (default_base_url.clone(), baseline.clone()),
        };
        Ok(ProjectSpec {
            name: name.to_string(),
            test_dir: PathBuf::from(dir),
            test_match: test_match.clone(),
            base_url,
            expect: ExpectOptions {
                timeout: profile.default_timeout_ms,
            },
            browser_options,
        })
    };

    let projects = vec![
        project(WEB, "./apps/web/playwright", None)?,
        project(APP_STORE, "./packages/app-store/", None)?,
        project(
            EMBED_CORE,
            "./packages/embeds/embed-core/",
            Some("http://localhost:3100/"),
        )?,
        project(
            EMBED_REACT,
            "./packages/embeds/embed-react/",
            Some("http://localhost:3101/"),
        )?,
    ];

    ensure_unique(&projects)?;
    Ok(projects)
}

fn ensure_unique(projects: &[ProjectSpec]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for project in projects {
        if !seen.insert(project.name.as_str()) {
            return Err(Error::DuplicateProject(project.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::Timeouts;

    fn profile(ci: bool) -> EnvironmentProfile {
        let env: &[(&str, &str)] = if ci { &[("CI", "1")] } else { &[] };
        EnvironmentProfile::resolve(env, 4, &Timeouts::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_registry_order_and_names() {
        let projects = registry(&profile(false), &base()).unwrap();
        let names: Vec<_> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec![WEB, APP_STORE, EMBED_CORE, EMBED_REACT]);
    }

    #[test]
    fn test_embed_projects_use_dedicated_ports() {
        let projects = registry(&profile(false), &base()).unwrap();
        assert_eq!(projects[0].base_url.as_str(), "http://localhost:3000/");
        assert_eq!(projects[1].base_url.as_str(), "http://localhost:3000/");
        assert_eq!(projects[2].base_url.as_str(), "http://localhost:3100/");
        assert_eq!(projects[3].base_url.as_str(), "http://localhost:3101/");
        assert!(projects[0].browser_options.base_url.is_none());
        assert_eq!(
            projects[3].browser_options.base_url.as_ref().map(Url::as_str),
            Some("http://localhost:3101/")
        );
    }

    #[test]
    fn test_timeouts_follow_profile() {
        let ci = registry(&profile(true), &base()).unwrap();
        let local = registry(&profile(false), &base()).unwrap();
        assert!(ci.iter().all(|p| p.browser_options.navigation_timeout == 30_000));
        assert!(ci.iter().all(|p| p.expect.timeout == 30_000));
        assert!(local.iter().all(|p| p.browser_options.navigation_timeout == 120_000));
        assert!(local.iter().all(|p| p.expect.timeout == 120_000));
    }

    #[test]
    fn test_match_pattern() {
        let projects = registry(&profile(false), &base()).unwrap();
        let web = &projects[0];
        assert!(web.matches("apps/web/playwright/booking.e2e.ts"));
        assert!(web.matches("apps/web/playwright/embed.e2e.tsx"));
        assert!(!web.matches("apps/web/playwright/fixtures/users.ts"));
    }

    #[test]
    fn test_serialized_shape() {
        let projects = registry(&profile(false), &base()).unwrap();
        let value = serde_json::to_value(&projects[2]).unwrap();
        assert_eq!(value["name"], EMBED_CORE);
        assert_eq!(value["testMatch"], TEST_MATCH);
        assert_eq!(value["use"]["locale"], "en-US");
        assert_eq!(value["use"]["baseURL"], "http://localhost:3100/");
        assert_eq!(value["use"]["viewport"]["width"], 1280);
        assert_eq!(value["use"]["defaultBrowserType"], "chromium");
    }
}
