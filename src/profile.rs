//! Environment profile
//!
//! Derived once at startup from the environment and threaded into every
//! component that needs it. Nothing else reads the environment.

use url::Url;

use crate::common::config::Timeouts;
use crate::common::env::{self, EnvSource};
use crate::common::{Error, Result};

/// Run-wide settings derived from environment signals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentProfile {
    pub is_ci: bool,
    /// Always true when `is_ci` is
    pub headless: bool,
    pub worker_count: usize,
    pub navigation_timeout_ms: u64,
    /// Default timeout for expectations and actions
    pub default_timeout_ms: u64,
    /// Overall per-test timeout; navigation is nested within it
    pub test_timeout_ms: u64,
    /// Base URL of the primary application, when the environment provides one
    pub base_url: Option<Url>,
}

impl EnvironmentProfile {
    /// Resolve the profile from an environment source
    ///
    /// `host_parallelism` is the worker count used outside debug mode.
    pub fn resolve(
        env: &(impl EnvSource + ?Sized),
        host_parallelism: usize,
        timeouts: &Timeouts,
    ) -> Result<Self> {
        let is_ci = env.is_truthy(env::CI);
        let headless = is_ci || env.is_truthy(env::HEADLESS_OVERRIDE);

        // Interactive stepping needs a single worker
        let worker_count = if env.is_truthy(env::DEBUG_MODE) {
            1
        } else {
            host_parallelism.max(1)
        };

        let base_url = match env.get(env::BASE_URL) {
            Some(raw) if !raw.trim().is_empty() => Some(parse_url(raw.trim())?),
            _ => None,
        };

        let (navigation_timeout_ms, default_timeout_ms, test_timeout_ms) = if is_ci {
            (
                timeouts.ci_navigation_ms,
                timeouts.ci_default_ms,
                timeouts.ci_test_ms,
            )
        } else {
            (
                timeouts.local_navigation_ms,
                timeouts.local_default_ms,
                timeouts.local_test_ms,
            )
        };

        Ok(Self {
            is_ci,
            headless,
            worker_count,
            navigation_timeout_ms,
            default_timeout_ms,
            test_timeout_ms,
            base_url,
        })
    }

    /// Resolve from the process environment and the host's available parallelism
    pub fn detect(timeouts: &Timeouts) -> Result<Self> {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::resolve(&env::ProcessEnv, parallelism, timeouts)
    }

    /// Retries applied by the runner to failing tests
    pub fn retries(&self) -> u32 {
        if self.is_ci {
            2
        } else {
            0
        }
    }

    /// Stop the run after this many failures; unlimited when browsers are visible
    pub fn max_failures(&self) -> Option<u32> {
        self.headless.then_some(10)
    }
}

pub(crate) fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::InvalidUrl {
        url: raw.to_string(),
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(env: &[(&str, &str)], parallelism: usize) -> EnvironmentProfile {
        EnvironmentProfile::resolve(env, parallelism, &Timeouts::default()).unwrap()
    }

    #[test]
    fn test_local_defaults() {
        let profile = resolve(&[], 8);
        assert!(!profile.is_ci);
        assert!(!profile.headless);
        assert_eq!(profile.worker_count, 8);
        assert_eq!(profile.navigation_timeout_ms, 120_000);
        assert_eq!(profile.default_timeout_ms, 120_000);
        assert_eq!(profile.test_timeout_ms, 240_000);
        assert_eq!(profile.retries(), 0);
        assert_eq!(profile.max_failures(), None);
        assert!(profile.base_url.is_none());
    }

    #[test]
    fn test_ci_forces_headless_and_short_timeouts() {
        for headless in ["", "0", "1"] {
            let profile = resolve(&[("CI", "true"), ("PLAYWRIGHT_HEADLESS", headless)], 4);
            assert!(profile.is_ci);
            assert!(profile.headless);
            assert_eq!(profile.navigation_timeout_ms, 30_000);
            assert_eq!(profile.default_timeout_ms, 30_000);
            assert_eq!(profile.test_timeout_ms, 60_000);
            assert_eq!(profile.retries(), 2);
            assert_eq!(profile.max_failures(), Some(10));
        }
    }

    #[test]
    fn test_headless_override_outside_ci() {
        let profile = resolve(&[("PLAYWRIGHT_HEADLESS", "1")], 4);
        assert!(!profile.is_ci);
        assert!(profile.headless);
    }

    #[test]
    fn test_debug_mode_pins_single_worker() {
        for parallelism in [1, 2, 16, 128] {
            let profile = resolve(&[("PWDEBUG", "1")], parallelism);
            assert_eq!(profile.worker_count, 1);
        }
        let profile = resolve(&[("PWDEBUG", "1"), ("CI", "1")], 32);
        assert_eq!(profile.worker_count, 1);
    }

    #[test]
    fn test_base_url_parsed() {
        let profile = resolve(&[("NEXT_PUBLIC_WEBAPP_URL", "http://localhost:3000")], 2);
        assert_eq!(
            profile.base_url.as_ref().map(Url::as_str),
            Some("http://localhost:3000/")
        );
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let err = EnvironmentProfile::resolve(
            &[("NEXT_PUBLIC_WEBAPP_URL", "not a url")],
            2,
            &Timeouts::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }
}
