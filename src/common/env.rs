//! Environment key-value sources
//!
//! The process environment is read through [`EnvSource`] so the profile
//! resolver can be driven by an injected map in tests.

use std::collections::HashMap;

/// CI detection variable
pub const CI: &str = "CI";
/// Forces headless browsers outside CI
pub const HEADLESS_OVERRIDE: &str = "PLAYWRIGHT_HEADLESS";
/// Debug mode; pins the worker count to 1
pub const DEBUG_MODE: &str = "PWDEBUG";
/// Base URL of the primary application
pub const BASE_URL: &str = "NEXT_PUBLIC_WEBAPP_URL";

/// A read-only key-value environment
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Present, non-empty, and not `0` or `false`
    fn is_truthy(&self, key: &str) -> bool {
        match self.get(key) {
            Some(value) => {
                let value = value.trim();
                !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
            }
            None => false,
        }
    }
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for [(&str, &str)] {
    fn get(&self, key: &str) -> Option<String> {
        self.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

impl<const N: usize> EnvSource for [(&str, &str); N] {
    fn get(&self, key: &str) -> Option<String> {
        EnvSource::get(self.as_slice(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        let env = [
            ("A", "1"),
            ("B", "true"),
            ("C", ""),
            ("D", "0"),
            ("E", "FALSE"),
            ("F", "github-actions"),
        ];
        assert!(env.is_truthy("A"));
        assert!(env.is_truthy("B"));
        assert!(!env.is_truthy("C"));
        assert!(!env.is_truthy("D"));
        assert!(!env.is_truthy("E"));
        assert!(env.is_truthy("F"));
        assert!(!env.is_truthy("MISSING"));
    }

    #[test]
    fn test_hashmap_source() {
        let mut env = HashMap::new();
        env.insert(CI.to_string(), "1".to_string());
        assert_eq!(EnvSource::get(&env, CI).as_deref(), Some("1"));
        assert!(env.is_truthy(CI));
        assert!(!env.is_truthy(DEBUG_MODE));
    }
}
