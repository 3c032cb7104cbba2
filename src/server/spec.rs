//! Server descriptors
//!
//! Serialized in the runner's web server shape: `command`, exactly one of
//! `port` or `url`, `timeout` and `reuseExistingServer`.

use std::fmt;

use serde::Serialize;
use url::Url;

/// How a server is judged ready to accept test traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReadinessMode {
    /// A TCP connection to the local port succeeds
    Port { port: u16 },
    /// An HTTP GET to the URL returns a success status
    Url { url: Url },
}

impl ReadinessMode {
    pub fn is_url(&self) -> bool {
        matches!(self, ReadinessMode::Url { .. })
    }
}

impl fmt::Display for ReadinessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessMode::Port { port } => write!(f, "port {}", port),
            ReadinessMode::Url { url } => write!(f, "{}", url),
        }
    }
}

/// A process the runner must have alive before tests execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    pub command: String,
    #[serde(flatten)]
    pub readiness: ReadinessMode,
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    #[serde(rename = "reuseExistingServer")]
    pub reuse_existing: bool,
}

impl ServerSpec {
    pub fn on_port(command: impl Into<String>, port: u16, timeout_ms: u64, reuse_existing: bool) -> Self {
        Self {
            command: command.into(),
            readiness: ReadinessMode::Port { port },
            timeout_ms,
            reuse_existing,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match self.readiness {
            ReadinessMode::Port { port } => Some(port),
            ReadinessMode::Url { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match &self.readiness {
            ReadinessMode::Port { .. } => None,
            ReadinessMode::Url { url } => Some(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_mode_serializes_without_url() {
        let spec = ServerSpec::on_port("yarn dev", 3100, 60_000, true);
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["command"], "yarn dev");
        assert_eq!(value["port"], 3100);
        assert_eq!(value["timeout"], 60_000);
        assert_eq!(value["reuseExistingServer"], true);
        assert!(value.get("url").is_none());
    }

    #[test]
    fn test_url_mode_serializes_without_port() {
        let spec = ServerSpec {
            command: "yarn start".to_string(),
            readiness: ReadinessMode::Url {
                url: Url::parse("http://localhost:3000/embed/embed.js").unwrap(),
            },
            timeout_ms: 60_000,
            reuse_existing: false,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["url"], "http://localhost:3000/embed/embed.js");
        assert!(value.get("port").is_none());
        assert_eq!(spec.port(), None);
        assert!(spec.readiness.is_url());
    }
}
