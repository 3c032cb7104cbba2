//! Readiness probe selection
//!
//! Embed bundles depend on a script served by the primary application. An
//! open port does not mean that route answers yet, so once an embed project
//! is selected the primary server is probed over HTTP instead.

use url::Url;

use super::spec::{ReadinessMode, ServerSpec};
use crate::common::{Error, Result};

/// Build the readiness URL for `path` under `base_url`
pub fn probe_url(base_url: &Url, path: &str) -> Result<Url> {
    let raw = format!(
        "{}/{}",
        base_url.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&raw).map_err(|e| Error::InvalidUrl {
        url: raw,
        error: e.to_string(),
    })
}

/// Switch `server` from port readiness to an HTTP probe of `probe`
///
/// Returns whether the descriptor changed. A descriptor already in URL mode
/// is left untouched.
pub fn ensure_serves_embed(server: &mut ServerSpec, probe: &Url) -> bool {
    if server.readiness.is_url() {
        return false;
    }

    server.readiness = ReadinessMode::Url { url: probe.clone() };
    tracing::info!(
        url = %probe,
        "Ensuring that {} is 200 before starting tests",
        probe.path()
    );
    true
}
