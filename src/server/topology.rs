//! Server topology
//!
//! The primary application server always comes first. Each selected project
//! that owns an auxiliary server appends it, in the order the selection flags
//! appear, since the launcher starts servers one after another.

use url::Url;

use super::readiness::{ensure_serves_embed, probe_url};
use super::spec::ServerSpec;
use crate::common::config::{AuxiliaryServerConfig, Config, PrimaryServerConfig};
use crate::common::{selected_projects, Error, Result};
use crate::profile::EnvironmentProfile;

/// Build the ordered list of servers needed by the selected projects
///
/// `base_url` is the primary application's URL, used for its readiness probe.
pub fn build<S: AsRef<str>>(
    args: &[S],
    profile: &EnvironmentProfile,
    config: &Config,
    base_url: &Url,
) -> Result<Vec<ServerSpec>> {
    // A stale server under CI means a broken previous run; never reuse it there
    let reuse_existing = !profile.is_ci;

    let mut servers = vec![primary_server(&config.primary, reuse_existing)?];
    let mut provisioned: Vec<&str> = Vec::new();

    for name in selected_projects(args) {
        let Some(aux) = config.auxiliary_for(name) else {
            continue;
        };
        if provisioned.contains(&aux.project.as_str()) {
            tracing::debug!(project = %aux.project, "Auxiliary server already provisioned");
            continue;
        }

        let probe = probe_url(base_url, &config.primary.embed_probe_path)?;
        ensure_serves_embed(&mut servers[0], &probe);
        servers.push(auxiliary_server(aux, reuse_existing)?);
        provisioned.push(aux.project.as_str());
    }

    Ok(servers)
}

fn primary_server(primary: &PrimaryServerConfig, reuse_existing: bool) -> Result<ServerSpec> {
    validate(&primary.command, primary.port)?;
    Ok(ServerSpec::on_port(
        with_port(&primary.command, primary.port),
        primary.port,
        primary.timeout_ms,
        reuse_existing,
    ))
}

fn auxiliary_server(aux: &AuxiliaryServerConfig, reuse_existing: bool) -> Result<ServerSpec> {
    validate(&aux.command, aux.port)?;
    Ok(ServerSpec::on_port(
        with_port(&aux.command, aux.port),
        aux.port,
        aux.timeout_ms,
        reuse_existing,
    ))
}

/// Substitute the `{port}` placeholder so the command listens where readiness is probed
fn with_port(command: &str, port: u16) -> String {
    command.replace("{port}", &port.to_string())
}

fn validate(command: &str, port: u16) -> Result<()> {
    if command.trim().is_empty() {
        return Err(Error::invalid_server(command, "command is empty"));
    }
    if port == 0 {
        return Err(Error::invalid_server(command, "port must be non-zero"));
    }
    Ok(())
}
