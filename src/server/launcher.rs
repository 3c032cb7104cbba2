//! Server launcher
//!
//! Starts each server in topology order, then waits for all of them to
//! become ready concurrently. A server that is already answering is reused
//! when its descriptor allows it.

use std::process::Stdio;
use std::time::Duration;

use futures_util::future::try_join_all;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};

use super::spec::{ReadinessMode, ServerSpec};
use crate::common::{Error, Result};

/// Delay between readiness probes
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound for a single probe attempt
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Grace period between SIGTERM and SIGKILL on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A server this launcher is responsible for
#[derive(Debug)]
pub struct ManagedServer {
    pub spec: ServerSpec,
    /// `None` when an already-running instance was reused
    child: Option<Child>,
}

impl ManagedServer {
    pub fn is_reused(&self) -> bool {
        self.child.is_none()
    }
}

/// Servers started (or reused) for one invocation
#[derive(Debug, Default)]
pub struct RunningServers {
    servers: Vec<ManagedServer>,
}

impl RunningServers {
    pub fn servers(&self) -> &[ManagedServer] {
        &self.servers
    }

    /// Terminate every spawned server; reused servers are left alone
    pub async fn shutdown(&mut self) {
        for server in self.servers.iter_mut().rev() {
            let Some(mut child) = server.child.take() else {
                continue;
            };
            tracing::debug!(command = %server.spec.command, "Stopping server");
            terminate(&mut child).await;
        }
    }
}

impl Drop for RunningServers {
    fn drop(&mut self) {
        for server in &mut self.servers {
            if let Some(child) = server.child.as_mut() {
                tracing::debug!(command = %server.spec.command, "Killing server left running");
                kill_now(child);
            }
        }
    }
}

/// Starts servers and checks their readiness
#[derive(Debug, Clone)]
pub struct Launcher {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl Launcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
        Ok(Self {
            client,
            poll_interval: POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Probe readiness once
    pub async fn is_ready(&self, readiness: &ReadinessMode) -> bool {
        match readiness {
            ReadinessMode::Port { port } => {
                matches!(
                    timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", *port))).await,
                    Ok(Ok(_))
                )
            }
            ReadinessMode::Url { url } => match self.client.get(url.clone()).send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    tracing::trace!(url = %url, error = %e, "Readiness probe failed");
                    false
                }
            },
        }
    }

    /// Start every server in order and block until all are ready
    ///
    /// On failure, servers started so far are shut down before returning.
    pub async fn launch(&self, specs: &[ServerSpec]) -> Result<RunningServers> {
        let mut running = RunningServers::default();
        self.launch_into(specs, &mut running).await?;
        Ok(running)
    }

    /// Like [`Launcher::launch`], recording each server in `running` as soon as it starts
    ///
    /// If this future is dropped before completing, `running` still owns every
    /// spawned child, so the caller can shut them down.
    pub async fn launch_into(&self, specs: &[ServerSpec], running: &mut RunningServers) -> Result<()> {
        for spec in specs {
            match self.start(spec).await {
                Ok(server) => running.servers.push(server),
                Err(e) => {
                    running.shutdown().await;
                    return Err(e);
                }
            }
        }

        let waits = running
            .servers
            .iter_mut()
            .filter(|server| !server.is_reused())
            .map(|server| self.wait_ready(server));

        let ready = try_join_all(waits).await;
        if let Err(e) = ready {
            running.shutdown().await;
            return Err(e);
        }

        tracing::info!(count = running.servers.len(), "All servers ready");
        Ok(())
    }

    async fn start(&self, spec: &ServerSpec) -> Result<ManagedServer> {
        if self.is_ready(&spec.readiness).await {
            if spec.reuse_existing {
                tracing::info!(readiness = %spec.readiness, "Reusing existing server");
                return Ok(ManagedServer {
                    spec: spec.clone(),
                    child: None,
                });
            }
            return Err(Error::ServerAlreadyRunning {
                target: spec.readiness.to_string(),
            });
        }

        tracing::info!(command = %spec.command, readiness = %spec.readiness, "Starting server");
        let child = spawn_shell(&spec.command)?;
        Ok(ManagedServer {
            spec: spec.clone(),
            child: Some(child),
        })
    }

    async fn wait_ready(&self, server: &mut ManagedServer) -> Result<()> {
        let spec = &server.spec;
        let deadline = Instant::now() + Duration::from_millis(spec.timeout_ms);

        loop {
            if self.is_ready(&spec.readiness).await {
                tracing::info!(readiness = %spec.readiness, "Server ready");
                return Ok(());
            }

            if let Some(child) = server.child.as_mut() {
                if let Some(status) = child.try_wait()? {
                    return Err(Error::ServerExited {
                        command: spec.command.clone(),
                        target: spec.readiness.to_string(),
                        code: status.code(),
                    });
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::readiness_timeout(
                    &spec.command,
                    &spec.readiness.to_string(),
                    spec.timeout_ms,
                ));
            }

            sleep(self.poll_interval).await;
        }
    }
}

fn spawn_shell(command: &str) -> Result<Child> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    // Own process group so the whole tree can be signalled on shutdown
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn().map_err(|e| Error::ServerSpawn {
        command: command.to_string(),
        error: e.to_string(),
    })
}

async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // Negative pid targets the process group
        let result = unsafe { libc::kill(-(pid as i32), libc::SIGTERM) };
        if result == 0 && timeout(SHUTDOWN_GRACE, child.wait()).await.is_ok() {
            return;
        }
    }

    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill server process: {}", e);
    }
}

/// Kill the whole process group without waiting
fn kill_now(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        unsafe { libc::kill(-(pid as i32), libc::SIGKILL) };
    }
    let _ = child.start_kill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Answers every request with the given status line
    async fn http_stub(status: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status);
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });
        port
    }

    fn launcher() -> Launcher {
        Launcher::new()
            .unwrap()
            .with_poll_interval(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_port_probe() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let closed = free_port().await;

        let launcher = launcher();
        assert!(launcher.is_ready(&ReadinessMode::Port { port: open }).await);
        assert!(!launcher.is_ready(&ReadinessMode::Port { port: closed }).await);
    }

    #[tokio::test]
    async fn test_url_probe_requires_success_status() {
        let ok = http_stub("200 OK").await;
        let missing = http_stub("404 Not Found").await;
        let launcher = launcher();

        let url = |port: u16| ReadinessMode::Url {
            url: Url::parse(&format!("http://127.0.0.1:{}/embed/embed.js", port)).unwrap(),
        };
        assert!(launcher.is_ready(&url(ok)).await);
        assert!(!launcher.is_ready(&url(missing)).await);
    }

    #[tokio::test]
    async fn test_reuses_running_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let spec = ServerSpec::on_port("exit 1", port, 1_000, true);

        let mut running = launcher().launch(&[spec]).await.unwrap();
        assert_eq!(running.servers().len(), 1);
        assert!(running.servers()[0].is_reused());
        running.shutdown().await;
    }

    #[tokio::test]
    async fn test_refuses_running_server_without_reuse() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let spec = ServerSpec::on_port("exit 1", port, 1_000, false);

        let err = launcher().launch(&[spec]).await.unwrap_err();
        assert!(matches!(err, Error::ServerAlreadyRunning { .. }));
        assert!(err.is_configuration());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_server_exiting_early_fails() {
        let port = free_port().await;
        let spec = ServerSpec::on_port("exit 3", port, 5_000, true);

        let err = launcher().launch(&[spec]).await.unwrap_err();
        match err {
            Error::ServerExited { code, .. } => assert_eq!(code, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    fn is_alive(pid: u32) -> bool {
        unsafe { libc::kill(pid as i32, 0) == 0 }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancelled_launch_leaves_servers_to_shut_down() {
        let port = free_port().await;
        let spec = ServerSpec::on_port("sleep 30", port, 20_000, true);
        let launcher = launcher();
        let mut running = RunningServers::default();

        tokio::select! {
            _ = sleep(Duration::from_millis(300)) => {}
            result = launcher.launch_into(std::slice::from_ref(&spec), &mut running) => {
                panic!("launch finished before cancellation: {result:?}");
            }
        }

        assert_eq!(running.servers().len(), 1);
        let pid = running.servers[0].child.as_ref().and_then(Child::id).unwrap();
        assert!(is_alive(pid));

        running.shutdown().await;
        assert!(!is_alive(pid));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_readiness_timeout() {
        let port = free_port().await;
        let spec = ServerSpec::on_port("sleep 5", port, 200, true);

        let started = std::time::Instant::now();
        let err = launcher().launch(&[spec]).await.unwrap_err();
        assert!(matches!(err, Error::ReadinessTimeout { timeout_ms: 200, .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
