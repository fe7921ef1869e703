//! Browser driver process management
//!
//! Spawns the driver executable on a loopback port and waits until it
//! reports ready.

use std::net::{Ipv4Addr, TcpListener};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};

use crate::common::config::DriverSettings;
use crate::common::{Error, Result};

use super::client::WebDriverClient;

/// Interval between readiness probes
const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A running driver process
pub struct DriverProcess {
    child: Child,
    port: u16,
    /// Set when the process must outlive this handle
    detached: bool,
}

impl DriverProcess {
    /// Spawn the driver listening on the configured port, or a free one
    pub async fn spawn(settings: &DriverSettings) -> Result<Self> {
        let port = if settings.port == 0 {
            free_port()?
        } else {
            settings.port
        };

        let mut cmd = Command::new(&settings.path);
        cmd.arg(format!("--port={}", port))
            .args(&settings.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null()) // Stdout is reserved for the test report
            .stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(|e| {
            Error::SessionStartFailed(format!(
                "Failed to start {}: {}",
                settings.path.display(),
                e
            ))
        })?;

        tracing::info!(
            "Started driver {} (pid {:?}) on port {}",
            settings.path.display(),
            child.id(),
            port
        );

        Ok(Self {
            child,
            port,
            detached: false,
        })
    }

    /// HTTP endpoint of the driver
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", Ipv4Addr::LOCALHOST, self.port)
    }

    /// Poll the driver's status endpoint until it reports ready
    ///
    /// Each probe is bounded by the time left, so a listener that accepts
    /// and never answers cannot stall startup past `timeout`.
    pub async fn wait_ready(&mut self, client: &WebDriverClient, timeout: Duration) -> Result<()> {
        // None when the timeout is too large to represent, i.e. unbounded
        let deadline = Instant::now().checked_add(timeout);
        let not_ready = || {
            Error::SessionStartFailed(format!(
                "Driver did not become ready within {} seconds",
                timeout.as_secs()
            ))
        };

        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(Error::SessionStartFailed(format!(
                    "Driver exited during startup with {}",
                    status
                )));
            }

            let remaining =
                deadline.map_or(timeout, |d| d.saturating_duration_since(Instant::now()));
            let Ok(probe) = tokio::time::timeout(remaining, client.status()).await else {
                return Err(not_ready());
            };

            match probe {
                Ok(status) if status.ready => {
                    tracing::debug!("Driver ready: {}", status.message);
                    return Ok(());
                }
                Ok(status) => tracing::debug!("Driver not ready yet: {}", status.message),
                Err(e) => tracing::trace!("Driver not reachable yet: {}", e),
            }

            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(not_ready());
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Kill the driver process and reap it
    pub async fn terminate(&mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().await?;
        }
        tracing::debug!("Driver on port {} terminated", self.port);
        Ok(())
    }

    /// Leave the driver running after this handle is dropped
    pub fn detach(&mut self) {
        self.detached = true;
    }

    #[cfg(test)]
    fn is_running(&mut self) -> bool {
        self.child.try_wait().ok().flatten().is_none()
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        // Best-effort since we can't await in drop
        if !self.detached {
            let _ = self.child.start_kill();
        }
    }
}

/// Ask the OS for a free loopback port
///
/// The listener is closed before the driver binds, so another process may
/// grab the port in between. `wait_ready` then gives up at its deadline.
fn free_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}
