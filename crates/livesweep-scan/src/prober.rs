//! Liveness probes.
//!
//! [`PingProber`] shells out to the system `ping` binary via
//! `tokio::process::Command`, one echo request per address. Any failure to
//! run the binary counts as "not alive".

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// A single reachability check against one address.
///
/// Implementations must return within roughly `timeout` and report every
/// internal failure as `false`.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, addr: Ipv4Addr, timeout: Duration) -> bool;
}

/// Wall-clock bound the caller enforces around a probe whose own timeout
/// is `timeout`.
pub fn hard_deadline(timeout: Duration) -> Duration {
    (timeout + Duration::from_secs(1)).max(Duration::from_secs(2))
}

/// Wrapper around the system ping binary.
pub struct PingProber {
    ping_path: String,
}

impl PingProber {
    pub fn new(ping_path: &str) -> Self {
        Self {
            ping_path: ping_path.to_string(),
        }
    }

    /// Arguments for a single echo request with the given timeout.
    pub fn ping_args(addr: Ipv4Addr, timeout: Duration) -> Vec<String> {
        if cfg!(windows) {
            vec![
                "-n".into(),
                "1".into(),
                "-w".into(),
                timeout.as_millis().to_string(),
                addr.to_string(),
            ]
        } else {
            // `-W` takes whole seconds on Linux and BSD.
            let secs = timeout.as_secs_f64().round().max(1.0) as u64;
            vec![
                "-c".into(),
                "1".into(),
                "-W".into(),
                secs.to_string(),
                addr.to_string(),
            ]
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, addr: Ipv4Addr, timeout: Duration) -> bool {
        let status = Command::new(&self.ping_path)
            .args(Self::ping_args(addr, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) => s.success(),
            Err(e) => {
                tracing::trace!(address = %addr, error = %e, "Ping invocation failed");
                false
            }
        }
    }
}
