//! Configuration for the livesweep scanner.

use std::path::PathBuf;
use std::time::Duration;

use livesweep_core::SamplingPolicy;
use serde::Deserialize;

use crate::error::{Result, ScanError};

/// Top-level sweep configuration.
///
/// Loaded from `livesweep.toml` `[sweep]` section or
/// `LIVESWEEP__SWEEP__` environment variables, then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Range file: one `start end` pair per line.
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Tab-delimited result listing.
    #[serde(default = "default_output_txt")]
    pub output_txt: PathBuf,

    /// CSV result table with an `ip,source_range` header.
    #[serde(default = "default_output_csv")]
    pub output_csv: PathBuf,

    /// Which addresses of each range get probed.
    #[serde(default)]
    pub policy: SamplingPolicy,

    /// Stride between sampled addresses (only used by `sample`).
    #[serde(default = "default_sample_step")]
    pub sample_step: u32,

    /// Number of probes in flight at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-probe timeout handed to the ping binary, in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Path to the ping binary (default: "ping").
    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Emit a progress line every this many processed addresses.
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl SweepConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Reject values the scan cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_step == 0 {
            return Err(ScanError::Config("sample_step must be positive".into()));
        }
        if self.max_workers == 0 {
            return Err(ScanError::Config("max_workers must be positive".into()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(ScanError::Config("probe_timeout_ms must be positive".into()));
        }
        if self.progress_every == 0 {
            return Err(ScanError::Config("progress_every must be positive".into()));
        }
        if self.ping_path.trim().is_empty() {
            return Err(ScanError::Config("ping_path must not be empty".into()));
        }
        Ok(())
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("ranges.txt")
}

fn default_output_txt() -> PathBuf {
    PathBuf::from("live_ips_partial.txt")
}

fn default_output_csv() -> PathBuf {
    PathBuf::from("live_ips_partial.csv")
}

fn default_sample_step() -> u32 {
    256
}

fn default_max_workers() -> usize {
    50
}

fn default_probe_timeout_ms() -> u64 {
    700
}

fn default_ping_path() -> String {
    "ping".to_string()
}

fn default_progress_every() -> usize {
    50
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output_txt: default_output_txt(),
            output_csv: default_output_csv(),
            policy: SamplingPolicy::default(),
            sample_step: default_sample_step(),
            max_workers: default_max_workers(),
            probe_timeout_ms: default_probe_timeout_ms(),
            ping_path: default_ping_path(),
            progress_every: default_progress_every(),
        }
    }
}

/// Load the `[sweep]` section from `<file_prefix>.toml` (optional) and
/// `LIVESWEEP__` environment variables. Falls back to defaults when the
/// section is absent.
pub fn load_sweep_config(file_prefix: &str) -> Result<SweepConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("LIVESWEEP")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ScanError::Config(e.to_string()))?;

    match cfg.get::<SweepConfig>("sweep") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(SweepConfig::default()),
        Err(e) => Err(ScanError::Config(e.to_string())),
    }
}
