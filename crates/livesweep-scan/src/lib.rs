//! livesweep-scan: Concurrent liveness sweep over IPv4 address ranges.
//!
//! Expands ranges into probe targets, pings them across a bounded worker
//! pool, and writes every live address to a text listing and a CSV table.
//! An interrupted sweep still saves what it found.

pub mod config;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod prober;
pub mod progress;
pub mod sink;

pub use error::{Result, ScanError};
pub use orchestrator::{ScanOrchestrator, ScanReport, ScanSettings, Termination};
