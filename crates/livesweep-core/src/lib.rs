//! livesweep-core: Data model and range expansion for the livesweep scanner.
//!
//! This crate has no I/O. It provides:
//! - Address ranges and the probe targets derived from them
//! - Sampling policies that decide which addresses of a range get probed
//! - Probe outcomes and the live entries that end up in result files

pub mod error;
pub mod expand;
pub mod types;

pub use error::CoreError;
pub use expand::{build_targets, expand, Expansion};
pub use types::{AddressRange, LiveEntry, ProbeOutcome, ProbeTarget, SamplingPolicy};
