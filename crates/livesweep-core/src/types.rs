//! Core domain types for a liveness sweep.
//!
//! Addresses are plain `Ipv4Addr` values; arithmetic on them happens in
//! `u32`/`u64` space and text conversion only at the edges.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// ── Ranges ────────────────────────────────────────────────────────

/// An inclusive IPv4 address range. `start <= end` always holds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct AddressRange {
    start: Ipv4Addr,
    end: Ipv4Addr,
}

impl AddressRange {
    /// Build a range from two endpoints in either order.
    pub fn new(a: Ipv4Addr, b: Ipv4Addr) -> Self {
        if u32::from(b) < u32::from(a) {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    /// A range covering exactly one address.
    pub fn single(addr: Ipv4Addr) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    pub fn start(&self) -> Ipv4Addr {
        self.start
    }

    pub fn end(&self) -> Ipv4Addr {
        self.end
    }

    /// Number of addresses in the range. A full /0 holds 2^32 addresses,
    /// which does not fit in `u32`.
    pub fn size(&self) -> u64 {
        u64::from(u32::from(self.end)) - u64::from(u32::from(self.start)) + 1
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        let a = u32::from(addr);
        u32::from(self.start) <= a && a <= u32::from(self.end)
    }

    /// Label written next to every live address found in this range.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl From<Ipv4Net> for AddressRange {
    fn from(net: Ipv4Net) -> Self {
        Self::new(net.network(), net.broadcast())
    }
}

/// Accepts `a.b.c.d e.f.g.h`, `a.b.c.d-e.f.g.h`, `a.b.c.d/n` and a bare
/// `a.b.c.d`.
impl FromStr for AddressRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.contains('/') {
            let net: Ipv4Net = s
                .parse()
                .map_err(|_| CoreError::InvalidRange(s.to_string()))?;
            return Ok(net.into());
        }

        let (a, b) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => {
                let mut parts = s.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(a), Some(b), None) => (a, b),
                    (Some(a), None, None) => (a, a),
                    _ => return Err(CoreError::InvalidRange(s.to_string())),
                }
            }
        };

        Ok(Self::new(parse_addr(a)?, parse_addr(b)?))
    }
}

fn parse_addr(s: &str) -> Result<Ipv4Addr> {
    s.parse()
        .map_err(|_| CoreError::InvalidAddress(s.to_string()))
}

// ── Sampling ──────────────────────────────────────────────────────

/// Which addresses of a range get probed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// First and last address only.
    EdgeOnly,
    /// Edges plus every `step`-th address in between.
    #[default]
    Sample,
    /// Every address.
    Full,
}

impl SamplingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdgeOnly => "edge_only",
            Self::Sample => "sample",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for SamplingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "edge_only" | "edge" => Ok(Self::EdgeOnly),
            "sample" => Ok(Self::Sample),
            "full" => Ok(Self::Full),
            _ => Err(CoreError::InvalidPolicy(s.to_string())),
        }
    }
}

// ── Probing ───────────────────────────────────────────────────────

/// One address queued for probing, tagged with the range it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTarget {
    pub address: Ipv4Addr,
    pub source: AddressRange,
}

impl ProbeTarget {
    pub fn new(address: Ipv4Addr, source: AddressRange) -> Self {
        Self { address, source }
    }
}

/// Result of probing a single target. Exactly one exists per submitted target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub target: ProbeTarget,
    pub alive: bool,
}

impl ProbeOutcome {
    pub fn alive(target: ProbeTarget) -> Self {
        Self {
            target,
            alive: true,
        }
    }

    pub fn dead(target: ProbeTarget) -> Self {
        Self {
            target,
            alive: false,
        }
    }
}

/// A live address as persisted to the result files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveEntry {
    pub address: Ipv4Addr,
    pub range: AddressRange,
}

impl LiveEntry {
    pub fn source_label(&self) -> String {
        self.range.label()
    }
}

impl From<ProbeTarget> for LiveEntry {
    fn from(target: ProbeTarget) -> Self {
        Self {
            address: target.address,
            range: target.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_normalizes_swapped_endpoints() {
        let r = AddressRange::new(ip("10.0.0.9"), ip("10.0.0.1"));
        assert_eq!(r.start(), ip("10.0.0.1"));
        assert_eq!(r.end(), ip("10.0.0.9"));
        assert_eq!(r.size(), 9);
    }

    #[test]
    fn test_size_of_whole_address_space() {
        let r = AddressRange::new(ip("0.0.0.0"), ip("255.255.255.255"));
        assert_eq!(r.size(), 1u64 << 32);
    }

    #[test]
    fn test_label_and_contains() {
        let r = AddressRange::new(ip("192.168.1.0"), ip("192.168.1.255"));
        assert_eq!(r.label(), "192.168.1.0-192.168.1.255");
        assert!(r.contains(ip("192.168.1.77")));
        assert!(!r.contains(ip("192.168.2.0")));
    }

    #[test]
    fn test_parse_range_forms() {
        let pair: AddressRange = "10.0.0.1 10.0.0.5".parse().unwrap();
        let dash: AddressRange = "10.0.0.1-10.0.0.5".parse().unwrap();
        let tabbed: AddressRange = "10.0.0.5\t10.0.0.1".parse().unwrap();
        assert_eq!(pair, dash);
        assert_eq!(pair, tabbed);

        let cidr: AddressRange = "10.1.2.3/24".parse().unwrap();
        assert_eq!(cidr.start(), ip("10.1.2.0"));
        assert_eq!(cidr.end(), ip("10.1.2.255"));

        let single: AddressRange = "10.0.0.1".parse().unwrap();
        assert_eq!(single.size(), 1);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(matches!(
            "10.0.0.1 nope".parse::<AddressRange>(),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!(matches!(
            "10.0.0.1 10.0.0.2 10.0.0.3".parse::<AddressRange>(),
            Err(CoreError::InvalidRange(_))
        ));
        assert!("10.0.0.0/40".parse::<AddressRange>().is_err());
        assert!("256.0.0.1".parse::<AddressRange>().is_err());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("edge_only".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::EdgeOnly);
        assert_eq!("Edge-Only".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::EdgeOnly);
        assert_eq!("SAMPLE".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::Sample);
        assert_eq!("full".parse::<SamplingPolicy>().unwrap(), SamplingPolicy::Full);
        assert!("everything".parse::<SamplingPolicy>().is_err());
    }

    #[test]
    fn test_policy_serde_names() {
        let json = serde_json::to_string(&SamplingPolicy::EdgeOnly).unwrap();
        assert_eq!(json, "\"edge_only\"");
        let back: SamplingPolicy = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(back, SamplingPolicy::Full);
        assert_eq!(SamplingPolicy::default(), SamplingPolicy::Sample);
    }

    #[test]
    fn test_live_entry_from_target() {
        let range = AddressRange::new(ip("10.0.0.0"), ip("10.0.0.3"));
        let entry = LiveEntry::from(ProbeTarget::new(ip("10.0.0.2"), range));
        assert_eq!(entry.address, ip("10.0.0.2"));
        assert_eq!(entry.source_label(), "10.0.0.0-10.0.0.3");
    }
}
