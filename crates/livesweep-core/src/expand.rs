//! Range expansion: turn an address range and a sampling policy into the
//! addresses to probe.
//!
//! Expansion is lazy and holds no shared state, so calling [`expand`] twice
//! on the same input yields the same sequence.

use std::net::Ipv4Addr;

use crate::types::{AddressRange, ProbeTarget, SamplingPolicy};

/// Lazy sequence of addresses produced by [`expand`].
///
/// Order is `start`, then `end` (for ranges wider than one address), then
/// any interior addresses ascending. `Full` yields strictly ascending.
#[derive(Debug, Clone)]
pub struct Expansion {
    start: u64,
    end: u64,
    policy: SamplingPolicy,
    step: u64,
    phase: Phase,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Start,
    End,
    Interior { next: u64, stride: u64, limit: u64 },
    Done,
}

/// Expand `range` under `policy`.
///
/// `step` only matters for [`SamplingPolicy::Sample`]; a zero step is
/// treated as 1.
pub fn expand(range: &AddressRange, policy: SamplingPolicy, step: u32) -> Expansion {
    let start = u64::from(u32::from(range.start()));
    let end = u64::from(u32::from(range.end()));

    let phase = match policy {
        SamplingPolicy::Full => Phase::Interior {
            next: start,
            stride: 1,
            limit: end + 1,
        },
        SamplingPolicy::EdgeOnly | SamplingPolicy::Sample => Phase::Start,
    };

    Expansion {
        start,
        end,
        policy,
        step: u64::from(step.max(1)),
        phase,
    }
}

impl Expansion {
    fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// What follows the two edge addresses.
    fn after_edges(&self) -> Phase {
        match self.policy {
            SamplingPolicy::Sample if self.size() <= self.step => Phase::Interior {
                next: self.start + 1,
                stride: 1,
                limit: self.end,
            },
            // Stops strictly below `end`; addresses between the last step
            // multiple and `end` are not probed.
            SamplingPolicy::Sample => Phase::Interior {
                next: self.start + self.step,
                stride: self.step,
                limit: self.end,
            },
            _ => Phase::Done,
        }
    }
}

impl Iterator for Expansion {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        match self.phase {
            Phase::Start => {
                self.phase = if self.end > self.start {
                    Phase::End
                } else {
                    Phase::Done
                };
                Some(to_addr(self.start))
            }
            Phase::End => {
                self.phase = self.after_edges();
                Some(to_addr(self.end))
            }
            Phase::Interior { next, stride, limit } => {
                if next < limit {
                    self.phase = Phase::Interior {
                        next: next + stride,
                        stride,
                        limit,
                    };
                    Some(to_addr(next))
                } else {
                    self.phase = Phase::Done;
                    None
                }
            }
            Phase::Done => None,
        }
    }
}

fn to_addr(value: u64) -> Ipv4Addr {
    // Every value handed out lies within [start, end], both of which came
    // from a u32.
    Ipv4Addr::from(value as u32)
}

/// Flatten ranges into the full candidate set, tagging each address with
/// its source range. Duplicate addresses across overlapping ranges are kept.
pub fn build_targets(
    ranges: &[AddressRange],
    policy: SamplingPolicy,
    step: u32,
) -> Vec<ProbeTarget> {
    ranges
        .iter()
        .flat_map(|range| {
            expand(range, policy, step).map(move |addr| ProbeTarget::new(addr, *range))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const POLICIES: [SamplingPolicy; 3] = [
        SamplingPolicy::EdgeOnly,
        SamplingPolicy::Sample,
        SamplingPolicy::Full,
    ];

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn range(a: &str, b: &str) -> AddressRange {
        AddressRange::new(ip(a), ip(b))
    }

    fn collect(r: &AddressRange, policy: SamplingPolicy, step: u32) -> Vec<Ipv4Addr> {
        expand(r, policy, step).collect()
    }

    /// A spread of small ranges including ones that touch the top of the
    /// address space.
    fn sample_ranges() -> Vec<AddressRange> {
        let mut out = Vec::new();
        for base in [0u32, 0x0A00_0000, 0xC0A8_0100, u32::MAX - 600] {
            for len in [0u32, 1, 2, 3, 7, 15, 16, 17, 255, 256, 257, 511, 512, 600] {
                let start = Ipv4Addr::from(base);
                let end = Ipv4Addr::from(base.saturating_add(len));
                out.push(AddressRange::new(start, end));
            }
        }
        out
    }

    #[test]
    fn test_single_address_range_yields_one_address() {
        let r = range("10.0.0.1", "10.0.0.1");
        for policy in POLICIES {
            for step in [1, 2, 256] {
                assert_eq!(collect(&r, policy, step), vec![ip("10.0.0.1")]);
            }
        }
    }

    #[test]
    fn test_edge_only() {
        let r = range("10.0.0.0", "10.0.0.255");
        assert_eq!(
            collect(&r, SamplingPolicy::EdgeOnly, 256),
            vec![ip("10.0.0.0"), ip("10.0.0.255")]
        );
    }

    #[test]
    fn test_full_is_ascending_and_complete() {
        let r = range("10.0.0.250", "10.0.1.4");
        let got = collect(&r, SamplingPolicy::Full, 256);
        assert_eq!(got.len(), 11);
        assert_eq!(got.first(), Some(&ip("10.0.0.250")));
        assert_eq!(got.last(), Some(&ip("10.0.1.4")));
        assert!(got.windows(2).all(|w| u32::from(w[0]) + 1 == u32::from(w[1])));
    }

    #[test]
    fn test_sample_large_range_uses_step() {
        let r = range("10.0.0.0", "10.0.1.255");
        assert_eq!(
            collect(&r, SamplingPolicy::Sample, 256),
            vec![ip("10.0.0.0"), ip("10.0.1.255"), ip("10.0.1.0")]
        );
    }

    #[test]
    fn test_sample_step_loop_stops_below_end() {
        // 0..=10 with step 4: interior stops at 8, and 10 is only there as
        // the end edge. 9 is never probed.
        let r = range("10.0.0.0", "10.0.0.10");
        assert_eq!(
            collect(&r, SamplingPolicy::Sample, 4),
            vec![ip("10.0.0.0"), ip("10.0.0.10"), ip("10.0.0.4"), ip("10.0.0.8")]
        );

        // When a step multiple lands exactly on end it is not yielded twice.
        let r = range("10.0.0.0", "10.0.0.8");
        assert_eq!(
            collect(&r, SamplingPolicy::Sample, 4),
            vec![ip("10.0.0.0"), ip("10.0.0.8"), ip("10.0.0.4")]
        );
    }

    #[test]
    fn test_sample_within_step_matches_full() {
        let r = range("192.168.1.10", "192.168.1.14");
        assert_eq!(
            collect(&r, SamplingPolicy::Sample, 256),
            vec![
                ip("192.168.1.10"),
                ip("192.168.1.14"),
                ip("192.168.1.11"),
                ip("192.168.1.12"),
                ip("192.168.1.13"),
            ]
        );
    }

    #[test]
    fn test_zero_step_behaves_like_one() {
        let r = range("10.0.0.0", "10.0.0.3");
        let zero: BTreeSet<_> = collect(&r, SamplingPolicy::Sample, 0).into_iter().collect();
        let full: BTreeSet<_> = collect(&r, SamplingPolicy::Full, 0).into_iter().collect();
        assert_eq!(zero, full);
    }

    #[test]
    fn test_top_of_address_space_does_not_overflow() {
        let r = range("255.255.255.250", "255.255.255.255");
        assert_eq!(collect(&r, SamplingPolicy::Full, 1).len(), 6);
        assert_eq!(collect(&r, SamplingPolicy::Sample, 4).len(), 3);
        assert_eq!(collect(&r, SamplingPolicy::Sample, 1000).len(), 6);
    }

    #[test]
    fn test_property_sample_equals_full_when_size_within_step() {
        for r in sample_ranges() {
            for step in [1u32, 16, 256, 512, 1024] {
                if r.size() > u64::from(step) {
                    continue;
                }
                let sample: BTreeSet<_> = expand(&r, SamplingPolicy::Sample, step).collect();
                let full: BTreeSet<_> = expand(&r, SamplingPolicy::Full, step).collect();
                assert_eq!(sample, full, "range {r} step {step}");
            }
        }
    }

    #[test]
    fn test_property_edge_only_count_and_membership() {
        for r in sample_ranges() {
            let got = collect(&r, SamplingPolicy::EdgeOnly, 256);
            assert_eq!(got.len() as u64, r.size().min(2), "range {r}");
            assert!(got.contains(&r.start()));
            assert!(got.contains(&r.end()));
        }
    }

    #[test]
    fn test_property_all_addresses_within_range_and_unique() {
        for r in sample_ranges() {
            for policy in POLICIES {
                for step in [1u32, 3, 16, 256] {
                    let got = collect(&r, policy, step);
                    assert!(got.iter().all(|a| r.contains(*a)), "range {r} {policy}");
                    let unique: BTreeSet<_> = got.iter().collect();
                    assert_eq!(unique.len(), got.len(), "range {r} {policy} step {step}");
                }
            }
        }
    }

    #[test]
    fn test_property_sample_interior_is_exact_step_multiples_below_end() {
        for r in sample_ranges() {
            for step in [2u32, 3, 16, 256] {
                if r.size() <= u64::from(step) {
                    continue;
                }
                let start = u64::from(u32::from(r.start()));
                let end = u64::from(u32::from(r.end()));
                let expected: Vec<u64> = (1..)
                    .map(|k| start + k * u64::from(step))
                    .take_while(|a| *a < end)
                    .collect();
                let interior: Vec<u64> = expand(&r, SamplingPolicy::Sample, step)
                    .skip(2)
                    .map(|a| u64::from(u32::from(a)))
                    .collect();
                assert_eq!(interior, expected, "range {r} step {step}");
            }
        }
    }

    #[test]
    fn test_expansion_is_restartable() {
        let r = range("10.0.0.0", "10.0.4.0");
        let first = collect(&r, SamplingPolicy::Sample, 256);
        let second = collect(&r, SamplingPolicy::Sample, 256);
        assert_eq!(first, second);

        let it = expand(&r, SamplingPolicy::Sample, 256);
        assert_eq!(it.clone().count(), it.count());
    }

    #[test]
    fn test_build_targets_keeps_provenance_and_duplicates() {
        let a = range("10.0.0.0", "10.0.0.3");
        let b = range("10.0.0.3", "10.0.0.3");
        let targets = build_targets(&[a, b], SamplingPolicy::EdgeOnly, 256);

        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], ProbeTarget::new(ip("10.0.0.0"), a));
        assert_eq!(targets[1], ProbeTarget::new(ip("10.0.0.3"), a));
        assert_eq!(targets[2], ProbeTarget::new(ip("10.0.0.3"), b));
    }
}
