// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: build negotiation walks and honor stop outcomes.
//!
//! A negotiation asks the eligible nodes of a path, one at a time, whether they want to
//! become the responder. The order is expressed as a sequence of [`Dispatch`] entries:
//!
//! - Capture: outermost → innermost.
//! - Bubble (bubbling negotiations): innermost → outermost.
//! - Target (non-bubbling negotiations): the origin node only, and only if it is eligible.
//!
//! [`run`] walks such a sequence and stops at the first [`Outcome::Stop`]. The engine returns
//! `Stop` both when a predicate accepts and when a predicate stops propagation.
//!
//! ## Minimal example
//!
//! ```
//! use understory_negotiation::dispatcher::{negotiation_sequence, run};
//! use understory_negotiation::types::{Outcome, Phase};
//!
//! // Eligible path, node → root: 3 → 2 → 1. Origin is 3.
//! let seq = negotiation_sequence(&[3, 2, 1], true, 3);
//!
//! let mut seen: Vec<(Phase, u32)> = Vec::new();
//! let stop_at = run(&seq, &mut seen, |d, seen| {
//!     seen.push((d.phase, d.node));
//!     // Node 2 accepts during bubble.
//!     if d.phase == Phase::Bubble && d.node == 2 { Outcome::Stop } else { Outcome::Continue }
//! });
//!
//! assert_eq!(stop_at.map(|d| d.node), Some(2));
//! assert_eq!(seen, vec![
//!     (Phase::Capture, 1), (Phase::Capture, 2), (Phase::Capture, 3),
//!     (Phase::Bubble, 3), (Phase::Bubble, 2),
//! ]);
//! ```

use smallvec::SmallVec;

use crate::types::{Dispatch, Outcome};

/// Inline storage for negotiation walks.
pub type Sequence<K> = SmallVec<[Dispatch<K>; 16]>;

/// Build the negotiation walk over an eligible node → root path.
///
/// When `bubbles` is `false` the bubble walk is replaced by a single target entry for
/// `origin`, emitted only if `origin` is the innermost eligible node.
pub fn negotiation_sequence<K: Copy + Eq>(eligible: &[K], bubbles: bool, origin: K) -> Sequence<K> {
    let mut out = Sequence::new();
    for &n in eligible.iter().rev() {
        out.push(Dispatch::capture(n));
    }
    if bubbles {
        for &n in eligible {
            out.push(Dispatch::bubble(n));
        }
    } else if eligible.first() == Some(&origin) {
        out.push(Dispatch::target(origin));
    }
    out
}

/// Run a handler over a sequence and honor stop outcomes.
///
/// - [`Outcome::Continue`]: keep going.
/// - [`Outcome::Stop`]: abort immediately; no later entries are visited.
///
/// Returns the entry that stopped the walk, or `None` if the full sequence was visited.
/// The `event` payload is threaded through every handler call; you own its shape.
pub fn run<'a, K, E>(
    seq: &'a [Dispatch<K>],
    event: &mut E,
    mut handler: impl FnMut(&Dispatch<K>, &mut E) -> Outcome,
) -> Option<&'a Dispatch<K>> {
    for d in seq {
        match handler(d, event) {
            Outcome::Continue => {}
            Outcome::Stop => return Some(d),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;
    use alloc::vec;
    use alloc::vec::Vec;

    fn phases(seq: &[Dispatch<u32>]) -> Vec<(Phase, u32)> {
        seq.iter().map(|d| (d.phase, d.node)).collect()
    }

    #[test]
    fn bubbling_sequence_captures_outer_first_then_bubbles_inner_first() {
        let seq = negotiation_sequence(&[3, 2, 1], true, 3);
        assert_eq!(
            phases(&seq),
            vec![
                (Phase::Capture, 1),
                (Phase::Capture, 2),
                (Phase::Capture, 3),
                (Phase::Bubble, 3),
                (Phase::Bubble, 2),
                (Phase::Bubble, 1),
            ]
        );
    }

    #[test]
    fn non_bubbling_sequence_checks_origin_only() {
        let seq = negotiation_sequence(&[3, 1], false, 3);
        assert_eq!(
            phases(&seq),
            vec![(Phase::Capture, 1), (Phase::Capture, 3), (Phase::Target, 3)]
        );
    }

    #[test]
    fn non_bubbling_sequence_skips_ineligible_origin() {
        // Origin 4 is not registered; only its ancestors are eligible.
        let seq = negotiation_sequence(&[3, 1], false, 4);
        assert_eq!(phases(&seq), vec![(Phase::Capture, 1), (Phase::Capture, 3)]);
    }

    #[test]
    fn empty_path_yields_empty_sequence() {
        let seq = negotiation_sequence::<u32>(&[], true, 1);
        assert!(seq.is_empty());
    }

    #[test]
    fn continue_through_all() {
        let seq = negotiation_sequence(&[2, 1], true, 2);
        let mut count = 0;
        let stopped = run(&seq, &mut count, |_, c| {
            *c += 1;
            Outcome::Continue
        });
        assert!(stopped.is_none());
        assert_eq!(count, seq.len());
    }

    #[test]
    fn stop_in_capture_skips_bubble() {
        let seq = negotiation_sequence(&[2, 1], true, 2);
        let mut seen: Vec<(Phase, u32)> = Vec::new();
        let stopped = run(&seq, &mut seen, |d, seen| {
            seen.push((d.phase, d.node));
            if d.phase == Phase::Capture && d.node == 1 {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });
        let stopped = stopped.unwrap();
        assert_eq!(stopped.phase, Phase::Capture);
        assert_eq!(seen, vec![(Phase::Capture, 1)]);
    }
}
