// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path and ancestry helpers.
//!
//! All paths here are ordered node → root: index `0` is the innermost node and the last
//! element is the root. This is the order the negotiation engine stores and prunes.

use alloc::vec::Vec;
use core::hash::Hash;

use crate::event::{Buttons, Modifiers, NativeEvent, NativeEventKind, PointerKind, Touch};
use crate::registry::Registry;
use crate::types::ParentLookup;

/// Nearest node shared by two node → root paths.
///
/// Returns `None` when either path is empty or when the roots differ. Runs in
/// `O(depth)`: the longer path's inner end is skipped so both paths have the same
/// distance to the root, then both are walked toward the root in lockstep.
///
/// ```
/// use understory_negotiation::path::lowest_common_ancestor;
///
/// // 4 → 2 → 1 and 5 → 3 → 2 → 1 share 2.
/// assert_eq!(lowest_common_ancestor(&[4, 2, 1], &[5, 3, 2, 1]), Some(2));
/// // Different roots.
/// assert_eq!(lowest_common_ancestor(&[4, 2, 1], &[5, 9]), None);
/// ```
pub fn lowest_common_ancestor<K: Copy + Eq>(a: &[K], b: &[K]) -> Option<K> {
    if a.last()? != b.last()? {
        return None;
    }
    let depth = a.len().min(b.len());
    let a = &a[a.len() - depth..];
    let b = &b[b.len() - depth..];
    a.iter().zip(b).find(|(x, y)| x == y).map(|(x, _)| *x)
}

/// Node → root path of `target` reconstructed through `parents`.
pub fn raw_event_path<K: Copy>(target: K, parents: &impl ParentLookup<K>) -> Vec<K> {
    let mut out = Vec::new();
    let mut cur = target;
    // Collect to root; caller ensures acyclic ancestry.
    loop {
        out.push(cur);
        match parents.parent_of(&cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out
}

/// Keep only the nodes of `raw` that have a responder config, preserving order.
pub fn build_eligible_path<K: Copy + Eq + Hash>(raw: &[K], registry: &Registry<K>) -> Vec<K> {
    raw.iter()
        .copied()
        .filter(|n| registry.contains(n))
        .collect()
}

/// `true` if `node` is `ancestor` or one of its descendants.
pub fn contains<K: Copy + Eq>(ancestor: K, node: K, parents: &impl ParentLookup<K>) -> bool {
    let mut cur = Some(node);
    while let Some(n) = cur {
        if n == ancestor {
            return true;
        }
        cur = parents.parent_of(&n);
    }
    false
}

/// `true` if any touch targets `node` or one of its descendants.
pub fn has_active_touch_within<K: Copy + Eq>(
    node: K,
    touches: &[Touch<K>],
    parents: &impl ParentLookup<K>,
) -> bool {
    touches.iter().any(|t| contains(node, t.target, parents))
}

/// `true` for pointer starts and moves that should take part in responder negotiation.
///
/// Touch starts and moves always qualify. Mouse and pen input must use the primary button
/// with neither alt nor ctrl held; secondary clicks and ctrl-click context menus are ignored.
pub fn is_primary_input_activation<K>(native: &NativeEvent<K>) -> bool {
    let pointer_down_kind = matches!(
        native.kind,
        NativeEventKind::PointerStart | NativeEventKind::PointerMove
    );
    if !pointer_down_kind {
        return false;
    }
    if native.pointer == PointerKind::Touch {
        return true;
    }
    let no_modifiers = !native
        .modifiers
        .intersects(Modifiers::ALT | Modifiers::CTRL);
    let primary = match native.kind {
        NativeEventKind::PointerStart => native.button == 0 || native.buttons == Buttons::PRIMARY,
        _ => native.buttons == Buttons::PRIMARY,
    };
    primary && no_modifiers
}
