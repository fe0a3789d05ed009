// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared types: tree lookup, event targets, phases, and the style hook.

use core::hash::Hash;

use hashbrown::HashMap;

/// Provides the parent of a node so paths can be reconstructed.
///
/// Implementations must describe an acyclic ancestry; path walks stop at the
/// first node without a parent.
pub trait ParentLookup<K> {
    /// Return the parent of `node`, or `None` for a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// Parent lookup that treats every node as a root.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    fn parent_of(&self, _: &K) -> Option<K> {
        None
    }
}

/// A child → parent map is the simplest host tree.
impl<K: Copy + Eq + Hash> ParentLookup<K> for HashMap<K, K> {
    fn parent_of(&self, node: &K) -> Option<K> {
        self.get(node).copied()
    }
}

/// Origin of a native event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget<K> {
    /// The window (or whole surface) rather than a node.
    Window,
    /// A node in the host tree.
    Node(K),
}

impl<K: Copy> EventTarget<K> {
    /// The target node, if the target is not the window.
    pub fn node(&self) -> Option<K> {
        match self {
            Self::Window => None,
            Self::Node(n) => Some(*n),
        }
    }
}

/// Propagation phase for a negotiation step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Outer → inner, consults the `*_capture` predicates.
    Capture,
    /// Origin only, used by non-bubbling negotiations (scroll, selection).
    Target,
    /// Inner → outer, consults the bubble predicates.
    Bubble,
}

/// Outcome of visiting one step of a sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep walking.
    Continue,
    /// Abort the walk immediately.
    Stop,
}

/// One entry in a negotiation sequence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dispatch<K> {
    /// Phase of this entry.
    pub phase: Phase,
    /// Node visited.
    pub node: K,
}

impl<K> Dispatch<K> {
    /// A capture-phase entry.
    pub fn capture(node: K) -> Self {
        Self {
            phase: Phase::Capture,
            node,
        }
    }

    /// A target-phase entry.
    pub fn target(node: K) -> Self {
        Self {
            phase: Phase::Target,
            node,
        }
    }

    /// A bubble-phase entry.
    pub fn bubble(node: K) -> Self {
        Self {
            phase: Phase::Bubble,
            node,
        }
    }
}

/// Touch handling hint for the host, mirroring CSS `touch-action`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum TouchAction {
    /// Host decides.
    #[default]
    Auto,
    /// Host performs no native touch behavior.
    None,
    /// Horizontal panning only.
    PanX,
    /// Vertical panning only.
    PanY,
    /// Panning and pinch zoom, no double-tap zoom.
    Manipulation,
    /// Pinch zoom only.
    PinchZoom,
}

/// Receives style mutations the registry applies on registration.
pub trait StyleHook<K> {
    /// Apply `action` to `node`.
    fn set_touch_action(&mut self, node: &K, action: TouchAction);
}

/// Style hook that drops every mutation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoStyle;

impl<K> StyleHook<K> for NoStyle {
    fn set_touch_action(&mut self, _: &K, _: TouchAction) {}
}
