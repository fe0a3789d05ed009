// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus and focus-within tracking.
//!
//! Focus moves are reported by the host as the node → root path of the newly focused node.
//! [`FocusState::focus`] diffs it against the previous path around their lowest common
//! ancestor and runs, in order:
//!
//! 1. `on_blur` on the previously focused node.
//! 2. Focus-within leave on nodes that no longer contain focus, innermost → outermost.
//! 3. Focus-within enter on nodes that now contain focus, outermost → innermost.
//! 4. `on_focus` on the newly focused node.
//!
//! Nodes above the common ancestor keep focus within and hear nothing.
//!
//! Focus is "visible" while the input modality is keyboard; pointer-initiated focus usually
//! draws no ring. Hosts forward modality changes with [`FocusState::set_modality`].

use alloc::boxed::Box;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_negotiation::modality::Modality;
use understory_negotiation::path::lowest_common_ancestor;

/// Payload of focus callbacks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FocusEvent<K> {
    /// Node gaining or losing focus.
    pub target: K,
    /// The other side of the move: the node losing focus on focus, gaining it on blur.
    pub related_target: Option<K>,
    /// Focus is shown.
    pub focus_visible: bool,
    /// Event time in milliseconds.
    pub timestamp: u64,
}

/// Focus callback.
pub type FocusHandler<K> = Box<dyn FnMut(&FocusEvent<K>)>;

/// Focus hooks for one node.
pub struct FocusConfig<K> {
    /// Node gained focus.
    pub on_focus: Option<FocusHandler<K>>,
    /// Node lost focus.
    pub on_blur: Option<FocusHandler<K>>,
    /// Focused state changed.
    pub on_focus_change: Option<Box<dyn FnMut(bool)>>,
}

impl<K> Default for FocusConfig<K> {
    fn default() -> Self {
        Self {
            on_focus: None,
            on_blur: None,
            on_focus_change: None,
        }
    }
}

impl<K> fmt::Debug for FocusConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusConfig")
            .field("on_focus", &self.on_focus.is_some())
            .field("on_blur", &self.on_blur.is_some())
            .field("on_focus_change", &self.on_focus_change.is_some())
            .finish()
    }
}

/// Focus-within hooks for one node.
pub struct FocusWithinConfig<K> {
    /// Focus entered the node's subtree.
    pub on_focus_within: Option<FocusHandler<K>>,
    /// Focus left the node's subtree.
    pub on_blur_within: Option<FocusHandler<K>>,
    /// Focus-within state changed.
    pub on_focus_within_change: Option<Box<dyn FnMut(bool)>>,
    /// Visibility changed while focus is within.
    pub on_focus_within_visible_change: Option<Box<dyn FnMut(bool)>>,
}

impl<K> Default for FocusWithinConfig<K> {
    fn default() -> Self {
        Self {
            on_focus_within: None,
            on_blur_within: None,
            on_focus_within_change: None,
            on_focus_within_visible_change: None,
        }
    }
}

impl<K> fmt::Debug for FocusWithinConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusWithinConfig")
            .field("on_focus_within", &self.on_focus_within.is_some())
            .field("on_blur_within", &self.on_blur_within.is_some())
            .field(
                "on_focus_within_change",
                &self.on_focus_within_change.is_some(),
            )
            .field(
                "on_focus_within_visible_change",
                &self.on_focus_within_visible_change.is_some(),
            )
            .finish()
    }
}

/// Focused path and the focus hooks of every node.
pub struct FocusState<K> {
    focus: HashMap<K, FocusConfig<K>>,
    within: HashMap<K, FocusWithinConfig<K>>,
    /// Focused node → root.
    path: SmallVec<[K; 8]>,
    visible: bool,
}

impl<K: fmt::Debug> fmt::Debug for FocusState<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusState")
            .field("focus", &self.focus)
            .field("within", &self.within)
            .field("path", &self.path)
            .field("visible", &self.visible)
            .finish()
    }
}

impl<K: Copy + Eq + Hash> FocusState<K> {
    /// Nothing focused, keyboard modality.
    pub fn new() -> Self {
        Self {
            focus: HashMap::new(),
            within: HashMap::new(),
            path: SmallVec::new(),
            visible: true,
        }
    }

    /// Register, replace, or remove the focus hooks of `node`.
    pub fn set_focus_config(&mut self, node: K, config: Option<FocusConfig<K>>) {
        match config {
            Some(config) => {
                self.focus.insert(node, config);
            }
            None => {
                self.focus.remove(&node);
            }
        }
    }

    /// Register, replace, or remove the focus-within hooks of `node`.
    pub fn set_within_config(&mut self, node: K, config: Option<FocusWithinConfig<K>>) {
        match config {
            Some(config) => {
                self.within.insert(node, config);
            }
            None => {
                self.within.remove(&node);
            }
        }
    }

    /// Focused node.
    pub fn focused(&self) -> Option<K> {
        self.path.first().copied()
    }

    /// `true` if `node` is focused or contains the focused node.
    pub fn is_focus_within(&self, node: &K) -> bool {
        self.path.contains(node)
    }

    /// `true` if focus should be drawn.
    pub fn is_focus_visible(&self) -> bool {
        self.visible
    }

    /// Follow an input modality change.
    pub fn set_modality(&mut self, modality: Modality) {
        let visible = modality == Modality::Keyboard;
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        for node in &self.path {
            if let Some(h) = self
                .within
                .get_mut(node)
                .and_then(|c| c.on_focus_within_visible_change.as_mut())
            {
                h(visible);
            }
        }
    }

    /// Move focus to `path[0]`; `path` runs node → root. An empty path blurs.
    pub fn focus(&mut self, path: &[K], timestamp: u64) {
        let Some(&target) = path.first() else {
            self.blur(timestamp);
            return;
        };
        if self.focused() == Some(target) {
            self.path = path.iter().copied().collect();
            return;
        }
        let previous = core::mem::replace(&mut self.path, path.iter().copied().collect());
        let old = previous.first().copied();

        let shared = lowest_common_ancestor(&previous, path);
        let cut = |p: &[K]| {
            shared
                .and_then(|s| p.iter().position(|n| *n == s))
                .unwrap_or(p.len())
        };
        let (old_cut, new_cut) = (cut(previous.as_slice()), cut(path));
        #[cfg(feature = "tracing")]
        tracing::debug!(left = old_cut, entered = new_cut, "focus moved");

        if let Some(old) = old {
            self.node_focus(old, Some(target), false, timestamp);
        }
        for &node in &previous[..old_cut] {
            self.node_within(node, target, false, timestamp);
        }
        for &node in path[..new_cut].iter().rev() {
            self.node_within(node, target, true, timestamp);
        }
        self.node_focus(target, old, true, timestamp);
    }

    /// Clear focus.
    pub fn blur(&mut self, timestamp: u64) {
        let previous = core::mem::take(&mut self.path);
        let Some(&old) = previous.first() else {
            return;
        };
        self.node_focus(old, None, false, timestamp);
        for &node in &previous {
            self.node_within(node, old, false, timestamp);
        }
    }

    /// Forget `node`'s hooks. A focused node is blurred first.
    pub fn remove_node(&mut self, node: &K) {
        self.focus.remove(node);
        self.within.remove(node);
        if let Some(i) = self.path.iter().position(|n| n == node) {
            // The subtree is gone; focus falls back to the parent chain without callbacks.
            self.path.drain(..=i);
        }
    }

    fn node_focus(&mut self, node: K, related: Option<K>, gained: bool, timestamp: u64) {
        let event = FocusEvent {
            target: node,
            related_target: related,
            focus_visible: self.visible,
            timestamp,
        };
        let Some(config) = self.focus.get_mut(&node) else {
            return;
        };
        let hook = if gained {
            config.on_focus.as_mut()
        } else {
            config.on_blur.as_mut()
        };
        if let Some(h) = hook {
            h(&event);
        }
        if let Some(h) = config.on_focus_change.as_mut() {
            h(gained);
        }
    }

    fn node_within(&mut self, node: K, focused: K, gained: bool, timestamp: u64) {
        let event = FocusEvent {
            target: focused,
            related_target: None,
            focus_visible: self.visible,
            timestamp,
        };
        let Some(config) = self.within.get_mut(&node) else {
            return;
        };
        let hook = if gained {
            config.on_focus_within.as_mut()
        } else {
            config.on_blur_within.as_mut()
        };
        if let Some(h) = hook {
            h(&event);
        }
        if let Some(h) = config.on_focus_within_change.as_mut() {
            h(gained);
        }
    }
}

impl<K: Copy + Eq + Hash> Default for FocusState<K> {
    fn default() -> Self {
        Self::new()
    }
}
