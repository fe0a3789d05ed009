// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover tracking over pointer paths.
//!
//! Hover does not take part in responder negotiation. The host hit tests each hovering pointer
//! and feeds the node → root path under it to [`HoverState::update`], which diffs it against
//! the previous path:
//!
//! - Leave: nodes no longer hovered, innermost → outermost (`on_hover_end`).
//! - Enter: newly hovered nodes, outermost → innermost (`on_hover_start`).
//! - Update: nodes that stay hovered (`on_hover_update`).
//!
//! Touch pointers never hover. A node with `contain` set takes hover away from its ancestors
//! while the pointer is inside it; they receive a leave on enter and an enter again once the
//! pointer leaves the contained node.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use kurbo::Point;
//! use understory_gestures::hover::{HoverConfig, HoverEvent, HoverState};
//! use understory_negotiation::event::PointerKind;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut hover: HoverState<u32> = HoverState::new();
//! for node in [1, 2] {
//!     let (start, end) = (log.clone(), log.clone());
//!     hover.set_config(node, Some(HoverConfig {
//!         on_hover_start: Some(Box::new(move |_| start.borrow_mut().push(("start", node)))),
//!         on_hover_end: Some(Box::new(move |_| end.borrow_mut().push(("end", node)))),
//!         ..HoverConfig::default()
//!     }));
//! }
//!
//! let ev = HoverEvent { position: Point::ZERO, timestamp: 0, pointer: PointerKind::Mouse };
//! hover.update(&[2, 1], &ev);
//! hover.update(&[1], &ev);
//! assert_eq!(*log.borrow(), [("start", 1), ("start", 2), ("end", 2)]);
//! ```

use alloc::boxed::Box;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;
use kurbo::Point;
use smallvec::SmallVec;
use understory_negotiation::event::PointerKind;

/// Payload of hover callbacks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HoverEvent {
    /// Pointer position.
    pub position: Point,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Hovering device.
    pub pointer: PointerKind,
}

/// Hover callback.
pub type HoverHandler = Box<dyn FnMut(&HoverEvent)>;

/// Hover hooks for one node.
#[derive(Default)]
pub struct HoverConfig {
    /// Never hovered.
    pub disabled: bool,
    /// Take hover away from ancestors while the pointer is inside.
    pub contain: bool,
    /// Pointer entered.
    pub on_hover_start: Option<HoverHandler>,
    /// Hovered state changed.
    pub on_hover_change: Option<Box<dyn FnMut(bool)>>,
    /// Pointer moved while hovering.
    pub on_hover_update: Option<HoverHandler>,
    /// Pointer left.
    pub on_hover_end: Option<HoverHandler>,
}

impl fmt::Debug for HoverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverConfig")
            .field("disabled", &self.disabled)
            .field("contain", &self.contain)
            .field("on_hover_start", &self.on_hover_start.is_some())
            .field("on_hover_change", &self.on_hover_change.is_some())
            .field("on_hover_update", &self.on_hover_update.is_some())
            .field("on_hover_end", &self.on_hover_end.is_some())
            .finish()
    }
}

type HoverPath<K> = SmallVec<[K; 8]>;

/// Hovered nodes and their hooks.
pub struct HoverState<K> {
    configs: HashMap<K, HoverConfig>,
    /// Hovered nodes, node → root.
    hovered: HoverPath<K>,
}

impl<K: fmt::Debug> fmt::Debug for HoverState<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverState")
            .field("configs", &self.configs)
            .field("hovered", &self.hovered)
            .finish()
    }
}

impl<K: Copy + Eq + Hash> HoverState<K> {
    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
            hovered: SmallVec::new(),
        }
    }

    /// Register, replace, or (with `None`) remove the hooks of `node`.
    ///
    /// Removing a hovered node drops it from the hovered set without callbacks.
    pub fn set_config(&mut self, node: K, config: Option<HoverConfig>) {
        match config {
            Some(config) => {
                self.configs.insert(node, config);
            }
            None => {
                self.configs.remove(&node);
                self.hovered.retain(|n| *n != node);
            }
        }
    }

    /// Hovered nodes, innermost first.
    pub fn hovered(&self) -> &[K] {
        &self.hovered
    }

    /// `true` if `node` is hovered.
    pub fn is_hovered(&self, node: &K) -> bool {
        self.hovered.contains(node)
    }

    /// Feed the node → root path under a hovering pointer.
    pub fn update(&mut self, path: &[K], event: &HoverEvent) {
        if event.pointer == PointerKind::Touch {
            return;
        }
        let next = self.hover_set(path);
        let previous = core::mem::replace(&mut self.hovered, next);

        for node in &previous {
            if !self.hovered.contains(node) {
                self.emit_end(*node, event);
            }
        }
        for node in self.hovered.iter().rev() {
            if previous.contains(node) {
                continue;
            }
            if let Some(config) = self.configs.get_mut(node) {
                if let Some(h) = config.on_hover_start.as_mut() {
                    h(event);
                }
                if let Some(h) = config.on_hover_change.as_mut() {
                    h(true);
                }
            }
        }
        for node in self.hovered.iter().filter(|n| previous.contains(n)) {
            if let Some(h) = self
                .configs
                .get_mut(node)
                .and_then(|c| c.on_hover_update.as_mut())
            {
                h(event);
            }
        }
    }

    /// The pointer left the surface: end hover on every node.
    pub fn leave_all(&mut self, event: &HoverEvent) {
        let previous = core::mem::take(&mut self.hovered);
        for node in previous {
            self.emit_end(node, event);
        }
    }

    /// Registered, enabled nodes of `path` not shadowed by a deeper `contain` node.
    fn hover_set(&self, path: &[K]) -> HoverPath<K> {
        let mut out = HoverPath::new();
        for node in path {
            let Some(config) = self.configs.get(node) else {
                continue;
            };
            if config.disabled {
                continue;
            }
            out.push(*node);
            if config.contain {
                break;
            }
        }
        out
    }

    fn emit_end(&mut self, node: K, event: &HoverEvent) {
        if let Some(config) = self.configs.get_mut(&node) {
            if let Some(h) = config.on_hover_end.as_mut() {
                h(event);
            }
            if let Some(h) = config.on_hover_change.as_mut() {
                h(false);
            }
        }
    }
}

impl<K: Copy + Eq + Hash> Default for HoverState<K> {
    fn default() -> Self {
        Self::new()
    }
}
