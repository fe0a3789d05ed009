// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Responder registry: per-node negotiation hooks.
//!
//! ## Overview
//!
//! Each participating node owns one [`ResponderConfig`]: a set of optional negotiation
//! predicates and lifecycle callbacks. The [`Registry`] maps node identity to its config.
//! It never keeps nodes alive; hosts remove entries when a node is torn down.
//!
//! Hooks are looked up through two enum-keyed tables instead of by name:
//!
//! - [`ResponderConfig::predicate_mut`] maps a [`NegotiationKind`] and a [`Phase`] to the
//!   matching `wants_responder_*` predicate.
//! - [`ResponderConfig::lifecycle_mut`] maps a [`Lifecycle`] step to its callback.
//!
//! ## Payload
//!
//! Every hook invocation receives a fresh [`ResponderEvent`]. Predicates get it mutably so
//! they can call [`ResponderEvent::stop_propagation`], which halts the negotiation walk.
//!
//! ```
//! use understory_negotiation::registry::{Registry, ResponderConfig};
//! use understory_negotiation::types::{NoStyle, TouchAction};
//!
//! let mut registry: Registry<u32> = Registry::new();
//! registry.set_config(
//!     1,
//!     Some(ResponderConfig {
//!         wants_responder_on_start: Some(Box::new(|_| true)),
//!         touch_action: Some(TouchAction::None),
//!         ..ResponderConfig::default()
//!     }),
//!     &mut NoStyle,
//! );
//! assert!(registry.contains(&1));
//!
//! registry.set_config(1, None, &mut NoStyle);
//! assert!(registry.config(&1).is_empty());
//! ```

use alloc::boxed::Box;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::event::{NativeEvent, NativeEventKind, Touch};
use crate::touch_history::TouchHistory;
use crate::types::{EventTarget, Phase, StyleHook, TouchAction};

/// Payload handed to every responder hook.
#[derive(Debug)]
pub struct ResponderEvent<'a, K> {
    current_target: K,
    native: &'a NativeEvent<K>,
    touch_history: &'a TouchHistory<K>,
    propagation_stopped: bool,
}

impl<'a, K: Copy> ResponderEvent<'a, K> {
    /// Build a payload for `current_target`.
    pub fn new(
        current_target: K,
        native: &'a NativeEvent<K>,
        touch_history: &'a TouchHistory<K>,
    ) -> Self {
        Self {
            current_target,
            native,
            touch_history,
            propagation_stopped: false,
        }
    }

    /// Node whose hook is running.
    pub fn current_target(&self) -> K {
        self.current_target
    }

    /// Node (or window) the native event originated from.
    pub fn target(&self) -> EventTarget<K> {
        self.native.target
    }

    /// Kind of the native event.
    pub fn kind(&self) -> NativeEventKind {
        self.native.kind
    }

    /// Native event time.
    pub fn timestamp(&self) -> u64 {
        self.native.timestamp
    }

    /// Touches still down.
    pub fn touches(&self) -> &[Touch<K>] {
        &self.native.touches
    }

    /// Touches the native event reports.
    pub fn changed_touches(&self) -> &[Touch<K>] {
        &self.native.changed_touches
    }

    /// The underlying native event.
    pub fn native(&self) -> &'a NativeEvent<K> {
        self.native
    }

    /// Touch history, already updated for this event.
    pub fn touch_history(&self) -> &'a TouchHistory<K> {
        self.touch_history
    }

    /// Halt the negotiation walk after the current predicate.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// `true` once a hook called [`Self::stop_propagation`].
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// A negotiation predicate: "do you want to become the responder?".
pub type Predicate<K> = Box<dyn FnMut(&mut ResponderEvent<'_, K>) -> bool>;

/// A lifecycle callback.
pub type Handler<K> = Box<dyn FnMut(&ResponderEvent<'_, K>)>;

/// A termination request; returning `false` vetoes termination.
pub type TerminationRequest<K> = Box<dyn FnMut(&ResponderEvent<'_, K>) -> bool>;

/// Which negotiation an event triggers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationKind {
    /// Pointer start.
    Start,
    /// Pointer move.
    Move,
    /// Scroll while a pointer is down.
    Scroll,
    /// Selection change while a pointer is down.
    Select,
}

impl NegotiationKind {
    /// Whether the bubble walk covers the whole path.
    ///
    /// Non-bubbling negotiations only consult the origin node after the capture walk.
    pub fn bubbles(self) -> bool {
        matches!(self, Self::Start | Self::Move)
    }
}

/// Lifecycle steps dispatched to a single node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Node became the responder.
    Grant,
    /// Node wanted to become the responder but the current one refused.
    Reject,
    /// A pointer started while the node is the responder.
    Start,
    /// A pointer moved while the node is the responder.
    Move,
    /// A pointer ended while the node is the responder.
    End,
    /// The interaction finished normally.
    Release,
    /// Responder status was taken away.
    Terminate,
}

/// Negotiation hooks for one node.
pub struct ResponderConfig<K> {
    /// Bubble predicate for pointer start.
    pub wants_responder_on_start: Option<Predicate<K>>,
    /// Capture predicate for pointer start.
    pub wants_responder_on_start_capture: Option<Predicate<K>>,
    /// Bubble predicate for pointer move.
    pub wants_responder_on_move: Option<Predicate<K>>,
    /// Capture predicate for pointer move.
    pub wants_responder_on_move_capture: Option<Predicate<K>>,
    /// Origin predicate for scroll.
    pub wants_responder_on_scroll: Option<Predicate<K>>,
    /// Capture predicate for scroll.
    pub wants_responder_on_scroll_capture: Option<Predicate<K>>,
    /// Origin predicate for selection change.
    pub wants_responder_on_select: Option<Predicate<K>>,
    /// Capture predicate for selection change.
    pub wants_responder_on_select_capture: Option<Predicate<K>>,
    /// Became the responder.
    pub on_grant: Option<Handler<K>>,
    /// Lost a transfer attempt.
    pub on_reject: Option<Handler<K>>,
    /// Pointer start while responder.
    pub on_start: Option<Handler<K>>,
    /// Pointer move while responder.
    pub on_move: Option<Handler<K>>,
    /// Pointer end while responder.
    pub on_end: Option<Handler<K>>,
    /// Interaction released.
    pub on_release: Option<Handler<K>>,
    /// Responder status taken away.
    pub on_terminate: Option<Handler<K>>,
    /// Asked before being displaced; absent means "allow".
    pub on_termination_request: Option<TerminationRequest<K>>,
    /// Touch handling hint applied at registration.
    pub touch_action: Option<TouchAction>,
}

impl<K> ResponderConfig<K> {
    /// The predicate for a negotiation step.
    ///
    /// [`Phase::Target`] uses the bubble-named predicate.
    pub fn predicate_mut(
        &mut self,
        kind: NegotiationKind,
        phase: Phase,
    ) -> Option<&mut Predicate<K>> {
        let capture = matches!(phase, Phase::Capture);
        let slot = match (kind, capture) {
            (NegotiationKind::Start, true) => &mut self.wants_responder_on_start_capture,
            (NegotiationKind::Start, false) => &mut self.wants_responder_on_start,
            (NegotiationKind::Move, true) => &mut self.wants_responder_on_move_capture,
            (NegotiationKind::Move, false) => &mut self.wants_responder_on_move,
            (NegotiationKind::Scroll, true) => &mut self.wants_responder_on_scroll_capture,
            (NegotiationKind::Scroll, false) => &mut self.wants_responder_on_scroll,
            (NegotiationKind::Select, true) => &mut self.wants_responder_on_select_capture,
            (NegotiationKind::Select, false) => &mut self.wants_responder_on_select,
        };
        slot.as_mut()
    }

    /// The callback for a lifecycle step.
    pub fn lifecycle_mut(&mut self, step: Lifecycle) -> Option<&mut Handler<K>> {
        let slot = match step {
            Lifecycle::Grant => &mut self.on_grant,
            Lifecycle::Reject => &mut self.on_reject,
            Lifecycle::Start => &mut self.on_start,
            Lifecycle::Move => &mut self.on_move,
            Lifecycle::End => &mut self.on_end,
            Lifecycle::Release => &mut self.on_release,
            Lifecycle::Terminate => &mut self.on_terminate,
        };
        slot.as_mut()
    }

    /// `true` if no hook and no hint is set.
    pub fn is_empty(&self) -> bool {
        self.hooks().iter().all(|(_, set)| !set) && self.touch_action.is_none()
    }

    fn hooks(&self) -> [(&'static str, bool); 16] {
        [
            ("wants_responder_on_start", self.wants_responder_on_start.is_some()),
            (
                "wants_responder_on_start_capture",
                self.wants_responder_on_start_capture.is_some(),
            ),
            ("wants_responder_on_move", self.wants_responder_on_move.is_some()),
            (
                "wants_responder_on_move_capture",
                self.wants_responder_on_move_capture.is_some(),
            ),
            ("wants_responder_on_scroll", self.wants_responder_on_scroll.is_some()),
            (
                "wants_responder_on_scroll_capture",
                self.wants_responder_on_scroll_capture.is_some(),
            ),
            ("wants_responder_on_select", self.wants_responder_on_select.is_some()),
            (
                "wants_responder_on_select_capture",
                self.wants_responder_on_select_capture.is_some(),
            ),
            ("on_grant", self.on_grant.is_some()),
            ("on_reject", self.on_reject.is_some()),
            ("on_start", self.on_start.is_some()),
            ("on_move", self.on_move.is_some()),
            ("on_end", self.on_end.is_some()),
            ("on_release", self.on_release.is_some()),
            ("on_terminate", self.on_terminate.is_some()),
            (
                "on_termination_request",
                self.on_termination_request.is_some(),
            ),
        ]
    }
}

impl<K> Default for ResponderConfig<K> {
    fn default() -> Self {
        Self {
            wants_responder_on_start: None,
            wants_responder_on_start_capture: None,
            wants_responder_on_move: None,
            wants_responder_on_move_capture: None,
            wants_responder_on_scroll: None,
            wants_responder_on_scroll_capture: None,
            wants_responder_on_select: None,
            wants_responder_on_select_capture: None,
            on_grant: None,
            on_reject: None,
            on_start: None,
            on_move: None,
            on_end: None,
            on_release: None,
            on_terminate: None,
            on_termination_request: None,
            touch_action: None,
        }
    }
}

impl<K> fmt::Debug for ResponderConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (name, set) in self.hooks() {
            if set {
                list.entry(&name);
            }
        }
        list.finish()?;
        if let Some(action) = self.touch_action {
            write!(f, " touch_action={action:?}")?;
        }
        Ok(())
    }
}

/// Identity-keyed store of [`ResponderConfig`]s.
pub struct Registry<K> {
    configs: HashMap<K, ResponderConfig<K>>,
    empty: ResponderConfig<K>,
}

impl<K: Copy + Eq + Hash> Registry<K> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            configs: HashMap::new(),
            empty: ResponderConfig::default(),
        }
    }

    /// Register, replace, or (with `None`) remove the config of `node`.
    ///
    /// A present `touch_action` is forwarded to `style`.
    pub fn set_config(
        &mut self,
        node: K,
        config: Option<ResponderConfig<K>>,
        style: &mut impl StyleHook<K>,
    ) {
        match config {
            Some(config) => {
                if let Some(action) = config.touch_action {
                    style.set_touch_action(&node, action);
                }
                self.configs.insert(node, config);
            }
            None => {
                self.configs.remove(&node);
            }
        }
    }

    /// Config of `node`, or an empty config if none is registered.
    pub fn config(&self, node: &K) -> &ResponderConfig<K> {
        self.configs.get(node).unwrap_or(&self.empty)
    }

    /// Mutable config of `node`, if registered.
    pub fn config_mut(&mut self, node: &K) -> Option<&mut ResponderConfig<K>> {
        self.configs.get_mut(node)
    }

    /// `true` if `node` has a config.
    pub fn contains(&self, node: &K) -> bool {
        self.configs.contains_key(node)
    }

    /// Remove and return the config of `node`.
    pub fn remove(&mut self, node: &K) -> Option<ResponderConfig<K>> {
        self.configs.remove(node)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Drop every config.
    pub fn clear(&mut self) {
        self.configs.clear();
    }
}

impl<K: Copy + Eq + Hash> Default for Registry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug> fmt::Debug for Registry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.configs.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct RecordingStyle(Vec<(u32, TouchAction)>);

    impl StyleHook<u32> for RecordingStyle {
        fn set_touch_action(&mut self, node: &u32, action: TouchAction) {
            self.0.push((*node, action));
        }
    }

    #[test]
    fn unregistered_node_yields_empty_config() {
        let registry: Registry<u32> = Registry::new();
        assert!(registry.config(&3).is_empty());
        assert!(!registry.contains(&3));
    }

    #[test]
    fn touch_action_is_applied_on_set() {
        let mut registry = Registry::new();
        let mut style = RecordingStyle::default();
        registry.set_config(
            4,
            Some(ResponderConfig {
                touch_action: Some(TouchAction::PanY),
                ..ResponderConfig::default()
            }),
            &mut style,
        );
        registry.set_config(5, Some(ResponderConfig::default()), &mut style);
        assert_eq!(style.0, [(4, TouchAction::PanY)]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn set_then_clear_round_trips_to_default() {
        let mut registry = Registry::new();
        registry.set_config(
            1,
            Some(ResponderConfig {
                on_grant: Some(Box::new(|_| {})),
                ..ResponderConfig::default()
            }),
            &mut crate::types::NoStyle,
        );
        assert!(!registry.config(&1).is_empty());
        registry.set_config(1, None, &mut crate::types::NoStyle);
        assert!(registry.config(&1).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn tables_select_the_named_hook() {
        let mut config: ResponderConfig<u32> = ResponderConfig {
            wants_responder_on_move_capture: Some(Box::new(|_| true)),
            on_release: Some(Box::new(|_| {})),
            ..ResponderConfig::default()
        };
        assert!(
            config
                .predicate_mut(NegotiationKind::Move, Phase::Capture)
                .is_some()
        );
        assert!(
            config
                .predicate_mut(NegotiationKind::Move, Phase::Bubble)
                .is_none()
        );
        assert!(config.lifecycle_mut(Lifecycle::Release).is_some());
        assert!(config.lifecycle_mut(Lifecycle::Grant).is_none());
    }

    #[test]
    fn scroll_and_select_do_not_bubble() {
        assert!(NegotiationKind::Start.bubbles());
        assert!(NegotiationKind::Move.bubbles());
        assert!(!NegotiationKind::Scroll.bubbles());
        assert!(!NegotiationKind::Select.bubbles());
    }
}
