// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The negotiation engine.
//!
//! [`ResponderSystem`] owns the responder lock: at most one node is the current responder at
//! any time. Every native input event goes through [`ResponderSystem::dispatch_native_event`],
//! which runs these steps in order:
//!
//! 1. Filter emulated mouse events that follow touch input, and update the input modality.
//! 2. Classify the event (start, move, end, scroll, selection change).
//! 3. Record touches in the [`TouchHistory`].
//! 4. Negotiate: walk the eligible path (capture outer → inner, then bubble inner → outer)
//!    asking each node whether it wants to become the responder. When a responder is active,
//!    the walk is pruned to the nodes above the lowest common ancestor of the active path and
//!    the event path. A willing node is granted the lock, or rejected if the current responder
//!    refuses to let go.
//! 5. Dispatch the lifecycle to the current responder: start, move, end, then release or
//!    terminate.
//!
//! State is always updated before a hook runs, so hooks observe the current responder and the
//! touch samples of the event they are handling.
//!
//! ## Minimal example
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//!
//! use hashbrown::HashMap;
//! use kurbo::Point;
//! use understory_negotiation::event::{NativeEvent, NativeEventKind};
//! use understory_negotiation::registry::ResponderConfig;
//! use understory_negotiation::system::ResponderSystem;
//! use understory_negotiation::types::NoStyle;
//!
//! // 1 is the root, 2 its child.
//! let tree: HashMap<u32, u32> = [(2, 1)].into_iter().collect();
//! let mut system = ResponderSystem::with_hosts(tree, NoStyle);
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let (grant, release) = (log.clone(), log.clone());
//! system.register_node(
//!     2,
//!     Some(ResponderConfig {
//!         wants_responder_on_start: Some(Box::new(|_| true)),
//!         on_grant: Some(Box::new(move |_| grant.borrow_mut().push("grant"))),
//!         on_release: Some(Box::new(move |_| release.borrow_mut().push("release"))),
//!         ..ResponderConfig::default()
//!     }),
//! );
//!
//! let at = Point::new(5.0, 5.0);
//! system.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerStart, 2, at, 0));
//! assert_eq!(system.current_responder(), Some(2));
//!
//! system.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerEnd, 2, at, 16));
//! assert_eq!(system.current_responder(), None);
//! assert_eq!(*log.borrow(), ["grant", "release"]);
//! ```

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::dispatcher::{negotiation_sequence, run};
use crate::event::{NativeEvent, NativeEventKind, PointerKind};
use crate::modality::ModalityTracker;
use crate::path::{
    build_eligible_path, contains, has_active_touch_within, is_primary_input_activation,
    lowest_common_ancestor, raw_event_path,
};
use crate::registry::{Lifecycle, NegotiationKind, Registry, ResponderConfig, ResponderEvent};
use crate::touch_history::TouchHistory;
use crate::types::{EventTarget, NoParent, NoStyle, Outcome, ParentLookup, StyleHook};

/// The node holding the responder lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentResponder<K> {
    /// Responder node.
    pub node: K,
    /// Node → root ancestor chain of `node` at grant time.
    pub path: Vec<K>,
}

/// Responder negotiation state machine.
///
/// `P` supplies the host tree and `S` receives style hints at registration.
#[derive(Debug)]
pub struct ResponderSystem<K, P = NoParent, S = NoStyle> {
    parents: P,
    style: S,
    registry: Registry<K>,
    touch_history: TouchHistory<K>,
    modality: ModalityTracker,
    current: Option<CurrentResponder<K>>,
    emulating_mouse: bool,
    tracked_touch_count: usize,
    attached: bool,
}

impl<K: Copy + Eq + Hash + Debug> ResponderSystem<K> {
    /// Create a system where every node is a root and style hints are dropped.
    pub fn new() -> Self {
        Self::with_hosts(NoParent, NoStyle)
    }
}

impl<K: Copy + Eq + Hash + Debug> Default for ResponderSystem<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P, S> ResponderSystem<K, P, S>
where
    K: Copy + Eq + Hash + Debug,
    P: ParentLookup<K>,
    S: StyleHook<K>,
{
    /// Create a system over a host tree and style hook.
    pub fn with_hosts(parents: P, style: S) -> Self {
        Self {
            parents,
            style,
            registry: Registry::new(),
            touch_history: TouchHistory::new(),
            modality: ModalityTracker::new(),
            current: None,
            emulating_mouse: false,
            tracked_touch_count: 0,
            attached: false,
        }
    }

    /// Mark host input wiring as installed.
    ///
    /// Returns `true` the first time only, so hosts can install their native listeners once
    /// no matter how many components ask for it.
    pub fn attach(&mut self) -> bool {
        !core::mem::replace(&mut self.attached, true)
    }

    /// Register, replace, or (with `None`) unregister the config of `node`.
    pub fn register_node(&mut self, node: K, config: Option<ResponderConfig<K>>) {
        self.registry.set_config(node, config, &mut self.style);
    }

    /// Forget `node`, terminating it first if it is the current responder.
    pub fn remove_node(&mut self, node: K) {
        if self.current.as_ref().is_some_and(|c| c.node == node) {
            self.force_terminate_current_responder();
        }
        self.registry.remove(&node);
    }

    /// Take the lock away from the current responder unconditionally.
    ///
    /// The responder receives `on_terminate` without being asked. When no responder is active
    /// no hook runs; the emulated mouse flag and the tracked touch count are reset either way.
    pub fn force_terminate_current_responder(&mut self) {
        if let Some(current) = self.current.take() {
            let native = NativeEvent::forced_cancel(
                current.node,
                self.touch_history.most_recent_timestamp(),
            );
            #[cfg(feature = "tracing")]
            tracing::debug!(node = ?current.node, "responder force terminated");
            call_lifecycle(
                &mut self.registry,
                &self.touch_history,
                &native,
                current.node,
                Lifecycle::Terminate,
            );
        }
        self.emulating_mouse = false;
        self.tracked_touch_count = 0;
    }

    /// Drop all responder, touch, modality and registration state.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.touch_history.reset();
        self.modality.reset();
        self.current = None;
        self.emulating_mouse = false;
        self.tracked_touch_count = 0;
        self.attached = false;
    }

    /// Node holding the lock, if any.
    pub fn current_responder(&self) -> Option<K> {
        self.current.as_ref().map(|c| c.node)
    }

    /// Lock holder and its ancestor chain, if any.
    pub fn current(&self) -> Option<&CurrentResponder<K>> {
        self.current.as_ref()
    }

    /// Registered configs.
    pub fn registry(&self) -> &Registry<K> {
        &self.registry
    }

    /// Touch samples recorded so far.
    pub fn touch_history(&self) -> &TouchHistory<K> {
        &self.touch_history
    }

    /// Input modality as observed by this system.
    pub fn modality(&self) -> &ModalityTracker {
        &self.modality
    }

    /// Mutable modality, for hosts forwarding keyboard and window focus input.
    pub fn modality_mut(&mut self) -> &mut ModalityTracker {
        &mut self.modality
    }

    /// Host tree.
    pub fn parents(&self) -> &P {
        &self.parents
    }

    /// Mutable host tree, for hosts that edit their tree in place.
    pub fn parents_mut(&mut self) -> &mut P {
        &mut self.parents
    }

    /// Number of pointers the engine considers down.
    pub fn tracked_touch_count(&self) -> usize {
        self.tracked_touch_count
    }

    /// Run one native event through filtering, negotiation and lifecycle dispatch.
    pub fn dispatch_native_event(&mut self, native: &NativeEvent<K>) {
        let kind = native.kind;
        if self.is_ignored(native) {
            return;
        }

        match kind {
            NativeEventKind::PointerStart => self.modality.on_pointer_down(native.pointer),
            NativeEventKind::PointerMove => self.modality.on_pointer_move(native.pointer),
            NativeEventKind::Blur if native.target == EventTarget::Window => {
                self.modality.on_window_blur();
            }
            _ => {}
        }

        let is_start = kind == NativeEventKind::PointerStart && is_primary_input_activation(native);
        let is_move = kind == NativeEventKind::PointerMove;
        let is_end = matches!(
            kind,
            NativeEventKind::PointerEnd | NativeEventKind::PointerCancel
        );
        let is_scroll = kind == NativeEventKind::Scroll;
        let is_select = kind == NativeEventKind::SelectionChange;

        if is_start || is_move || is_end {
            if native.pointer == PointerKind::Touch {
                self.tracked_touch_count = native.touches.len();
            } else if is_start {
                self.tracked_touch_count = 1;
            } else if is_end {
                self.tracked_touch_count = 0;
            }
            self.touch_history.record_touch_track(native);
        }

        let negotiation = if is_start {
            Some(NegotiationKind::Start)
        } else if is_move {
            Some(NegotiationKind::Move)
        } else if self.tracked_touch_count > 0 && is_scroll {
            Some(NegotiationKind::Scroll)
        } else if self.tracked_touch_count > 0 && is_select {
            Some(NegotiationKind::Select)
        } else {
            None
        };

        let mut was_negotiated = false;
        if let (Some(negotiation), Some(origin)) = (negotiation, native.target.node()) {
            if let Some((candidate, path)) = self.find_wants_responder(negotiation, origin, native)
            {
                self.attempt_transfer(candidate, path, native);
                was_negotiated = true;
            }
        }

        let Some(responder) = self.current_responder() else {
            return;
        };

        if is_start {
            self.lifecycle(responder, Lifecycle::Start, native);
            return;
        }
        if is_move {
            self.lifecycle(responder, Lifecycle::Move, native);
            return;
        }

        let should_terminate = self.is_terminating(responder, native);
        let is_release = is_end
            && !should_terminate
            && !has_active_touch_within(responder, &native.touches, &self.parents);

        if is_end {
            self.lifecycle(responder, Lifecycle::End, native);
        }

        if is_release {
            #[cfg(feature = "tracing")]
            tracing::debug!(node = ?responder, "responder released");
            self.current = None;
            self.lifecycle(responder, Lifecycle::Release, native);
        }

        if should_terminate {
            let mut terminate = true;
            if matches!(
                kind,
                NativeEventKind::ContextMenu
                    | NativeEventKind::Scroll
                    | NativeEventKind::SelectionChange
            ) {
                terminate = !was_negotiated
                    && request_termination(
                        &mut self.registry,
                        &self.touch_history,
                        native,
                        responder,
                    );
            }
            if terminate {
                #[cfg(feature = "tracing")]
                tracing::debug!(node = ?responder, ?kind, "responder terminated");
                self.current = None;
                self.lifecycle(responder, Lifecycle::Terminate, native);
                self.emulating_mouse = false;
                self.tracked_touch_count = 0;
            }
        }
    }

    /// Emulated mouse filtering. Returns `true` if the event must be dropped.
    fn is_ignored(&mut self, native: &NativeEvent<K>) -> bool {
        let kind = native.kind;
        match native.pointer {
            PointerKind::Touch => {
                match kind {
                    NativeEventKind::PointerStart => self.emulating_mouse = true,
                    NativeEventKind::PointerMove => self.emulating_mouse = false,
                    _ => {}
                }
                if self.tracked_touch_count > 1 {
                    self.emulating_mouse = false;
                }
                false
            }
            pointer => {
                let mouse = pointer == PointerKind::Mouse;
                match kind {
                    NativeEventKind::PointerStart | NativeEventKind::PointerMove
                        if mouse && self.emulating_mouse =>
                    {
                        true
                    }
                    NativeEventKind::PointerMove if self.tracked_touch_count == 0 => true,
                    NativeEventKind::PointerEnd | NativeEventKind::PointerCancel
                        if mouse && self.emulating_mouse =>
                    {
                        if self.tracked_touch_count == 0 {
                            self.emulating_mouse = false;
                        }
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    /// Walk the pruned eligible path; return the first willing node with its ancestor chain.
    fn find_wants_responder(
        &mut self,
        negotiation: NegotiationKind,
        origin: K,
        native: &NativeEvent<K>,
    ) -> Option<(K, Vec<K>)> {
        let raw = raw_event_path(origin, &self.parents);
        let start = match &self.current {
            Some(current) => {
                let Some(lca) = lowest_common_ancestor(&current.path, &raw) else {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        responder = ?current.node,
                        ?origin,
                        "no common ancestor with the current responder, skipping negotiation"
                    );
                    return None;
                };
                let index = raw.iter().position(|n| *n == lca)?;
                index + usize::from(lca == current.node)
            }
            None => 0,
        };
        let search = &raw[start..];

        let eligible = build_eligible_path(search, &self.registry);
        let seq = negotiation_sequence(&eligible, negotiation.bubbles(), origin);

        let registry = &mut self.registry;
        let history = &self.touch_history;
        let mut found = None;
        run(&seq, &mut found, |d, found| {
            let Some(predicate) = registry
                .config_mut(&d.node)
                .and_then(|c| c.predicate_mut(negotiation, d.phase))
            else {
                return Outcome::Continue;
            };
            let mut event = ResponderEvent::new(d.node, native, history);
            if predicate(&mut event) {
                *found = Some(d.node);
                Outcome::Stop
            } else if event.is_propagation_stopped() {
                Outcome::Stop
            } else {
                Outcome::Continue
            }
        });

        let candidate = found?;
        let at = search.iter().position(|n| *n == candidate)?;
        Some((candidate, search[at..].to_vec()))
    }

    /// Grant `candidate`, displacing the current responder if it agrees.
    fn attempt_transfer(&mut self, candidate: K, path: Vec<K>, native: &NativeEvent<K>) {
        let next = CurrentResponder {
            node: candidate,
            path,
        };
        let Some(current) = self.current_responder() else {
            #[cfg(feature = "tracing")]
            tracing::debug!(node = ?candidate, "responder granted");
            self.current = Some(next);
            self.lifecycle(candidate, Lifecycle::Grant, native);
            return;
        };

        if request_termination(&mut self.registry, &self.touch_history, native, current) {
            #[cfg(feature = "tracing")]
            tracing::debug!(from = ?current, to = ?candidate, "responder transferred");
            self.current = Some(next);
            self.lifecycle(current, Lifecycle::Terminate, native);
            self.lifecycle(candidate, Lifecycle::Grant, native);
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(current = ?current, rejected = ?candidate, "responder transfer rejected");
            self.lifecycle(candidate, Lifecycle::Reject, native);
        }
    }

    fn is_terminating(&self, responder: K, native: &NativeEvent<K>) -> bool {
        let target_contains_responder = match native.target {
            EventTarget::Window => true,
            EventTarget::Node(t) => contains(t, responder, &self.parents),
        };
        match native.kind {
            NativeEventKind::PointerCancel | NativeEventKind::ContextMenu => true,
            NativeEventKind::Blur => match native.target {
                EventTarget::Window => true,
                EventTarget::Node(_) => {
                    target_contains_responder && native.related_target != Some(responder)
                }
            },
            NativeEventKind::Scroll => {
                self.tracked_touch_count == 0
                    || (target_contains_responder
                        && native.target != EventTarget::Node(responder))
            }
            NativeEventKind::SelectionChange => native.has_selection,
            _ => false,
        }
    }

    fn lifecycle(&mut self, node: K, step: Lifecycle, native: &NativeEvent<K>) {
        call_lifecycle(
            &mut self.registry,
            &self.touch_history,
            native,
            node,
            step,
        );
    }
}

fn call_lifecycle<K: Copy + Eq + Hash>(
    registry: &mut Registry<K>,
    history: &TouchHistory<K>,
    native: &NativeEvent<K>,
    node: K,
    step: Lifecycle,
) {
    if let Some(handler) = registry
        .config_mut(&node)
        .and_then(|c| c.lifecycle_mut(step))
    {
        handler(&ResponderEvent::new(node, native, history));
    }
}

/// Ask `node` to give up the lock; a missing hook allows it.
fn request_termination<K: Copy + Eq + Hash>(
    registry: &mut Registry<K>,
    history: &TouchHistory<K>,
    native: &NativeEvent<K>,
    node: K,
) -> bool {
    registry
        .config_mut(&node)
        .and_then(|c| c.on_termination_request.as_mut())
        .is_none_or(|request| request(&ResponderEvent::new(node, native, history)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Buttons, Touch};
    use crate::registry::{Handler, Predicate};
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::{Cell, RefCell};
    use hashbrown::HashMap;
    use kurbo::Point;

    type Log = Rc<RefCell<Vec<(u32, &'static str)>>>;

    // 1
    // └── 2
    //     ├── 3
    //     └── 4
    // 10
    // └── 11
    fn tree() -> HashMap<u32, u32> {
        [(2, 1), (3, 2), (4, 2), (11, 10)].into_iter().collect()
    }

    fn system() -> ResponderSystem<u32, HashMap<u32, u32>> {
        ResponderSystem::with_hosts(tree(), NoStyle)
    }

    fn entry(log: &Log, node: u32, name: &'static str) -> Option<Handler<u32>> {
        let log = log.clone();
        Some(Box::new(move |_: &ResponderEvent<'_, u32>| {
            log.borrow_mut().push((node, name));
        }))
    }

    fn yes() -> Option<Predicate<u32>> {
        Some(Box::new(|_: &mut ResponderEvent<'_, u32>| true))
    }

    fn logging(log: &Log, node: u32) -> ResponderConfig<u32> {
        ResponderConfig {
            on_grant: entry(log, node, "grant"),
            on_reject: entry(log, node, "reject"),
            on_start: entry(log, node, "start"),
            on_move: entry(log, node, "move"),
            on_end: entry(log, node, "end"),
            on_release: entry(log, node, "release"),
            on_terminate: entry(log, node, "terminate"),
            ..ResponderConfig::default()
        }
    }

    fn refuse() -> Option<crate::registry::TerminationRequest<u32>> {
        Some(Box::new(|_: &ResponderEvent<'_, u32>| false))
    }

    fn mouse(kind: NativeEventKind, node: u32, t: u64) -> NativeEvent<u32> {
        NativeEvent::mouse(kind, node, Point::new(t as f64, 0.0), t)
    }

    fn finger(identifier: u32, node: u32, x: f64, t: u64) -> Touch<u32> {
        Touch {
            identifier,
            position: Point::new(x, 0.0),
            timestamp: t,
            target: node,
        }
    }

    #[test]
    fn single_pointer_lifecycle_runs_in_order() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerMove, 3, 1));
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerMove, 3, 2));
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerEnd, 3, 3));
        assert_eq!(
            *log.borrow(),
            vec![
                (3, "grant"),
                (3, "start"),
                (3, "move"),
                (3, "move"),
                (3, "end"),
                (3, "release"),
            ]
        );
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn capture_prefers_ancestors_bubble_prefers_origin() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            1,
            Some(ResponderConfig {
                wants_responder_on_start_capture: yes(),
                ..logging(&log, 1)
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        assert_eq!(sys.current_responder(), Some(1));
        assert_eq!(sys.current().map(|c| c.path.clone()), Some(vec![1]));

        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            1,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 1)
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        assert_eq!(sys.current_responder(), Some(3));
        assert_eq!(sys.current().map(|c| c.path.clone()), Some(vec![3, 2, 1]));
    }

    #[test]
    fn stop_propagation_halts_negotiation() {
        let mut sys = system();
        sys.register_node(
            2,
            Some(ResponderConfig {
                wants_responder_on_start_capture: Some(Box::new(
                    |e: &mut ResponderEvent<'_, u32>| {
                        e.stop_propagation();
                        false
                    },
                )),
                ..ResponderConfig::default()
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..ResponderConfig::default()
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn transfer_terminates_then_grants() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            1,
            Some(ResponderConfig {
                wants_responder_on_move_capture: yes(),
                ..logging(&log, 1)
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        assert_eq!(sys.current_responder(), Some(3));
        log.borrow_mut().clear();

        sys.dispatch_native_event(&mouse(NativeEventKind::PointerMove, 3, 1));
        assert_eq!(
            *log.borrow(),
            vec![(3, "terminate"), (1, "grant"), (1, "move")]
        );
        assert_eq!(sys.current_responder(), Some(1));
    }

    #[test]
    fn refused_transfer_rejects_candidate() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            1,
            Some(ResponderConfig {
                wants_responder_on_move_capture: yes(),
                ..logging(&log, 1)
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                on_termination_request: refuse(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        log.borrow_mut().clear();

        sys.dispatch_native_event(&mouse(NativeEventKind::PointerMove, 3, 1));
        assert_eq!(*log.borrow(), vec![(1, "reject"), (3, "move")]);
        assert_eq!(sys.current_responder(), Some(3));
    }

    #[test]
    fn active_responder_is_not_asked_again() {
        let asked = Rc::new(Cell::new(0));
        let counter = asked.clone();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                wants_responder_on_move: Some(Box::new(move |_: &mut ResponderEvent<'_, u32>| {
                    counter.set(counter.get() + 1);
                    true
                })),
                ..ResponderConfig::default()
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerMove, 3, 1));
        assert_eq!(asked.get(), 0);
        assert_eq!(sys.current_responder(), Some(3));
    }

    #[test]
    fn context_menu_veto_keeps_responder() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                on_termination_request: refuse(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&NativeEvent::context_menu(EventTarget::Node(3), 1));
        assert!(!log.borrow().contains(&(3, "terminate")));
        assert_eq!(sys.current_responder(), Some(3));
    }

    #[test]
    fn context_menu_terminates_without_veto() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&NativeEvent::context_menu(EventTarget::Node(3), 1));
        assert_eq!(log.borrow().last(), Some(&(3, "terminate")));
        assert_eq!(sys.current_responder(), None);
        assert_eq!(sys.tracked_touch_count(), 0);
    }

    #[test]
    fn cancel_ends_then_terminates() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                on_termination_request: refuse(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        log.borrow_mut().clear();
        // Cancel cannot be vetoed.
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerCancel, 3, 1));
        assert_eq!(*log.borrow(), vec![(3, "end"), (3, "terminate")]);
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn force_terminate_when_empty_runs_no_hook() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(3, Some(logging(&log, 3)));
        sys.force_terminate_current_responder();
        assert!(log.borrow().is_empty());
        assert_eq!(sys.tracked_touch_count(), 0);
    }

    #[test]
    fn force_terminate_notifies_responder_once() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                on_termination_request: refuse(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        log.borrow_mut().clear();
        sys.force_terminate_current_responder();
        sys.force_terminate_current_responder();
        assert_eq!(*log.borrow(), vec![(3, "terminate")]);
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn removing_responder_terminates_it() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.remove_node(3);
        assert_eq!(log.borrow().last(), Some(&(3, "terminate")));
        assert!(!sys.registry().contains(&3));
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn register_then_unregister_yields_default_config() {
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..ResponderConfig::default()
            }),
        );
        assert!(!sys.registry().config(&3).is_empty());
        sys.register_node(3, None);
        assert!(sys.registry().config(&3).is_empty());
    }

    #[test]
    fn disconnected_paths_skip_negotiation() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.register_node(
            10,
            Some(ResponderConfig {
                wants_responder_on_start_capture: yes(),
                ..logging(&log, 10)
            }),
        );
        let a = finger(1, 3, 0.0, 0);
        sys.dispatch_native_event(&NativeEvent::touch(
            NativeEventKind::PointerStart,
            &[a],
            &[a],
            0,
        ));
        let b = finger(2, 11, 50.0, 1);
        sys.dispatch_native_event(&NativeEvent::touch(
            NativeEventKind::PointerStart,
            &[a, b],
            &[b],
            1,
        ));
        assert_eq!(sys.current_responder(), Some(3));
        assert!(log.borrow().iter().all(|(node, _)| *node == 3));
        assert_eq!(
            *log.borrow(),
            vec![(3, "grant"), (3, "start"), (3, "start")]
        );
    }

    #[test]
    fn release_waits_for_last_touch_in_subtree() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            2,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 2)
            }),
        );
        let a = finger(1, 3, 0.0, 0);
        let b = finger(2, 4, 20.0, 0);
        sys.dispatch_native_event(&NativeEvent::touch(
            NativeEventKind::PointerStart,
            &[a, b],
            &[a, b],
            0,
        ));
        log.borrow_mut().clear();

        sys.dispatch_native_event(&NativeEvent::touch(
            NativeEventKind::PointerEnd,
            &[b],
            &[a],
            5,
        ));
        assert_eq!(*log.borrow(), vec![(2, "end")]);
        assert_eq!(sys.current_responder(), Some(2));

        sys.dispatch_native_event(&NativeEvent::touch(NativeEventKind::PointerEnd, &[], &[b], 6));
        assert_eq!(*log.borrow(), vec![(2, "end"), (2, "end"), (2, "release")]);
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn scroll_of_ancestor_terminates_scroll_of_responder_does_not() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&NativeEvent::scroll(EventTarget::Node(3), 1));
        sys.dispatch_native_event(&NativeEvent::scroll(EventTarget::Node(4), 2));
        assert_eq!(sys.current_responder(), Some(3));

        sys.dispatch_native_event(&NativeEvent::scroll(EventTarget::Node(1), 3));
        assert_eq!(sys.current_responder(), None);
        assert_eq!(log.borrow().last(), Some(&(3, "terminate")));
    }

    #[test]
    fn scroll_negotiation_skips_termination() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            1,
            Some(ResponderConfig {
                wants_responder_on_scroll: yes(),
                ..logging(&log, 1)
            }),
        );
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        log.borrow_mut().clear();
        sys.dispatch_native_event(&NativeEvent::scroll(EventTarget::Node(1), 1));
        assert_eq!(*log.borrow(), vec![(3, "terminate"), (1, "grant")]);
        assert_eq!(sys.current_responder(), Some(1));
    }

    #[test]
    fn selection_with_content_terminates() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));
        sys.dispatch_native_event(&NativeEvent::selection_change(EventTarget::Node(3), false, 1));
        assert_eq!(sys.current_responder(), Some(3));
        sys.dispatch_native_event(&NativeEvent::selection_change(EventTarget::Node(3), true, 2));
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn blur_rules() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 0));

        // Focus moving into the responder keeps it.
        sys.dispatch_native_event(&NativeEvent::blur(EventTarget::Node(2), Some(3), 1));
        // Blur of an unrelated node keeps it.
        sys.dispatch_native_event(&NativeEvent::blur(EventTarget::Node(4), None, 2));
        assert_eq!(sys.current_responder(), Some(3));

        sys.dispatch_native_event(&NativeEvent::blur(EventTarget::Window, None, 3));
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn three_fingers_negotiate_once_per_event() {
        let asked = Rc::new(Cell::new(0));
        let counter = asked.clone();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: Some(Box::new(move |_: &mut ResponderEvent<'_, u32>| {
                    counter.set(counter.get() + 1);
                    false
                })),
                ..ResponderConfig::default()
            }),
        );
        let fingers = [finger(1, 3, 0.0, 0), finger(2, 3, 10.0, 0), finger(3, 3, 20.0, 0)];
        sys.dispatch_native_event(&NativeEvent::touch(
            NativeEventKind::PointerStart,
            &fingers,
            &fingers,
            0,
        ));
        assert_eq!(asked.get(), 1);
        assert_eq!(sys.tracked_touch_count(), 3);
        assert_eq!(sys.touch_history().number_active_touches(), 3);
    }

    #[test]
    fn emulated_mouse_after_touch_is_ignored() {
        let log = Log::default();
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..logging(&log, 3)
            }),
        );
        let a = finger(1, 3, 0.0, 0);
        sys.dispatch_native_event(&NativeEvent::touch(NativeEventKind::PointerStart, &[a], &[a], 0));
        sys.dispatch_native_event(&NativeEvent::touch(NativeEventKind::PointerEnd, &[], &[a], 1));
        // Compatibility mouse events the platform synthesizes after the tap.
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 2));
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerEnd, 3, 3));
        let grants = log.borrow().iter().filter(|(_, s)| *s == "grant").count();
        assert_eq!(grants, 1);

        // A real mouse press afterwards goes through.
        sys.dispatch_native_event(&mouse(NativeEventKind::PointerStart, 3, 500));
        let grants = log.borrow().iter().filter(|(_, s)| *s == "grant").count();
        assert_eq!(grants, 2);
    }

    #[test]
    fn secondary_button_does_not_negotiate() {
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_start: yes(),
                ..ResponderConfig::default()
            }),
        );
        let right = mouse(NativeEventKind::PointerStart, 3, 0)
            .with_button(2)
            .with_buttons(Buttons::SECONDARY);
        sys.dispatch_native_event(&right);
        assert_eq!(sys.current_responder(), None);
        assert_eq!(sys.tracked_touch_count(), 0);
    }

    #[test]
    fn hover_moves_without_press_are_dropped() {
        let mut sys = system();
        sys.register_node(
            3,
            Some(ResponderConfig {
                wants_responder_on_move: yes(),
                ..ResponderConfig::default()
            }),
        );
        let hover = mouse(NativeEventKind::PointerMove, 3, 0).with_buttons(Buttons::empty());
        sys.dispatch_native_event(&hover);
        assert_eq!(sys.current_responder(), None);
    }

    #[test]
    fn pointer_down_updates_modality() {
        let mut sys = system();
        let a = finger(1, 3, 0.0, 0);
        sys.dispatch_native_event(&NativeEvent::touch(NativeEventKind::PointerStart, &[a], &[a], 0));
        assert_eq!(
            sys.modality().active_modality(),
            crate::modality::Modality::Touch
        );
    }

    #[test]
    fn attach_is_idempotent() {
        let mut sys: ResponderSystem<u32> = ResponderSystem::new();
        assert!(sys.attach());
        assert!(!sys.attach());
        sys.reset();
        assert!(sys.attach());
    }
}
