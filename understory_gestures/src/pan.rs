// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan recognition over the touch history.
//!
//! [`PanResponder`] wraps the responder hooks of one node and keeps a [`GestureState`]: the
//! accumulated centroid translation (`dx`, `dy`), its velocity, and the centroid at grant time.
//! Pan hooks receive the responder payload together with a snapshot of that state.
//!
//! ## Accumulation
//!
//! Each native move event advances the state once. Touches that moved since the last accounted
//! sample contribute their centroid shift, weighted by the share of active touches that moved:
//!
//! ```text
//! dx += (current_centroid_x(moved) - previous_centroid_x(moved)) * moved / active
//! ```
//!
//! This is the shift of the centroid of all active touches. With two fingers down, moving one
//! of them by 10 pans by 5.
//!
//! The high-water mark is a sample sequence number from the touch history, not a timestamp, so
//! two native events delivered within the same millisecond are both accounted for.
//!
//! Velocity is the change of `dx`/`dy` divided by the time elapsed since the previously
//! accounted sample, in units per millisecond. Samples that share a timestamp with the previous
//! one keep the last velocity.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use understory_negotiation::registry::{ResponderConfig, ResponderEvent};
use understory_negotiation::touch_history::TouchHistory;
use understory_negotiation::touch_math::{
    current_centroid_x, current_centroid_y, current_centroid_x_of_touches_changed_after,
    current_centroid_y_of_touches_changed_after, previous_centroid_x_of_touches_changed_after,
    previous_centroid_y_of_touches_changed_after, touches_changed_after,
};

/// Pan state handed to every pan hook.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct GestureState {
    /// Changes each time the state is re-initialized.
    pub state_id: u64,
    /// Latest centroid x.
    pub move_x: f64,
    /// Latest centroid y.
    pub move_y: f64,
    /// Centroid x at grant.
    pub x0: f64,
    /// Centroid y at grant.
    pub y0: f64,
    /// Accumulated x translation since grant.
    pub dx: f64,
    /// Accumulated y translation since grant.
    pub dy: f64,
    /// X velocity, units per millisecond.
    pub vx: f64,
    /// Y velocity, units per millisecond.
    pub vy: f64,
    /// Touches down.
    pub number_active_touches: usize,
    /// Sample sequence number of the last sample folded into the state.
    pub accounted_for_moves_up_to: u64,
    /// Time of the last sample folded into the state.
    pub accounted_timestamp: u64,
}

impl GestureState {
    fn reinitialize(&mut self) {
        *self = Self {
            state_id: self.state_id.wrapping_add(1),
            ..Self::default()
        };
    }

    fn update_on_move<K: Copy>(&mut self, history: &TouchHistory<K>) {
        let active = history.number_active_touches();
        let since = self.accounted_for_moves_up_to;
        let now = history.most_recent_timestamp();
        let moved = touches_changed_after(history, since);

        if let (Some(cx), Some(px), Some(cy), Some(py)) = (
            current_centroid_x_of_touches_changed_after(history, since),
            previous_centroid_x_of_touches_changed_after(history, since),
            current_centroid_y_of_touches_changed_after(history, since),
            previous_centroid_y_of_touches_changed_after(history, since),
        ) {
            // `moved <= active`, and `moved > 0` since a centroid exists.
            let weight = moved as f64 / active as f64;
            let next_dx = self.dx + (cx - px) * weight;
            let next_dy = self.dy + (cy - py) * weight;
            let dt = now.saturating_sub(self.accounted_timestamp);
            if dt > 0 {
                self.vx = (next_dx - self.dx) / dt as f64;
                self.vy = (next_dy - self.dy) / dt as f64;
            }
            self.dx = next_dx;
            self.dy = next_dy;
        }
        self.move_x = current_centroid_x(history).unwrap_or(self.move_x);
        self.move_y = current_centroid_y(history).unwrap_or(self.move_y);
        self.number_active_touches = active;
        self.accounted_for_moves_up_to = history.most_recent_sequence();
        self.accounted_timestamp = now;
    }
}

/// A pan hook returning `R`.
pub type PanHook<K, R> = Box<dyn FnMut(&ResponderEvent<'_, K>, &GestureState) -> R>;

/// Pan hooks. Every hook is optional; absent predicates decline, an absent termination
/// request allows termination.
pub struct PanConfig<K> {
    /// Become the pan responder on pointer start (bubble).
    pub on_start_should_set: Option<PanHook<K, bool>>,
    /// Become the pan responder on pointer start (capture).
    pub on_start_should_set_capture: Option<PanHook<K, bool>>,
    /// Become the pan responder on pointer move (bubble).
    pub on_move_should_set: Option<PanHook<K, bool>>,
    /// Become the pan responder on pointer move (capture).
    pub on_move_should_set_capture: Option<PanHook<K, bool>>,
    /// Granted; `x0`/`y0` are set.
    pub on_grant: Option<PanHook<K, ()>>,
    /// Another node kept the lock.
    pub on_reject: Option<PanHook<K, ()>>,
    /// A pointer started while panning.
    pub on_start: Option<PanHook<K, ()>>,
    /// The pan moved.
    pub on_move: Option<PanHook<K, ()>>,
    /// A pointer ended while panning.
    pub on_end: Option<PanHook<K, ()>>,
    /// The pan finished normally.
    pub on_release: Option<PanHook<K, ()>>,
    /// The pan was taken away.
    pub on_terminate: Option<PanHook<K, ()>>,
    /// Asked before another node takes over.
    pub on_termination_request: Option<PanHook<K, bool>>,
}

impl<K> Default for PanConfig<K> {
    fn default() -> Self {
        Self {
            on_start_should_set: None,
            on_start_should_set_capture: None,
            on_move_should_set: None,
            on_move_should_set_capture: None,
            on_grant: None,
            on_reject: None,
            on_start: None,
            on_move: None,
            on_end: None,
            on_release: None,
            on_terminate: None,
            on_termination_request: None,
        }
    }
}

impl<K> fmt::Debug for PanConfig<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanConfig")
            .field("on_start_should_set", &self.on_start_should_set.is_some())
            .field(
                "on_start_should_set_capture",
                &self.on_start_should_set_capture.is_some(),
            )
            .field("on_move_should_set", &self.on_move_should_set.is_some())
            .field(
                "on_move_should_set_capture",
                &self.on_move_should_set_capture.is_some(),
            )
            .field("on_grant", &self.on_grant.is_some())
            .field("on_reject", &self.on_reject.is_some())
            .field("on_start", &self.on_start.is_some())
            .field("on_move", &self.on_move.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_release", &self.on_release.is_some())
            .field("on_terminate", &self.on_terminate.is_some())
            .field(
                "on_termination_request",
                &self.on_termination_request.is_some(),
            )
            .finish()
    }
}

struct PanInner<K> {
    config: PanConfig<K>,
    gesture: GestureState,
}

impl<K> fmt::Debug for PanInner<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanInner")
            .field("config", &self.config)
            .field("gesture", &self.gesture)
            .finish()
    }
}

type Slot<K, R> = fn(&mut PanConfig<K>) -> &mut Option<PanHook<K, R>>;

/// Pan recognizer shared between the responder hooks and the host.
pub struct PanResponder<K> {
    inner: Rc<RefCell<PanInner<K>>>,
}

impl<K> Clone for PanResponder<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> fmt::Debug for PanResponder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f.debug_tuple("PanResponder").field(&*inner).finish(),
            Err(_) => f.write_str("PanResponder(<in use>)"),
        }
    }
}

impl<K: Copy + 'static> PanResponder<K> {
    /// Create a recognizer.
    pub fn new(config: PanConfig<K>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(PanInner {
                config,
                gesture: GestureState::default(),
            })),
        }
    }

    /// Snapshot of the gesture state.
    pub fn gesture_state(&self) -> GestureState {
        self.inner.borrow().gesture
    }

    /// Responder hooks driving this recognizer; register them for the panning node.
    pub fn responder_config(&self) -> ResponderConfig<K> {
        let (start, start_capture) = (self.clone(), self.clone());
        let (moves, move_capture) = (self.clone(), self.clone());
        let (grant, reject, started) = (self.clone(), self.clone(), self.clone());
        let (moved, end, release) = (self.clone(), self.clone(), self.clone());
        let (terminate, request) = (self.clone(), self.clone());
        ResponderConfig {
            wants_responder_on_start: Some(Box::new(move |e: &mut ResponderEvent<'_, K>| {
                start.call(|c| &mut c.on_start_should_set, e, false)
            })),
            wants_responder_on_start_capture: Some(Box::new(
                move |e: &mut ResponderEvent<'_, K>| {
                    {
                        let mut inner = start_capture.inner.borrow_mut();
                        if e.touches().len() == 1 {
                            inner.gesture.reinitialize();
                        }
                        inner.gesture.number_active_touches =
                            e.touch_history().number_active_touches();
                    }
                    start_capture.call(|c| &mut c.on_start_should_set_capture, e, false)
                },
            )),
            wants_responder_on_move: Some(Box::new(move |e: &mut ResponderEvent<'_, K>| {
                moves.account(e.touch_history());
                moves.call(|c| &mut c.on_move_should_set, e, false)
            })),
            wants_responder_on_move_capture: Some(Box::new(
                move |e: &mut ResponderEvent<'_, K>| {
                    move_capture.account(e.touch_history());
                    move_capture.call(|c| &mut c.on_move_should_set_capture, e, false)
                },
            )),
            on_grant: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                {
                    let mut inner = grant.inner.borrow_mut();
                    let history = e.touch_history();
                    let g = &mut inner.gesture;
                    g.x0 = current_centroid_x(history).unwrap_or(0.0);
                    g.y0 = current_centroid_y(history).unwrap_or(0.0);
                    g.dx = 0.0;
                    g.dy = 0.0;
                }
                #[cfg(feature = "tracing")]
                tracing::debug!("pan granted");
                grant.call(|c| &mut c.on_grant, e, ());
            })),
            on_reject: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                reject.call(|c| &mut c.on_reject, e, ());
            })),
            on_start: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                started.inner.borrow_mut().gesture.number_active_touches =
                    e.touch_history().number_active_touches();
                started.call(|c| &mut c.on_start, e, ());
            })),
            on_move: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                if moved.account(e.touch_history()) {
                    moved.call(|c| &mut c.on_move, e, ());
                }
            })),
            on_end: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                end.inner.borrow_mut().gesture.number_active_touches =
                    e.touch_history().number_active_touches();
                end.call(|c| &mut c.on_end, e, ());
            })),
            on_release: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                release.call(|c| &mut c.on_release, e, ());
                release.inner.borrow_mut().gesture.reinitialize();
            })),
            on_terminate: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                terminate.call(|c| &mut c.on_terminate, e, ());
                terminate.inner.borrow_mut().gesture.reinitialize();
            })),
            on_termination_request: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                request.call(|c| &mut c.on_termination_request, e, true)
            })),
            ..ResponderConfig::default()
        }
    }

    /// Fold new samples into the state once per native event.
    ///
    /// Returns `false` if the latest sample was already accounted for.
    fn account(&self, history: &TouchHistory<K>) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.gesture.accounted_for_moves_up_to == history.most_recent_sequence() {
            return false;
        }
        inner.gesture.update_on_move(history);
        true
    }

    /// Run a hook with a state snapshot, without holding the borrow.
    fn call<R>(&self, slot: Slot<K, R>, e: &ResponderEvent<'_, K>, absent: R) -> R {
        let (taken, gesture) = {
            let mut inner = self.inner.borrow_mut();
            (slot(&mut inner.config).take(), inner.gesture)
        };
        let Some(mut hook) = taken else {
            return absent;
        };
        let out = hook(e, &gesture);
        let mut inner = self.inner.borrow_mut();
        let place = slot(&mut inner.config);
        if place.is_none() {
            *place = Some(hook);
        }
        out
    }
}
