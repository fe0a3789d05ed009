// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Press recognition: press, long press, press in/out, keyboard activation.
//!
//! [`PressResponder`] turns the responder lifecycle of one node into press callbacks. Register
//! the config returned by [`PressResponder::responder_config`] with the
//! [`ResponderSystem`](understory_negotiation::system::ResponderSystem), then forward host
//! clicks, key events and a periodic [`PressResponder::poll`] to the same responder.
//!
//! ## Press rules
//!
//! 1. **Grant**: the node becomes the responder on pointer start unless the press is disabled
//!    or the origin control is natively disabled. A disabled [`PressConfig::button`] also stops
//!    propagation, so its ancestors are not asked either. Grant fires `on_press_start` and
//!    `on_press_change(true)` and arms the long-press deadline.
//! 2. **Move**: fires `on_press_move`. Moving more than [`LONG_PRESS_MOVE_THRESHOLD`] from the
//!    activation point cancels the long-press deadline.
//! 3. **Long press**: [`PressResponder::poll`] fires `on_long_press` once when the deadline is
//!    due.
//! 4. **Release**: fires `on_press_end` and `on_press_change(false)`, then `on_press` unless a
//!    long press fired or a text selection ended the gesture.
//! 5. **Terminate**: deactivates without `on_press`.
//!
//! ## Clicks
//!
//! Hosts deliver native clicks too. A click within [`CLICK_SUPPRESSION_TIMEOUT_MS`] of a press
//! that already fired (or deliberately skipped) `on_press` is swallowed; any other click fires
//! `on_press`, which covers assistive technology activation.
//!
//! ## Usage
//!
//! ```
//! use std::{cell::Cell, rc::Rc};
//!
//! use kurbo::Point;
//! use understory_gestures::press::{PressConfig, PressResponder};
//! use understory_negotiation::event::{NativeEvent, NativeEventKind};
//! use understory_negotiation::system::ResponderSystem;
//!
//! let pressed = Rc::new(Cell::new(0));
//! let counter = pressed.clone();
//! let press = PressResponder::new(PressConfig {
//!     on_press: Some(Box::new(move |_| counter.set(counter.get() + 1))),
//!     ..PressConfig::default()
//! });
//!
//! let mut system: ResponderSystem<u32> = ResponderSystem::new();
//! system.register_node(1, Some(press.responder_config()));
//!
//! let at = Point::new(3.0, 3.0);
//! system.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerStart, 1, at, 0));
//! system.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerEnd, 1, at, 80));
//! assert_eq!(pressed.get(), 1);
//!
//! // The click the platform sends after the same press is swallowed.
//! assert!(!press.on_click(Some(at), 90));
//! assert_eq!(pressed.get(), 1);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::Point;
use understory_negotiation::event::{NativeEventKind, PointerKind};
use understory_negotiation::registry::{ResponderConfig, ResponderEvent};

use crate::keyboard::{Key, is_activation_key};
use crate::timer::Deadline;

/// Default long-press delay in milliseconds.
pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 500;

/// Shortest accepted long-press delay in milliseconds.
pub const MIN_LONG_PRESS_DELAY_MS: u64 = 10;

/// Distance from the activation point that cancels a pending long press.
pub const LONG_PRESS_MOVE_THRESHOLD: f64 = 10.0;

/// How long after a pointer press a native click is treated as its echo, in milliseconds.
pub const CLICK_SUPPRESSION_TIMEOUT_MS: u64 = 1000;

/// What produced a press callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PressSource {
    /// A pointer negotiated through the responder system.
    Pointer(PointerKind),
    /// Enter or Space.
    Keyboard,
    /// A native click not preceded by a pointer press.
    Click,
}

/// Payload of every press callback.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PressEvent {
    /// Pointer position, when the source has one.
    pub position: Option<Point>,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Input that produced the callback.
    pub source: PressSource,
}

/// Press callback.
pub type PressHandler = Box<dyn FnMut(&PressEvent)>;

/// Press state change callback (`true` while pressed).
pub type PressChangeHandler = Box<dyn FnMut(bool)>;

/// Press behavior and hooks.
pub struct PressConfig {
    /// Refuse the responder and ignore keyboard and click activation.
    pub disabled: bool,
    /// The node is a button. A disabled button also keeps its ancestors from claiming the press.
    pub button: bool,
    /// Give up the responder when another node asks.
    pub cancelable: bool,
    /// Long-press delay in milliseconds, clamped to [`MIN_LONG_PRESS_DELAY_MS`].
    pub delay_long_press: u64,
    /// The press completed.
    pub on_press: Option<PressHandler>,
    /// The press was held past the long-press delay.
    pub on_long_press: Option<PressHandler>,
    /// The press began.
    pub on_press_start: Option<PressHandler>,
    /// The press ended, completed or not.
    pub on_press_end: Option<PressHandler>,
    /// The pointer moved while pressed.
    pub on_press_move: Option<PressHandler>,
    /// Pressed state changed.
    pub on_press_change: Option<PressChangeHandler>,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            button: false,
            cancelable: true,
            delay_long_press: DEFAULT_LONG_PRESS_DELAY_MS,
            on_press: None,
            on_long_press: None,
            on_press_start: None,
            on_press_end: None,
            on_press_move: None,
            on_press_change: None,
        }
    }
}

impl fmt::Debug for PressConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PressConfig")
            .field("disabled", &self.disabled)
            .field("button", &self.button)
            .field("cancelable", &self.cancelable)
            .field("delay_long_press", &self.delay_long_press)
            .field("on_press", &self.on_press.is_some())
            .field("on_long_press", &self.on_long_press.is_some())
            .field("on_press_start", &self.on_press_start.is_some())
            .field("on_press_end", &self.on_press_end.is_some())
            .field("on_press_move", &self.on_press_move.is_some())
            .field("on_press_change", &self.on_press_change.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct PressState {
    config: PressConfig,
    /// Pressed, by pointer or key.
    active: bool,
    source: Option<PressSource>,
    activate_position: Option<Point>,
    long_press: Deadline,
    long_press_dispatched: bool,
    selection_terminated: bool,
    /// Native clicks up to this time echo a finished pointer or key press.
    suppress_click_until: Option<u64>,
    key_down: Option<Key>,
}

impl PressState {
    fn new(config: PressConfig) -> Self {
        Self {
            config,
            active: false,
            source: None,
            activate_position: None,
            long_press: Deadline::new(),
            long_press_dispatched: false,
            selection_terminated: false,
            suppress_click_until: None,
            key_down: None,
        }
    }

    fn long_press_delay(&self) -> u64 {
        self.config.delay_long_press.max(MIN_LONG_PRESS_DELAY_MS)
    }
}

type Slot = fn(&mut PressConfig) -> &mut Option<PressHandler>;

/// Press recognizer shared between the responder hooks and the host.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct PressResponder {
    state: Rc<RefCell<PressState>>,
}

impl fmt::Debug for PressResponder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f.debug_tuple("PressResponder").field(&*state).finish(),
            Err(_) => f.write_str("PressResponder(<in use>)"),
        }
    }
}

impl PressResponder {
    /// Create a recognizer.
    pub fn new(config: PressConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(PressState::new(config))),
        }
    }

    /// Replace the config, keeping an ongoing press.
    pub fn set_config(&self, config: PressConfig) {
        self.state.borrow_mut().config = config;
    }

    /// `true` while pressed.
    pub fn is_pressed(&self) -> bool {
        self.state.borrow().active
    }

    /// `true` once the current press fired `on_long_press`.
    pub fn long_press_dispatched(&self) -> bool {
        self.state.borrow().long_press_dispatched
    }

    /// Time the pending long press fires at, if any.
    pub fn long_press_deadline(&self) -> Option<u64> {
        self.state.borrow().long_press.at()
    }

    /// Responder hooks driving this recognizer; register them for the pressable node.
    pub fn responder_config<K: Copy + 'static>(&self) -> ResponderConfig<K> {
        let wants = self.clone();
        let grant = self.clone();
        let moved = self.clone();
        let release = self.clone();
        let terminate = self.clone();
        let request = self.clone();
        ResponderConfig {
            wants_responder_on_start: Some(Box::new(move |e: &mut ResponderEvent<'_, K>| {
                wants.wants_responder(e)
            })),
            on_grant: Some(Box::new(move |e: &ResponderEvent<'_, K>| grant.grant(e))),
            on_move: Some(Box::new(move |e: &ResponderEvent<'_, K>| moved.moved(e))),
            on_release: Some(Box::new(move |e: &ResponderEvent<'_, K>| release.release(e))),
            on_terminate: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                terminate.terminate(e);
            })),
            on_termination_request: Some(Box::new(move |e: &ResponderEvent<'_, K>| {
                request.allows_termination(e)
            })),
            ..ResponderConfig::default()
        }
    }

    /// Fire the long press if its deadline is due. Returns `true` if `on_long_press` ran.
    pub fn poll(&self, now: u64) -> bool {
        let event = {
            let mut s = self.state.borrow_mut();
            if !s.active || s.config.on_long_press.is_none() || !s.long_press.fire(now) {
                return false;
            }
            s.long_press_dispatched = true;
            PressEvent {
                position: s.activate_position,
                timestamp: now,
                source: s.source.unwrap_or(PressSource::Pointer(PointerKind::Touch)),
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(timestamp = now, "long press");
        self.emit(|c| &mut c.on_long_press, &event);
        true
    }

    /// Handle a native click. Returns `true` if `on_press` ran.
    pub fn on_click(&self, position: Option<Point>, timestamp: u64) -> bool {
        {
            let mut s = self.state.borrow_mut();
            if s.config.disabled {
                return false;
            }
            if let Some(until) = s.suppress_click_until.take()
                && timestamp <= until
            {
                return false;
            }
        }
        let event = PressEvent {
            position,
            timestamp,
            source: PressSource::Click,
        };
        self.emit(|c| &mut c.on_press, &event);
        true
    }

    /// Handle a key press. Returns `true` if the key started a press.
    pub fn key_down(&self, key: Key, timestamp: u64) -> bool {
        {
            let mut s = self.state.borrow_mut();
            if s.config.disabled || !is_activation_key(key) || s.active {
                return false;
            }
            s.active = true;
            s.key_down = Some(key);
            s.source = Some(PressSource::Keyboard);
            s.activate_position = None;
            s.long_press_dispatched = false;
            s.selection_terminated = false;
        }
        self.activated(&PressEvent {
            position: None,
            timestamp,
            source: PressSource::Keyboard,
        });
        true
    }

    /// Handle a key release. Returns `true` if the key completed a press.
    pub fn key_up(&self, key: Key, timestamp: u64) -> bool {
        {
            let mut s = self.state.borrow_mut();
            if s.key_down != Some(key) {
                return false;
            }
            s.key_down = None;
            s.active = false;
            s.suppress_click_until = Some(timestamp.saturating_add(CLICK_SUPPRESSION_TIMEOUT_MS));
        }
        let event = PressEvent {
            position: None,
            timestamp,
            source: PressSource::Keyboard,
        };
        self.deactivated(&event);
        self.emit(|c| &mut c.on_press, &event);
        true
    }

    fn wants_responder<K: Copy>(&self, e: &mut ResponderEvent<'_, K>) -> bool {
        let s = self.state.borrow();
        if s.config.disabled {
            if s.config.button {
                e.stop_propagation();
            }
            return false;
        }
        !e.native().target_disabled
    }

    fn grant<K: Copy>(&self, e: &ResponderEvent<'_, K>) {
        let native = e.native();
        let event = PressEvent {
            position: native.primary_position(),
            timestamp: native.timestamp,
            source: PressSource::Pointer(native.pointer),
        };
        {
            let mut s = self.state.borrow_mut();
            s.active = true;
            s.source = Some(event.source);
            s.activate_position = event.position;
            s.long_press_dispatched = false;
            s.selection_terminated = false;
            s.suppress_click_until = None;
            let delay = s.long_press_delay();
            s.long_press.arm(event.timestamp, delay);
        }
        self.activated(&event);
    }

    fn moved<K: Copy>(&self, e: &ResponderEvent<'_, K>) {
        let native = e.native();
        let event = PressEvent {
            position: native.primary_position(),
            timestamp: native.timestamp,
            source: PressSource::Pointer(native.pointer),
        };
        {
            let mut s = self.state.borrow_mut();
            if let (Some(from), Some(to)) = (s.activate_position, event.position)
                && from.distance(to) > LONG_PRESS_MOVE_THRESHOLD
            {
                s.long_press.cancel();
            }
        }
        self.emit(|c| &mut c.on_press_move, &event);
    }

    fn release<K: Copy>(&self, e: &ResponderEvent<'_, K>) {
        let native = e.native();
        let event = PressEvent {
            position: native.primary_position(),
            timestamp: native.timestamp,
            source: PressSource::Pointer(native.pointer),
        };
        let fire_press = {
            let mut s = self.state.borrow_mut();
            s.active = false;
            s.long_press.cancel();
            s.suppress_click_until =
                Some(event.timestamp.saturating_add(CLICK_SUPPRESSION_TIMEOUT_MS));
            !s.long_press_dispatched && !s.selection_terminated
        };
        self.deactivated(&event);
        if fire_press {
            self.emit(|c| &mut c.on_press, &event);
        }
    }

    fn terminate<K: Copy>(&self, e: &ResponderEvent<'_, K>) {
        let native = e.native();
        let event = PressEvent {
            position: native.primary_position(),
            timestamp: native.timestamp,
            source: PressSource::Pointer(native.pointer),
        };
        let was_active = {
            let mut s = self.state.borrow_mut();
            if native.kind == NativeEventKind::SelectionChange {
                s.selection_terminated = true;
            }
            s.long_press.cancel();
            core::mem::replace(&mut s.active, false)
        };
        if was_active {
            self.deactivated(&event);
        }
    }

    fn allows_termination<K: Copy>(&self, e: &ResponderEvent<'_, K>) -> bool {
        let s = self.state.borrow();
        let touch_long_press = s.active
            && s.source == Some(PressSource::Pointer(PointerKind::Touch))
            && s.config.on_long_press.is_some();
        if e.kind() == NativeEventKind::ContextMenu && touch_long_press {
            return false;
        }
        s.config.cancelable
    }

    fn activated(&self, event: &PressEvent) {
        self.emit(|c| &mut c.on_press_start, event);
        self.change(true);
    }

    fn deactivated(&self, event: &PressEvent) {
        self.emit(|c| &mut c.on_press_end, event);
        self.change(false);
    }

    /// Run a hook without holding the state borrow, so hooks may query this responder.
    fn emit(&self, slot: Slot, event: &PressEvent) {
        let taken = slot(&mut self.state.borrow_mut().config).take();
        if let Some(mut hook) = taken {
            hook(event);
            let mut s = self.state.borrow_mut();
            let place = slot(&mut s.config);
            // A hook that replaced the config wins.
            if place.is_none() {
                *place = Some(hook);
            }
        }
    }

    fn change(&self, pressed: bool) {
        let taken = self.state.borrow_mut().config.on_press_change.take();
        if let Some(mut hook) = taken {
            hook(pressed);
            let mut s = self.state.borrow_mut();
            if s.config.on_press_change.is_none() {
                s.config.on_press_change = Some(hook);
            }
        }
    }
}
