// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native input events as the host delivers them.
//!
//! A [`NativeEvent`] is the low-level record fed into
//! [`ResponderSystem::dispatch_native_event`](crate::system::ResponderSystem::dispatch_native_event).
//! Touch input carries its touch lists directly. Mouse and pen input are normalized into a
//! single emulated touch with identifier `0`, so the touch history and the negotiation engine
//! see one uniform stream:
//!
//! ```
//! use kurbo::Point;
//! use understory_negotiation::event::{NativeEvent, NativeEventKind};
//!
//! let down = NativeEvent::mouse(NativeEventKind::PointerStart, 7_u32, Point::new(4.0, 2.0), 100);
//! assert_eq!(down.touches.len(), 1);
//! assert_eq!(down.touches[0].identifier, 0);
//!
//! // Nothing is down after the button is released.
//! let up = NativeEvent::mouse(NativeEventKind::PointerEnd, 7_u32, Point::new(4.0, 2.0), 150);
//! assert!(up.touches.is_empty());
//! assert_eq!(up.changed_touches.len(), 1);
//! ```

use kurbo::Point;
use smallvec::{SmallVec, smallvec};

use crate::types::EventTarget;

/// Identifier of a touch within a touch stream.
pub type TouchId = u32;

/// Inline storage for touch lists; most interactions use one or two fingers.
pub type TouchList<K> = SmallVec<[Touch<K>; 4]>;

/// Kind of a native event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NativeEventKind {
    /// Pointer or touch went down.
    PointerStart,
    /// Pointer or touch moved.
    PointerMove,
    /// Pointer or touch went up.
    PointerEnd,
    /// The platform canceled the pointer stream.
    PointerCancel,
    /// A node (or the window) scrolled.
    Scroll,
    /// The text selection changed.
    SelectionChange,
    /// A context menu was requested.
    ContextMenu,
    /// Focus left the target (node or window).
    Blur,
}

/// Input device class of a pointer event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Mouse or trackpad.
    Mouse,
    /// Finger on a touch surface.
    Touch,
    /// Stylus.
    Pen,
}

bitflags::bitflags! {
    /// Pressed pointer buttons, matching the DOM `buttons` bitmask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        /// Primary button (usually left).
        const PRIMARY   = 0b0000_0001;
        /// Secondary button (usually right).
        const SECONDARY = 0b0000_0010;
        /// Auxiliary button (usually wheel).
        const AUXILIARY = 0b0000_0100;
    }
}

bitflags::bitflags! {
    /// Modifier keys held during an event.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 0b0000_0001;
        /// Control.
        const CTRL  = 0b0000_0010;
        /// Alt / Option.
        const ALT   = 0b0000_0100;
        /// Meta / Command / Windows.
        const META  = 0b0000_1000;
    }
}

/// One touch point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Touch<K> {
    /// Stable identifier for the lifetime of the touch.
    pub identifier: TouchId,
    /// Position in page coordinates.
    pub position: Point,
    /// Time the touch was sampled, in milliseconds.
    pub timestamp: u64,
    /// Node the touch started on.
    pub target: K,
}

/// A low-level input event.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeEvent<K> {
    /// What happened.
    pub kind: NativeEventKind,
    /// Device class.
    pub pointer: PointerKind,
    /// Where it happened.
    pub target: EventTarget<K>,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Touches still down after this event.
    pub touches: TouchList<K>,
    /// Touches this event is about.
    pub changed_touches: TouchList<K>,
    /// Button that changed state (`0` is primary), DOM convention.
    pub button: i16,
    /// Buttons held.
    pub buttons: Buttons,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    /// Node receiving focus, for [`NativeEventKind::Blur`].
    pub related_target: Option<K>,
    /// A non-empty selection exists, for [`NativeEventKind::SelectionChange`].
    pub has_selection: bool,
    /// The origin node is a natively disabled control.
    pub target_disabled: bool,
}

impl<K: Copy> NativeEvent<K> {
    fn bare(kind: NativeEventKind, target: EventTarget<K>, timestamp: u64) -> Self {
        Self {
            kind,
            pointer: PointerKind::Mouse,
            target,
            timestamp,
            touches: SmallVec::new(),
            changed_touches: SmallVec::new(),
            button: 0,
            buttons: Buttons::empty(),
            modifiers: Modifiers::empty(),
            related_target: None,
            has_selection: false,
            target_disabled: false,
        }
    }

    /// A touch event.
    ///
    /// `touches` lists every touch still down after the event and `changed` the touches the
    /// event reports. The event target is the first changed touch's target.
    pub fn touch(
        kind: NativeEventKind,
        touches: &[Touch<K>],
        changed: &[Touch<K>],
        timestamp: u64,
    ) -> Self {
        let target = changed
            .first()
            .or(touches.first())
            .map(|t| EventTarget::Node(t.target))
            .unwrap_or(EventTarget::Window);
        Self {
            pointer: PointerKind::Touch,
            touches: touches.iter().copied().collect(),
            changed_touches: changed.iter().copied().collect(),
            ..Self::bare(kind, target, timestamp)
        }
    }

    /// A primary-button mouse event normalized to the emulated touch `0`.
    pub fn mouse(kind: NativeEventKind, target: K, position: Point, timestamp: u64) -> Self {
        Self::pointer(PointerKind::Mouse, kind, target, position, timestamp)
    }

    /// A mouse or pen event normalized to the emulated touch `0`.
    ///
    /// Start and move hold the primary button; end releases it.
    pub fn pointer(
        pointer: PointerKind,
        kind: NativeEventKind,
        target: K,
        position: Point,
        timestamp: u64,
    ) -> Self {
        let touch = Touch {
            identifier: 0,
            position,
            timestamp,
            target,
        };
        let down = matches!(
            kind,
            NativeEventKind::PointerStart | NativeEventKind::PointerMove
        );
        Self {
            pointer,
            touches: if down { smallvec![touch] } else { SmallVec::new() },
            changed_touches: smallvec![touch],
            buttons: if down {
                Buttons::PRIMARY
            } else {
                Buttons::empty()
            },
            ..Self::bare(kind, EventTarget::Node(target), timestamp)
        }
    }

    /// A scroll of `target`.
    pub fn scroll(target: EventTarget<K>, timestamp: u64) -> Self {
        Self::bare(NativeEventKind::Scroll, target, timestamp)
    }

    /// A selection change originating at `target`.
    pub fn selection_change(target: EventTarget<K>, has_selection: bool, timestamp: u64) -> Self {
        Self {
            has_selection,
            ..Self::bare(NativeEventKind::SelectionChange, target, timestamp)
        }
    }

    /// A context menu request on `target`.
    pub fn context_menu(target: EventTarget<K>, timestamp: u64) -> Self {
        Self::bare(NativeEventKind::ContextMenu, target, timestamp)
    }

    /// Focus leaving `target`, moving to `related_target`.
    pub fn blur(target: EventTarget<K>, related_target: Option<K>, timestamp: u64) -> Self {
        Self {
            related_target,
            ..Self::bare(NativeEventKind::Blur, target, timestamp)
        }
    }

    /// A cancel with no touches, used when the host forces termination.
    pub(crate) fn forced_cancel(target: K, timestamp: u64) -> Self {
        Self::bare(
            NativeEventKind::PointerCancel,
            EventTarget::Node(target),
            timestamp,
        )
    }

    /// Replace the button that changed state.
    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    /// Replace the held buttons.
    pub fn with_buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Replace the held modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Mark the origin node as a natively disabled control.
    pub fn with_target_disabled(mut self, disabled: bool) -> Self {
        self.target_disabled = disabled;
        self
    }

    /// Position of the touch this event is about, falling back to the first held touch.
    pub fn primary_position(&self) -> Option<Point> {
        self.changed_touches
            .first()
            .or(self.touches.first())
            .map(|t| t.position)
    }
}
