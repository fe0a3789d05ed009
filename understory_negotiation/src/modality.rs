// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input modality: the last input mechanism the user reached for.
//!
//! Two values are tracked:
//!
//! - [`ModalityTracker::modality`]: the last device that produced any input, including
//!   hover moves.
//! - [`ModalityTracker::active_modality`]: the last device that produced an activation
//!   (pointer down or key press).
//!
//! Hover adapters ignore touch modality, focus adapters derive "focus visible" from keyboard
//! modality. Listeners are notified whenever either value changes.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::event::{Modifiers, PointerKind};

/// Input mechanism.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Modality {
    /// Keyboard (the initial modality).
    #[default]
    Keyboard,
    /// Mouse or trackpad.
    Mouse,
    /// Touch surface.
    Touch,
    /// Stylus.
    Pen,
}

impl From<PointerKind> for Modality {
    fn from(kind: PointerKind) -> Self {
        match kind {
            PointerKind::Mouse => Self::Mouse,
            PointerKind::Touch => Self::Touch,
            PointerKind::Pen => Self::Pen,
        }
    }
}

/// Snapshot passed to modality listeners.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModalityChange {
    /// Last device used for any input.
    pub modality: Modality,
    /// Last device used for activation.
    pub active_modality: Modality,
}

/// Handle returned by [`ModalityTracker::add_listener`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(ModalityChange)>;

/// Tracks [`Modality`] and notifies listeners on change.
pub struct ModalityTracker {
    modality: Modality,
    active_modality: Modality,
    previous: Option<ModalityChange>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl fmt::Debug for ModalityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalityTracker")
            .field("modality", &self.modality)
            .field("active_modality", &self.active_modality)
            .field("previous", &self.previous)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl ModalityTracker {
    /// Create a tracker in keyboard modality.
    pub fn new() -> Self {
        Self {
            modality: Modality::Keyboard,
            active_modality: Modality::Keyboard,
            previous: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Last device used for any input.
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Last device used for activation.
    pub fn active_modality(&self) -> Modality {
        self.active_modality
    }

    /// Register a change listener.
    pub fn add_listener(&mut self, listener: impl FnMut(ModalityChange) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns `false` if it was already removed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _)| *l != id);
        self.listeners.len() != before
    }

    /// A pointer went down.
    pub fn on_pointer_down(&mut self, kind: PointerKind) {
        let next = Modality::from(kind);
        if self.active_modality != next {
            self.modality = next;
            self.active_modality = next;
            self.notify();
        }
    }

    /// A pointer moved (with or without buttons held).
    pub fn on_pointer_move(&mut self, kind: PointerKind) {
        let next = Modality::from(kind);
        if self.modality != next {
            self.modality = next;
            self.notify();
        }
    }

    /// A key went down. Shortcuts (meta, alt, ctrl) do not switch modality.
    pub fn on_key_down(&mut self, modifiers: Modifiers) {
        if modifiers.intersects(Modifiers::META | Modifiers::ALT | Modifiers::CTRL) {
            return;
        }
        if self.modality != Modality::Keyboard {
            self.modality = Modality::Keyboard;
            self.active_modality = Modality::Keyboard;
            self.notify();
        }
    }

    /// The window lost focus; remember the current pair and fall back to keyboard.
    pub fn on_window_blur(&mut self) {
        self.previous = Some(self.snapshot());
        self.modality = Modality::Keyboard;
        self.active_modality = Modality::Keyboard;
        self.notify();
    }

    /// The window regained focus; restore the pair saved on blur.
    pub fn on_window_focus(&mut self) {
        self.restore();
    }

    /// Visibility changed; a visible page restores the pair saved on blur.
    pub fn on_visibility_change(&mut self, visible: bool) {
        if visible {
            self.restore();
        }
    }

    /// Return to keyboard modality without notifying listeners.
    pub fn reset(&mut self) {
        self.modality = Modality::Keyboard;
        self.active_modality = Modality::Keyboard;
        self.previous = None;
    }

    fn restore(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.modality = previous.modality;
            self.active_modality = previous.active_modality;
            self.notify();
        }
    }

    fn snapshot(&self) -> ModalityChange {
        ModalityChange {
            modality: self.modality,
            active_modality: self.active_modality,
        }
    }

    fn notify(&mut self) {
        let change = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }
}

impl Default for ModalityTracker {
    fn default() -> Self {
        Self::new()
    }
}
