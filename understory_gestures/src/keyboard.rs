// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard forwarding.
//!
//! Keyboard input does not take part in responder negotiation; it is routed to the focused
//! node by the host. [`KeyboardResponder`] forwards key events to optional hooks, gated by a
//! `disabled` flag, and keeps the input modality current.

use alloc::boxed::Box;
use core::fmt;

use understory_negotiation::event::Modifiers;
use understory_negotiation::modality::ModalityTracker;

/// Logical key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Enter / Return.
    Enter,
    /// Space bar.
    Space,
    /// Escape.
    Escape,
    /// Tab.
    Tab,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// A printable character.
    Character(char),
}

/// A key press or release.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key that changed state.
    pub key: Key,
    /// Modifiers held.
    pub modifiers: Modifiers,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Auto-repeat of a held key.
    pub repeat: bool,
}

impl KeyEvent {
    /// A non-repeating event without modifiers.
    pub fn new(key: Key, timestamp: u64) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            timestamp,
            repeat: false,
        }
    }
}

/// `true` for keys that activate a pressable control.
pub fn is_activation_key(key: Key) -> bool {
    matches!(key, Key::Enter | Key::Space)
}

/// Key event hook.
pub type KeyHandler = Box<dyn FnMut(&KeyEvent)>;

/// Keyboard hooks for one node.
#[derive(Default)]
pub struct KeyboardConfig {
    /// Ignore all key input.
    pub disabled: bool,
    /// Key went down.
    pub on_key_down: Option<KeyHandler>,
    /// Key went up.
    pub on_key_up: Option<KeyHandler>,
}

impl fmt::Debug for KeyboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardConfig")
            .field("disabled", &self.disabled)
            .field("on_key_down", &self.on_key_down.is_some())
            .field("on_key_up", &self.on_key_up.is_some())
            .finish()
    }
}

/// Forwards key events to a [`KeyboardConfig`].
#[derive(Debug, Default)]
pub struct KeyboardResponder {
    config: KeyboardConfig,
}

impl KeyboardResponder {
    /// Wrap a config.
    pub fn new(config: KeyboardConfig) -> Self {
        Self { config }
    }

    /// Replace the config.
    pub fn set_config(&mut self, config: KeyboardConfig) {
        self.config = config;
    }

    /// Handle a key press. Returns `true` if a hook ran.
    ///
    /// The modality is updated even when disabled, since the user did reach for the keyboard.
    pub fn key_down(&mut self, event: &KeyEvent, modality: &mut ModalityTracker) -> bool {
        modality.on_key_down(event.modifiers);
        if self.config.disabled {
            return false;
        }
        match self.config.on_key_down.as_mut() {
            Some(hook) => {
                hook(event);
                true
            }
            None => false,
        }
    }

    /// Handle a key release. Returns `true` if a hook ran.
    pub fn key_up(&mut self, event: &KeyEvent) -> bool {
        if self.config.disabled {
            return false;
        }
        match self.config.on_key_up.as_mut() {
            Some(hook) => {
                hook(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use understory_negotiation::event::PointerKind;
    use understory_negotiation::modality::Modality;

    #[test]
    fn activation_keys() {
        assert!(is_activation_key(Key::Enter));
        assert!(is_activation_key(Key::Space));
        assert!(!is_activation_key(Key::Character(' ')));
        assert!(!is_activation_key(Key::Escape));
    }

    #[test]
    fn forwards_until_disabled() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (down, up) = (seen.clone(), seen.clone());
        let mut responder = KeyboardResponder::new(KeyboardConfig {
            disabled: false,
            on_key_down: Some(Box::new(move |e| down.borrow_mut().push(("down", e.key)))),
            on_key_up: Some(Box::new(move |e| up.borrow_mut().push(("up", e.key)))),
        });
        let mut modality = ModalityTracker::new();
        modality.on_pointer_down(PointerKind::Mouse);

        assert!(responder.key_down(&KeyEvent::new(Key::Tab, 0), &mut modality));
        assert!(responder.key_up(&KeyEvent::new(Key::Tab, 1)));
        assert_eq!(modality.modality(), Modality::Keyboard);
        assert_eq!(*seen.borrow(), [("down", Key::Tab), ("up", Key::Tab)]);

        responder.set_config(KeyboardConfig {
            disabled: true,
            ..KeyboardConfig::default()
        });
        modality.on_pointer_down(PointerKind::Mouse);
        assert!(!responder.key_down(&KeyEvent::new(Key::Enter, 2), &mut modality));
        assert_eq!(modality.modality(), Modality::Keyboard);
    }
}
