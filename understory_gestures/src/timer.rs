// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polled deadlines.
//!
//! Recognizers never spawn timers. They arm a [`Deadline`] and the host calls the
//! recognizer's `poll(now)` from its frame or idle loop.

/// A one-shot deadline in milliseconds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<u64>,
}

impl Deadline {
    /// A disarmed deadline.
    pub const fn new() -> Self {
        Self { at: None }
    }

    /// Fire `delay` milliseconds after `now`, replacing any earlier arming.
    pub fn arm(&mut self, now: u64, delay: u64) {
        self.at = Some(now.saturating_add(delay));
    }

    /// Disarm. Cancelling a disarmed deadline is a no-op.
    pub fn cancel(&mut self) {
        self.at = None;
    }

    /// `true` while armed.
    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Time the deadline fires at, if armed.
    pub fn at(&self) -> Option<u64> {
        self.at
    }

    /// `true` if armed and `now` reached the deadline.
    pub fn is_due(&self, now: u64) -> bool {
        self.at.is_some_and(|at| now >= at)
    }

    /// Disarm and return `true` if the deadline is due; a deadline fires once.
    pub fn fire(&mut self, now: u64) -> bool {
        let due = self.is_due(now);
        if due {
            self.at = None;
        }
        due
    }
}
