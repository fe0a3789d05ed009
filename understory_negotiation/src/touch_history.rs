// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Touch history: per-identifier start/current/previous samples.
//!
//! The store is pure bookkeeping. It is updated by the negotiation engine before any predicate
//! or lifecycle callback runs, so callbacks always observe the samples of the event they are
//! handling.
//!
//! ## Lifecycle of a record
//!
//! - A start event inserts a record for each changed touch, with start, current and previous
//!   all equal to the reported sample. A start for an identifier that is already tracked resets
//!   the record.
//! - A move event shifts current into previous and stores the new sample. The start sample is
//!   left untouched.
//! - An end or cancel event removes the record. Ending an untracked identifier is a no-op.
//!
//! Every recorded sample is also stamped with a sample sequence number. Timestamps have
//! millisecond resolution and several native events can share one; the sequence orders samples
//! strictly, so "changed since" windows never lose a touch that moved within the same
//! millisecond.
//!
//! ```
//! use kurbo::Point;
//! use understory_negotiation::event::{NativeEvent, NativeEventKind, Touch};
//! use understory_negotiation::touch_history::TouchHistory;
//!
//! let mut history: TouchHistory<u32> = TouchHistory::new();
//! let t = Touch { identifier: 1, position: Point::new(0.0, 0.0), timestamp: 10, target: 5 };
//! history.record_touch_track(&NativeEvent::touch(NativeEventKind::PointerStart, &[t], &[t], 10));
//!
//! let moved = Touch { position: Point::new(3.0, 4.0), timestamp: 20, ..t };
//! history.record_touch_track(&NativeEvent::touch(NativeEventKind::PointerMove, &[moved], &[moved], 20));
//!
//! let record = history.get(1).unwrap();
//! assert_eq!(record.start, Point::new(0.0, 0.0));
//! assert_eq!(record.previous, Point::new(0.0, 0.0));
//! assert_eq!(record.current, Point::new(3.0, 4.0));
//! assert_eq!(history.most_recent_timestamp(), 20);
//! ```

use alloc::collections::BTreeMap;

use kurbo::Point;

use crate::event::{NativeEvent, NativeEventKind, Touch, TouchId};

/// Maximum number of concurrently tracked touches.
///
/// Starts beyond this bound are dropped.
pub const MAX_TOUCH_BANK: usize = 20;

/// Samples for one tracked touch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchRecord<K> {
    /// Position at start.
    pub start: Point,
    /// Time of the start sample.
    pub start_timestamp: u64,
    /// Latest position.
    pub current: Point,
    /// Time of the latest sample.
    pub current_timestamp: u64,
    /// Position before the latest sample.
    pub previous: Point,
    /// Time of the sample before the latest one.
    pub previous_timestamp: u64,
    /// Sequence number of the latest sample.
    pub current_sequence: u64,
    /// Node the touch started on.
    pub target: K,
}

impl<K: Copy> TouchRecord<K> {
    fn from_touch(touch: &Touch<K>, sequence: u64) -> Self {
        Self {
            start: touch.position,
            start_timestamp: touch.timestamp,
            current: touch.position,
            current_timestamp: touch.timestamp,
            previous: touch.position,
            previous_timestamp: touch.timestamp,
            current_sequence: sequence,
            target: touch.target,
        }
    }

    fn advance(&mut self, touch: &Touch<K>, sequence: u64) {
        self.previous = self.current;
        self.previous_timestamp = self.current_timestamp;
        self.current = touch.position;
        self.current_timestamp = touch.timestamp;
        self.current_sequence = sequence;
    }
}

/// Bounded map from touch identifier to [`TouchRecord`].
#[derive(Clone, Debug)]
pub struct TouchHistory<K> {
    bank: BTreeMap<TouchId, TouchRecord<K>>,
    most_recent_timestamp: u64,
    /// Last issued sample sequence number; never rewinds.
    sequence: u64,
}

impl<K: Copy> TouchHistory<K> {
    /// Create an empty history.
    pub fn new() -> Self {
        Self {
            bank: BTreeMap::new(),
            most_recent_timestamp: 0,
            sequence: 0,
        }
    }

    /// Update the store from a native event.
    ///
    /// Only pointer start, move, end and cancel mutate the store.
    pub fn record_touch_track(&mut self, native: &NativeEvent<K>) {
        match native.kind {
            NativeEventKind::PointerStart => {
                for touch in &native.changed_touches {
                    self.record_start(touch);
                }
            }
            NativeEventKind::PointerMove => {
                for touch in &native.changed_touches {
                    self.record_move(touch);
                }
            }
            NativeEventKind::PointerEnd | NativeEventKind::PointerCancel => {
                for touch in &native.changed_touches {
                    self.record_end(touch);
                }
            }
            _ => {}
        }
    }

    fn record_start(&mut self, touch: &Touch<K>) {
        if !self.bank.contains_key(&touch.identifier) && self.bank.len() >= MAX_TOUCH_BANK {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                identifier = touch.identifier,
                max = MAX_TOUCH_BANK,
                "touch bank full, dropping touch start"
            );
            return;
        }
        let sequence = self.next_sequence();
        self.bank
            .insert(touch.identifier, TouchRecord::from_touch(touch, sequence));
        self.most_recent_timestamp = touch.timestamp;
    }

    fn record_move(&mut self, touch: &Touch<K>) {
        let Some(record) = self.bank.get_mut(&touch.identifier) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                identifier = touch.identifier,
                "cannot record touch move without a touch start"
            );
            return;
        };
        self.sequence = self.sequence.wrapping_add(1);
        record.advance(touch, self.sequence);
        self.most_recent_timestamp = touch.timestamp;
    }

    fn record_end(&mut self, touch: &Touch<K>) {
        if self.bank.remove(&touch.identifier).is_some() {
            self.next_sequence();
            self.most_recent_timestamp = touch.timestamp;
        }
    }

    fn next_sequence(&mut self) -> u64 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Number of tracked touches.
    pub fn number_active_touches(&self) -> usize {
        self.bank.len()
    }

    /// Identifier of the only tracked touch, when exactly one is down.
    pub fn single_active_touch(&self) -> Option<TouchId> {
        if self.bank.len() == 1 {
            self.bank.keys().next().copied()
        } else {
            None
        }
    }

    /// Timestamp of the most recently recorded sample.
    pub fn most_recent_timestamp(&self) -> u64 {
        self.most_recent_timestamp
    }

    /// Sequence number of the most recently recorded sample.
    ///
    /// Advances on every recorded start, move and end sample, including several within the same
    /// millisecond.
    pub fn most_recent_sequence(&self) -> u64 {
        self.sequence
    }

    /// Record for `identifier`, if tracked.
    pub fn get(&self, identifier: TouchId) -> Option<&TouchRecord<K>> {
        self.bank.get(&identifier)
    }

    /// Iterate over tracked records in identifier order.
    pub fn records(&self) -> impl Iterator<Item = (TouchId, &TouchRecord<K>)> {
        self.bank.iter().map(|(id, r)| (*id, r))
    }

    /// `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.bank.is_empty()
    }

    /// Drop all records. The sample sequence keeps counting.
    pub fn reset(&mut self) {
        self.bank.clear();
        self.most_recent_timestamp = 0;
    }
}

impl<K: Copy> Default for TouchHistory<K> {
    fn default() -> Self {
        Self::new()
    }
}
