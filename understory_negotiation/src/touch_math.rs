// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Centroid math over a [`TouchHistory`] snapshot.
//!
//! The windowed variants only consider touches whose latest sample is strictly newer than a
//! given sample sequence number (see [`TouchHistory::most_recent_sequence`]). Gesture code keeps
//! a high-water mark of the samples it has already accounted for and asks for the centroid shift
//! of the touches that moved since, so touches that move in separate native events are each
//! counted once, even when those events share a timestamp.

use crate::touch_history::{TouchHistory, TouchRecord};

#[derive(Copy, Clone)]
enum Axis {
    X,
    Y,
}

#[derive(Copy, Clone)]
enum Sample {
    Current,
    Previous,
}

fn coordinate<K>(record: &TouchRecord<K>, axis: Axis, sample: Sample) -> f64 {
    let p = match sample {
        Sample::Current => record.current,
        Sample::Previous => record.previous,
    };
    match axis {
        Axis::X => p.x,
        Axis::Y => p.y,
    }
}

fn centroid_dimension<K: Copy>(
    history: &TouchHistory<K>,
    changed_after: Option<u64>,
    axis: Axis,
    sample: Sample,
) -> Option<f64> {
    let mut total = 0.0;
    let mut count = 0_u32;
    for (_, record) in history.records() {
        if changed_after.is_none_or(|after| record.current_sequence > after) {
            total += coordinate(record, axis, sample);
            count += 1;
        }
    }
    (count > 0).then(|| total / f64::from(count))
}

/// Mean current x of all tracked touches.
pub fn current_centroid_x<K: Copy>(history: &TouchHistory<K>) -> Option<f64> {
    centroid_dimension(history, None, Axis::X, Sample::Current)
}

/// Mean current y of all tracked touches.
pub fn current_centroid_y<K: Copy>(history: &TouchHistory<K>) -> Option<f64> {
    centroid_dimension(history, None, Axis::Y, Sample::Current)
}

/// Mean current x of touches sampled after sequence number `after`.
pub fn current_centroid_x_of_touches_changed_after<K: Copy>(
    history: &TouchHistory<K>,
    after: u64,
) -> Option<f64> {
    centroid_dimension(history, Some(after), Axis::X, Sample::Current)
}

/// Mean current y of touches sampled after sequence number `after`.
pub fn current_centroid_y_of_touches_changed_after<K: Copy>(
    history: &TouchHistory<K>,
    after: u64,
) -> Option<f64> {
    centroid_dimension(history, Some(after), Axis::Y, Sample::Current)
}

/// Mean previous x of touches sampled after sequence number `after`.
pub fn previous_centroid_x_of_touches_changed_after<K: Copy>(
    history: &TouchHistory<K>,
    after: u64,
) -> Option<f64> {
    centroid_dimension(history, Some(after), Axis::X, Sample::Previous)
}

/// Mean previous y of touches sampled after sequence number `after`.
pub fn previous_centroid_y_of_touches_changed_after<K: Copy>(
    history: &TouchHistory<K>,
    after: u64,
) -> Option<f64> {
    centroid_dimension(history, Some(after), Axis::Y, Sample::Previous)
}

/// Number of touches sampled after sequence number `after`.
pub fn touches_changed_after<K: Copy>(history: &TouchHistory<K>, after: u64) -> usize {
    history
        .records()
        .filter(|(_, r)| r.current_sequence > after)
        .count()
}
