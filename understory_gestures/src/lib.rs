// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_gestures --heading-base-level=0

//! Understory Gestures: recognizers built on top of responder negotiation.
//!
//! ## Overview
//!
//! [`understory_negotiation`] decides which node owns an interaction. The recognizers in this
//! crate turn that ownership into higher level callbacks:
//!
//! - [`press`]: press in/out, press, long press, keyboard activation and click suppression.
//! - [`pan`]: multi-touch pan with accumulated translation and velocity.
//! - [`hover`]: hover enter/update/leave over pointer paths, with `contain` regions.
//! - [`focus`]: focus, blur and focus-within transitions, plus focus visibility.
//! - [`keyboard`]: key forwarding that keeps the input modality current.
//!
//! Press and pan produce a [`ResponderConfig`](understory_negotiation::registry::ResponderConfig)
//! to register with the [`ResponderSystem`](understory_negotiation::system::ResponderSystem).
//! Hover, focus and keyboard sit beside negotiation and are fed directly by the host.
//!
//! ## Time
//!
//! No recognizer spawns timers. Time-based behavior (long press) uses a polled
//! [`Deadline`](crate::timer::Deadline); the host calls `poll(now)` from its frame or idle loop
//! with the same millisecond clock it stamps events with.
//!
//! ## Features
//!
//! - `std` (default): enable `std` in dependencies.
//! - `libm`: `no_std` numeric support for `kurbo`.
//! - `tracing`: log recognizer transitions with `tracing`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod focus;
pub mod hover;
pub mod keyboard;
pub mod pan;
pub mod press;
pub mod timer;
