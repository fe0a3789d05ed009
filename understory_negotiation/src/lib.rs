// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_negotiation --heading-base-level=0

//! Understory Negotiation: a deterministic, `no_std` responder lock for UI node trees.
//!
//! ## Overview
//!
//! A pointer or touch interaction is owned by at most one node at a time: the responder.
//! Nodes register a [`ResponderConfig`](crate::registry::ResponderConfig) with predicates
//! ("do you want to become the responder?") and lifecycle callbacks (grant, start, move, end,
//! release, terminate). The [`ResponderSystem`](crate::system::ResponderSystem) feeds native
//! input events through those hooks and arbitrates handoff.
//!
//! This crate does not perform hit testing and holds no node handles beyond their keys. The
//! host supplies the origin node of each event and its tree through
//! [`ParentLookup`](crate::types::ParentLookup).
//!
//! ## Negotiation
//!
//! For each start, move, scroll and selection change, eligible nodes on the event path are
//! asked in a fixed order:
//!
//! - Capture predicates, outermost → innermost: ancestors win over descendants.
//! - Bubble predicates, innermost → outermost: the origin wins over its ancestors.
//!
//! Scroll and selection negotiations do not bubble; after the capture walk only the origin is
//! asked. Any predicate may stop propagation, which ends the walk with no candidate.
//!
//! While a responder is active, only nodes above the lowest common ancestor of the active path
//! and the new event path take part, so a responder is never displaced by its own descendants.
//! A willing node is granted the lock if the current responder agrees to terminate; otherwise
//! it is rejected.
//!
//! ## Lifecycle
//!
//! The current responder receives start and move callbacks for every pointer event, end for
//! every pointer end, and then either release (the last pointer in its subtree went up) or
//! terminate (cancel, context menu, window blur, scroll of an ancestor, a live text selection,
//! or a forced termination by the host).
//!
//! ## Touch history
//!
//! [`TouchHistory`](crate::touch_history::TouchHistory) records start, current and previous
//! samples per touch identifier before any hook runs. [`touch_math`] derives centroids from it;
//! gesture recognizers use those to compute pan deltas and velocities.
//!
//! ## Dispatcher
//!
//! The negotiation walk is an explicit sequence of [`Dispatch`](crate::types::Dispatch)
//! entries driven by [`dispatcher::run`], which honors stop outcomes.
//!
//! ## Features
//!
//! - `std` (default): enable `std` in dependencies.
//! - `libm`: `no_std` numeric support for `kurbo`.
//! - `tracing`: log grants, transfers, rejections, releases and terminations with `tracing`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod dispatcher;
pub mod event;
pub mod modality;
pub mod path;
pub mod registry;
pub mod system;
pub mod touch_history;
pub mod touch_math;
pub mod types;
