// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property-based invariant tests for responder negotiation.
//!
//! 1. The lowest common ancestor of two paths in one tree is a shared ancestor, and no deeper
//!    node is shared.
//! 2. Paths in different trees have no common ancestor.
//! 3. At most one node holds the lock, and `on_grant` never fires while another node holds it.
//! 4. The engine's current responder always matches the grant/release/terminate stream.

use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::Point;
use proptest::prelude::*;
use understory_negotiation::event::{NativeEvent, NativeEventKind, Touch};
use understory_negotiation::path::{contains, lowest_common_ancestor, raw_event_path};
use understory_negotiation::registry::{ResponderConfig, ResponderEvent};
use understory_negotiation::system::ResponderSystem;
use understory_negotiation::types::{EventTarget, NoStyle};

// ── Strategies ──────────────────────────────────────────────────────────

/// A tree over nodes `0..n` where node `i > 0` has a parent in `0..i`.
fn tree_strategy(max: usize) -> impl Strategy<Value = HashMap<u32, u32>> {
    (2..max).prop_flat_map(|n| {
        (1..n)
            .map(|i| (0..i as u32).prop_map(move |p| (i as u32, p)))
            .collect::<Vec<_>>()
            .prop_map(|edges: Vec<(u32, u32)>| edges.into_iter().collect::<HashMap<u32, u32>>())
    })
}

/// Hooks a node registers, as booleans.
#[derive(Debug, Clone, Copy)]
struct Wants {
    start: bool,
    start_capture: bool,
    moves: bool,
    move_capture: bool,
    scroll: bool,
    allow_termination: bool,
}

fn wants_strategy() -> impl Strategy<Value = Wants> {
    (
        any::<bool>(),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.3),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.7),
    )
        .prop_map(
            |(start, start_capture, moves, move_capture, scroll, allow_termination)| Wants {
                start,
                start_capture,
                moves,
                move_capture,
                scroll,
                allow_termination,
            },
        )
}

#[derive(Debug, Clone)]
enum Op {
    MouseStart(u32),
    MouseMove(u32),
    MouseEnd(u32),
    TouchStart(u32, u32),
    TouchMove(u32),
    TouchEnd(u32),
    Scroll(u32),
    ContextMenu(u32),
    WindowBlur,
    ForceTerminate,
}

const NODES: u32 = 8;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NODES).prop_map(Op::MouseStart),
        (0..NODES).prop_map(Op::MouseMove),
        (0..NODES).prop_map(Op::MouseEnd),
        (1..4_u32, 0..NODES).prop_map(|(id, n)| Op::TouchStart(id, n)),
        (1..4_u32).prop_map(Op::TouchMove),
        (1..4_u32).prop_map(Op::TouchEnd),
        (0..NODES).prop_map(Op::Scroll),
        (0..NODES).prop_map(Op::ContextMenu),
        Just(Op::WindowBlur),
        Just(Op::ForceTerminate),
    ]
}

// ── Model ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Model {
    active: Option<u32>,
    violations: Vec<String>,
}

type Shared = Rc<RefCell<Model>>;

fn predicate(on: bool) -> Option<Box<dyn FnMut(&mut ResponderEvent<'_, u32>) -> bool>> {
    on.then(|| Box::new(|_: &mut ResponderEvent<'_, u32>| true) as Box<_>)
}

fn config(node: u32, wants: Wants, model: &Shared) -> ResponderConfig<u32> {
    let grant = model.clone();
    let release = model.clone();
    let terminate = model.clone();
    ResponderConfig {
        wants_responder_on_start: predicate(wants.start),
        wants_responder_on_start_capture: predicate(wants.start_capture),
        wants_responder_on_move: predicate(wants.moves),
        wants_responder_on_move_capture: predicate(wants.move_capture),
        wants_responder_on_scroll: predicate(wants.scroll),
        on_grant: Some(Box::new(move |_: &ResponderEvent<'_, u32>| {
            let mut m = grant.borrow_mut();
            if let Some(other) = m.active {
                m.violations
                    .push(format!("grant {node} while {other} is active"));
            }
            m.active = Some(node);
        })),
        on_release: Some(Box::new(move |_: &ResponderEvent<'_, u32>| {
            let mut m = release.borrow_mut();
            let active = m.active;
            if active != Some(node) {
                m.violations
                    .push(format!("release {node} while {active:?} is active"));
            }
            m.active = None;
        })),
        on_terminate: Some(Box::new(move |_: &ResponderEvent<'_, u32>| {
            let mut m = terminate.borrow_mut();
            let active = m.active;
            if active != Some(node) {
                m.violations
                    .push(format!("terminate {node} while {active:?} is active"));
            }
            m.active = None;
        })),
        on_termination_request: (!wants.allow_termination)
            .then(|| Box::new(|_: &ResponderEvent<'_, u32>| false) as Box<_>),
        ..ResponderConfig::default()
    }
}

/// Drive the engine with an op, tracking held touches.
fn apply(
    sys: &mut ResponderSystem<u32, HashMap<u32, u32>>,
    down: &mut Vec<Touch<u32>>,
    op: &Op,
    t: u64,
) {
    let at = Point::new(t as f64, 0.0);
    match *op {
        Op::MouseStart(n) => {
            sys.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerStart, n, at, t));
        }
        Op::MouseMove(n) => {
            sys.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerMove, n, at, t));
        }
        Op::MouseEnd(n) => {
            sys.dispatch_native_event(&NativeEvent::mouse(NativeEventKind::PointerEnd, n, at, t));
        }
        Op::TouchStart(id, n) => {
            if down.iter().any(|d| d.identifier == id) {
                return;
            }
            let touch = Touch {
                identifier: id,
                position: at,
                timestamp: t,
                target: n,
            };
            down.push(touch);
            sys.dispatch_native_event(&NativeEvent::touch(
                NativeEventKind::PointerStart,
                down,
                &[touch],
                t,
            ));
        }
        Op::TouchMove(id) => {
            let Some(touch) = down.iter_mut().find(|d| d.identifier == id) else {
                return;
            };
            touch.position = at;
            touch.timestamp = t;
            let moved = *touch;
            sys.dispatch_native_event(&NativeEvent::touch(
                NativeEventKind::PointerMove,
                down,
                &[moved],
                t,
            ));
        }
        Op::TouchEnd(id) => {
            let Some(i) = down.iter().position(|d| d.identifier == id) else {
                return;
            };
            let ended = down.remove(i);
            sys.dispatch_native_event(&NativeEvent::touch(
                NativeEventKind::PointerEnd,
                down,
                &[ended],
                t,
            ));
        }
        Op::Scroll(n) => {
            sys.dispatch_native_event(&NativeEvent::scroll(EventTarget::Node(n), t));
        }
        Op::ContextMenu(n) => {
            sys.dispatch_native_event(&NativeEvent::context_menu(EventTarget::Node(n), t));
        }
        Op::WindowBlur => {
            sys.dispatch_native_event(&NativeEvent::blur(EventTarget::Window, None, t));
        }
        Op::ForceTerminate => sys.force_terminate_current_responder(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 1–2. Lowest common ancestor
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lca_is_deepest_shared_ancestor(
        tree in tree_strategy(24),
        a in 0_u32..24,
        b in 0_u32..24,
    ) {
        let n = tree.len() as u32 + 1;
        let (a, b) = (a % n, b % n);
        let pa = raw_event_path(a, &tree);
        let pb = raw_event_path(b, &tree);
        let lca = lowest_common_ancestor(&pa, &pb);
        prop_assert!(lca.is_some(), "single tree always shares the root");
        let lca = lca.unwrap();
        prop_assert!(contains(lca, a, &tree));
        prop_assert!(contains(lca, b, &tree));
        // The node just below the LCA on a's path is not an ancestor of b.
        let i = pa.iter().position(|x| *x == lca).unwrap();
        if i > 0 {
            prop_assert!(!contains(pa[i - 1], b, &tree));
        }
        prop_assert_eq!(lowest_common_ancestor(&pb, &pa), Some(lca));
    }

    #[test]
    fn lca_of_disjoint_trees_is_none(
        left in tree_strategy(12),
        right in tree_strategy(12),
        a in 0_u32..12,
        b in 0_u32..12,
    ) {
        // Shift the right tree so its keys never collide with the left one.
        const SHIFT: u32 = 100;
        let mut forest = left.clone();
        forest.extend(right.iter().map(|(c, p)| (c + SHIFT, p + SHIFT)));
        let a = a % (left.len() as u32 + 1);
        let b = b % (right.len() as u32 + 1) + SHIFT;
        let pa = raw_event_path(a, &forest);
        let pb = raw_event_path(b, &forest);
        prop_assert_eq!(lowest_common_ancestor(&pa, &pb), None);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 3–4. Single responder
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn at_most_one_responder_and_no_double_grant(
        tree in tree_strategy(NODES as usize + 1),
        wants in prop::collection::vec(wants_strategy(), NODES as usize),
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let model = Shared::default();
        let mut sys = ResponderSystem::with_hosts(tree.clone(), NoStyle);
        for (node, w) in wants.iter().enumerate() {
            let node = node as u32;
            if node <= tree.len() as u32 {
                sys.register_node(node, Some(config(node, *w, &model)));
            }
        }

        let n = tree.len() as u32 + 1;
        let mut down = Vec::new();
        for (t, op) in ops.iter().enumerate() {
            // Keep targets inside the generated tree.
            let op = match *op {
                Op::MouseStart(x) => Op::MouseStart(x % n),
                Op::MouseMove(x) => Op::MouseMove(x % n),
                Op::MouseEnd(x) => Op::MouseEnd(x % n),
                Op::TouchStart(id, x) => Op::TouchStart(id, x % n),
                Op::Scroll(x) => Op::Scroll(x % n),
                Op::ContextMenu(x) => Op::ContextMenu(x % n),
                ref other => other.clone(),
            };
            apply(&mut sys, &mut down, &op, t as u64 * 16);
            let m = model.borrow();
            prop_assert!(m.violations.is_empty(), "{:?}", m.violations);
            prop_assert_eq!(sys.current_responder(), m.active);
        }
    }
}
