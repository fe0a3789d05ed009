// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Press rows inside a pannable list.
//!
//! This example shows how to combine:
//! - `understory_negotiation` for the responder lock over a small node tree,
//! - `understory_gestures::press` for taps and long presses on a row,
//! - `understory_gestures::pan` for a list that steals the gesture once a drag is clearly
//!   horizontal.
//!
//! Run:
//! - `cargo run -p understory_demos --example press_and_pan`

use hashbrown::HashMap;
use kurbo::Point;
use understory_gestures::pan::{PanConfig, PanResponder};
use understory_gestures::press::{PressConfig, PressResponder};
use understory_negotiation::event::{NativeEvent, NativeEventKind, Touch};
use understory_negotiation::system::ResponderSystem;
use understory_negotiation::types::{StyleHook, TouchAction};

const LIST: u32 = 1;
const ROW: u32 = 2;

/// Prints style mutations instead of applying them.
struct PrintStyle;

impl StyleHook<u32> for PrintStyle {
    fn set_touch_action(&mut self, node: &u32, action: TouchAction) {
        println!("  style: node {node} touch-action {action:?}");
    }
}

fn finger(kind: NativeEventKind, x: f64, timestamp: u64) -> NativeEvent<u32> {
    let touch = Touch {
        identifier: 7,
        position: Point::new(x, 10.0),
        timestamp,
        target: ROW,
    };
    let held = [touch];
    let touches: &[Touch<u32>] = match kind {
        NativeEventKind::PointerStart | NativeEventKind::PointerMove => &held,
        _ => &[],
    };
    NativeEvent::touch(kind, touches, &held, timestamp)
}

fn main() {
    // LIST
    // └── ROW
    let tree: HashMap<u32, u32> = [(ROW, LIST)].into_iter().collect();
    let mut system = ResponderSystem::with_hosts(tree, PrintStyle);

    let press = PressResponder::new(PressConfig {
        on_press_start: Some(Box::new(|e| println!("  row: press start {:?}", e.source))),
        on_press_end: Some(Box::new(|e| println!("  row: press end @{}", e.timestamp))),
        on_press: Some(Box::new(|_| println!("  row: PRESS"))),
        on_long_press: Some(Box::new(|e| println!("  row: LONG PRESS @{}", e.timestamp))),
        ..PressConfig::default()
    });
    system.register_node(ROW, Some(press.responder_config()));

    let pan = PanResponder::new(PanConfig {
        on_move_should_set_capture: Some(Box::new(|_, g| g.dx.abs() > 8.0)),
        on_grant: Some(Box::new(|_, g| println!("  list: pan grant x0={:.1}", g.x0))),
        on_move: Some(Box::new(|_, g| println!("  list: pan dx={:.1}", g.dx))),
        on_release: Some(Box::new(|_, g| {
            println!("  list: pan release dx={:.1} vx={:.3}", g.dx, g.vx);
        })),
        ..PanConfig::default()
    });
    let mut list = pan.responder_config();
    list.touch_action = Some(TouchAction::PanY);
    system.register_node(LIST, Some(list));

    println!("\n== Tap ==");
    system.dispatch_native_event(&finger(NativeEventKind::PointerStart, 10.0, 0));
    system.dispatch_native_event(&finger(NativeEventKind::PointerEnd, 10.0, 80));

    println!("\n== Drag: the list captures the move ==");
    for (kind, x, t) in [
        (NativeEventKind::PointerStart, 10.0, 2_000),
        (NativeEventKind::PointerMove, 14.0, 2_016),
        (NativeEventKind::PointerMove, 40.0, 2_032),
        (NativeEventKind::PointerMove, 60.0, 2_048),
        (NativeEventKind::PointerEnd, 60.0, 2_064),
    ] {
        system.dispatch_native_event(&finger(kind, x, t));
        println!("    responder: {:?}", system.current_responder());
    }

    println!("\n== Long press ==");
    system.dispatch_native_event(&finger(NativeEventKind::PointerStart, 10.0, 4_000));
    for now in [4_100, 4_300, 4_500, 4_600] {
        if press.poll(now) {
            println!("    long press fired at poll({now})");
        }
    }
    system.dispatch_native_event(&finger(NativeEventKind::PointerEnd, 10.0, 4_700));
}
