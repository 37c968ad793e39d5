use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fh_core::{DigitalOutput, NullSink, PinId};
use fh_valve::{MotionState, ValveActuator, ValveConfig};
use proptest::prelude::*;

/// Tracks line levels and remembers whether both lines were ever high.
#[derive(Clone, Default)]
struct Lines(Arc<Mutex<(HashMap<u8, bool>, bool)>>);

impl DigitalOutput for Lines {
    fn set(&mut self, pin: PinId, high: bool) {
        let mut guard = self.0.lock().unwrap();
        guard.0.insert(pin.0, high);
        let both = guard.0.values().filter(|&&level| level).count() > 1;
        guard.1 |= both;
    }
}

impl Lines {
    fn conflict_seen(&self) -> bool {
        self.0.lock().unwrap().1
    }
}

const T: u32 = 3;

fn valve(lines: &Lines) -> ValveActuator {
    let config = ValveConfig {
        ticks_per_percent: T,
        ..Default::default()
    };
    ValveActuator::new(&config, Box::new(lines.clone()), Arc::new(NullSink)).unwrap()
}

#[test]
fn settles_on_every_requested_target() {
    let lines = Lines::default();
    let mut valve = valve(&lines);
    let handle = valve.handle();
    for target in [35, 100, 70, 0, 5, 100, 99] {
        handle.set_target(target);
        for _ in 0..110 * T {
            valve.step();
        }
        assert_eq!(valve.current(), target);
        assert_eq!(valve.motion(), MotionState::Holding);
    }
    assert!(!lines.conflict_seen());
}

proptest! {
    #[test]
    fn position_stays_in_range_and_lines_never_conflict(
        moves in prop::collection::vec((0_u8..=100, 0_u32..400), 1..30),
    ) {
        let lines = Lines::default();
        let mut valve = valve(&lines);
        let handle = valve.handle();
        for (target, ticks) in moves {
            handle.set_target(target);
            for _ in 0..ticks {
                valve.step();
                prop_assert!(valve.current() <= 100);
            }
        }
        prop_assert!(!lines.conflict_seen());
    }
}
