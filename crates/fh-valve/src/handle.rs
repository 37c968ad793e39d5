//! Cross-cadence access to the valve target.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use fh_core::{PropertyId, PropertySink, PropertyValue};
use tracing::{debug, info, warn};

/// Marks "no target requested yet".
const UNSET: u8 = u8::MAX;

/// Cloneable handle for requesting valve positions.
///
/// The target is a single atomic byte, so the tick loop always sees either
/// the old or the new value. The handle never moves the motor itself.
#[derive(Clone)]
pub struct ValveHandle {
    target: Arc<AtomicU8>,
    calibrating: Arc<AtomicBool>,
    sink: Arc<dyn PropertySink>,
}

impl ValveHandle {
    pub(crate) fn new(sink: Arc<dyn PropertySink>) -> Self {
        Self {
            target: Arc::new(AtomicU8::new(UNSET)),
            calibrating: Arc::new(AtomicBool::new(false)),
            sink,
        }
    }

    /// Request position `target` (percent open).
    ///
    /// Values above 100 and repeats of the last request are ignored and
    /// return `false`. An accepted target is published as `valveTarget`.
    pub fn set_target(&self, target: u8) -> bool {
        if target > 100 {
            warn!(requested = target, "rejected valve target");
            return false;
        }
        if self.target.swap(target, Ordering::AcqRel) == target {
            debug!(requested = target, "valve target unchanged");
            return false;
        }
        info!(requested = target, "valve target");
        self.sink.publish(
            PropertyId::ValveTarget,
            PropertyValue::Integer(i64::from(target)),
        );
        true
    }

    /// Last requested target, `None` before the first request.
    pub fn target(&self) -> Option<u8> {
        match self.target.load(Ordering::Acquire) {
            UNSET => None,
            target => Some(target),
        }
    }

    /// Whether a full-close calibration is running.
    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Acquire)
    }

    pub(crate) fn set_calibrating(&self, calibrating: bool) {
        self.calibrating.store(calibrating, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(PropertyId, PropertyValue)>>);

    impl PropertySink for Recorder {
        fn publish(&self, id: PropertyId, value: PropertyValue) {
            self.0.lock().unwrap().push((id, value));
        }
    }

    #[test]
    fn duplicate_target_is_a_no_op() {
        let sink = Arc::new(Recorder::default());
        let handle = ValveHandle::new(sink.clone());
        assert_eq!(handle.target(), None);
        assert!(handle.set_target(40));
        assert!(!handle.set_target(40));
        assert_eq!(handle.target(), Some(40));
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![(PropertyId::ValveTarget, PropertyValue::Integer(40))]
        );
    }

    #[test]
    fn out_of_range_target_is_ignored() {
        let handle = ValveHandle::new(Arc::new(fh_core::NullSink));
        assert!(handle.set_target(0));
        assert!(!handle.set_target(101));
        assert!(!handle.set_target(UNSET));
        assert_eq!(handle.target(), Some(0));
    }

    #[test]
    fn clones_share_target() {
        let handle = ValveHandle::new(Arc::new(fh_core::NullSink));
        let other = handle.clone();
        std::thread::spawn(move || other.set_target(75))
            .join()
            .unwrap();
        assert_eq!(handle.target(), Some(75));
    }
}
