//! Stealth Gallery - Gesture Recognition
//!
//! Three independent detectors, each turning a stream of sensor events into a
//! single [`Trigger`] when its pattern completes:
//!
//! - [`LongPress`] - hold the title for a fixed time
//! - [`ShakeDetector`] - a quick series of strong jolts
//! - [`MultiTouchTap`] - double tap with three fingers
//!
//! Every event carries its own timestamp; recognizers never read the clock.
//! The [`GestureHub`] owns all three and only lets events through while the
//! gallery is in decoy mode.

pub mod long_press;
pub mod multi_touch;
pub mod shake;

use serde::{Deserialize, Serialize};

use crate::config::GestureConfig;
use crate::error::GalleryError;
use crate::mode::AccessMode;

pub use long_press::{ContactEvent, LongPress};
pub use multi_touch::{MultiTouchTap, TouchDown};
pub use shake::{MotionSample, ShakeDetector};

/// Which recognizer fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    LongPress,
    Shake,
    MultiTouch,
}

/// Pattern completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub kind: GestureKind,
}

impl Trigger {
    pub fn new(kind: GestureKind) -> Self {
        Self { kind }
    }
}

/// The three recognizers, gated by access mode
pub struct GestureHub {
    long_press: LongPress,
    shake: ShakeDetector,
    multi_touch: MultiTouchTap,
    /// Recognizers whose sensor failed
    unavailable: Vec<GestureKind>,
    mode: AccessMode,
}

impl GestureHub {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            long_press: LongPress::from_config(config),
            shake: ShakeDetector::from_config(config),
            multi_touch: MultiTouchTap::from_config(config),
            unavailable: Vec::new(),
            mode: AccessMode::Decoy,
        }
    }

    /// Long press recognizer, for wiring presentation callbacks
    pub fn long_press_mut(&mut self) -> &mut LongPress {
        &mut self.long_press
    }

    /// Follow the current mode. Leaving decoy mode clears all progress.
    pub fn set_mode(&mut self, mode: AccessMode) {
        if mode != self.mode && mode == AccessMode::Real {
            self.long_press.reset();
            self.shake.reset();
            self.multi_touch.reset();
        }
        self.mode = mode;
    }

    /// Permanently disable one recognizer after its sensor failed
    pub fn sensor_failed(&mut self, kind: GestureKind, cause: &str) {
        if !self.unavailable.contains(&kind) {
            log::warn!("{:?} gesture disabled: {}", kind, cause);
            self.unavailable.push(kind);
        }
        match kind {
            GestureKind::LongPress => self.long_press.reset(),
            GestureKind::Shake => self.shake.reset(),
            GestureKind::MultiTouch => self.multi_touch.reset(),
        }
    }

    /// Fails with `SensorUnavailable` for a degraded recognizer
    pub fn check_available(&self, kind: GestureKind) -> Result<(), GalleryError> {
        if self.unavailable.contains(&kind) {
            Err(GalleryError::SensorUnavailable(kind))
        } else {
            Ok(())
        }
    }

    pub fn is_available(&self, kind: GestureKind) -> bool {
        self.check_available(kind).is_ok()
    }

    fn accepts(&self, kind: GestureKind) -> bool {
        self.mode == AccessMode::Decoy && self.is_available(kind)
    }

    pub fn on_contact(&mut self, event: ContactEvent) -> Option<Trigger> {
        if !self.accepts(GestureKind::LongPress) {
            return None;
        }
        self.long_press.feed(event)
    }

    pub fn on_motion(&mut self, sample: MotionSample) -> Option<Trigger> {
        if !self.accepts(GestureKind::Shake) {
            return None;
        }
        self.shake.feed(sample)
    }

    pub fn on_touch(&mut self, event: TouchDown) -> Option<Trigger> {
        if !self.accepts(GestureKind::MultiTouch) {
            return None;
        }
        self.multi_touch.feed(event)
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Fixed origin plus `ms` milliseconds
    pub fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::milliseconds(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_clock::at;

    fn jolt(ms: i64) -> MotionSample {
        MotionSample::new(at(ms), 30.0, 0.0, 0.0)
    }

    #[test]
    fn test_hub_ignores_gestures_in_real_mode() {
        let mut hub = GestureHub::new(&GestureConfig::default());
        hub.set_mode(AccessMode::Real);

        assert_eq!(hub.on_motion(jolt(0)), None);
        assert_eq!(hub.on_motion(jolt(300)), None);
        assert_eq!(hub.on_motion(jolt(600)), None);
        assert_eq!(hub.on_touch(TouchDown::new(at(0), 3)), None);
        assert_eq!(hub.on_touch(TouchDown::new(at(100), 3)), None);
    }

    #[test]
    fn test_entering_real_mode_clears_progress() {
        let mut hub = GestureHub::new(&GestureConfig::default());
        hub.on_motion(jolt(0));
        hub.on_motion(jolt(300));

        hub.set_mode(AccessMode::Real);
        hub.set_mode(AccessMode::Decoy);

        // Two stale impulses were dropped, so one more is not enough
        assert_eq!(hub.on_motion(jolt(600)), None);
    }

    #[test]
    fn test_failed_sensor_leaves_other_paths_working() {
        let mut hub = GestureHub::new(&GestureConfig::default());
        hub.sensor_failed(GestureKind::Shake, "permission denied");

        assert!(matches!(
            hub.check_available(GestureKind::Shake),
            Err(GalleryError::SensorUnavailable(GestureKind::Shake))
        ));
        for ms in [0, 300, 600, 900] {
            assert_eq!(hub.on_motion(jolt(ms)), None);
        }

        assert_eq!(hub.on_touch(TouchDown::new(at(0), 3)), None);
        assert_eq!(
            hub.on_touch(TouchDown::new(at(200), 3)),
            Some(Trigger::new(GestureKind::MultiTouch))
        );
    }
}
