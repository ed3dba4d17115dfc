//! Triple shake from the accelerometer stream.

use chrono::{DateTime, Duration, Utc};

use super::{GestureKind, Trigger};
use crate::config::GestureConfig;

/// One accelerometer reading, gravity included
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub at: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionSample {
    pub fn new(at: DateTime<Utc>, x: f64, y: f64, z: f64) -> Self {
        Self { at, x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Shake recognizer
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    threshold: f64,
    cooldown: Duration,
    sequence_timeout: Duration,
    required: u32,
    count: u32,
    /// Last counted impulse
    last_impulse: Option<DateTime<Utc>>,
}

impl ShakeDetector {
    pub fn new(threshold: f64, cooldown: Duration, sequence_timeout: Duration, required: u32) -> Self {
        Self {
            threshold,
            cooldown,
            sequence_timeout,
            required: required.max(1),
            count: 0,
            last_impulse: None,
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(
            config.shake_threshold,
            Duration::milliseconds(config.shake_cooldown_ms as i64),
            Duration::milliseconds(config.shake_sequence_timeout_ms as i64),
            config.shake_required,
        )
    }

    /// Impulses counted toward the current sequence
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn feed(&mut self, sample: MotionSample) -> Option<Trigger> {
        if !sample.magnitude().is_finite() || sample.magnitude() <= self.threshold {
            return None;
        }

        if let Some(last) = self.last_impulse {
            let gap = sample.at - last;
            if gap <= self.cooldown {
                return None;
            }
            if gap > self.sequence_timeout {
                self.count = 0;
            }
        }

        self.count += 1;
        self.last_impulse = Some(sample.at);
        log::debug!("shake impulse {}/{}", self.count, self.required);

        if self.count >= self.required {
            self.count = 0;
            return Some(Trigger::new(GestureKind::Shake));
        }

        None
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_impulse = None;
    }
}
