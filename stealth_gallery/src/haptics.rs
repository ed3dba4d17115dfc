//! Stealth Gallery - Haptic Feedback
//!
//! Vibration patterns are sequences of millisecond durations, alternating
//! on/off. Delivery is fire-and-forget; the platform implementation lives
//! with the host.

use std::sync::Arc;
use parking_lot::Mutex;

/// Pulse when the vault opens
pub const UNLOCK_PATTERN: &[u64] = &[100, 50, 100];

/// Pulse when onboarding import completes
pub const IMPORT_DONE_PATTERN: &[u64] = &[100];

/// Pulse when a private item is stored
pub const PRIVATE_ADDED_PATTERN: &[u64] = &[50];

/// Vibration output
pub trait HapticSink: Send + Sync {
    /// Play a pattern. Failures are swallowed by the implementation.
    fn pulse(&self, pattern: &[u64]);
}

/// Device without a vibration motor
#[derive(Debug, Default)]
pub struct NoHaptics;

impl HapticSink for NoHaptics {
    fn pulse(&self, _pattern: &[u64]) {}
}

/// Writes patterns to the log instead of a motor
#[derive(Debug, Default)]
pub struct LogHaptics;

impl HapticSink for LogHaptics {
    fn pulse(&self, pattern: &[u64]) {
        log::debug!("haptic pulse {:?}", pattern);
    }
}

/// Records every pattern it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingHaptics {
    pulses: Arc<Mutex<Vec<Vec<u64>>>>,
}

impl RecordingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patterns received so far, oldest first
    pub fn pulses(&self) -> Vec<Vec<u64>> {
        self.pulses.lock().clone()
    }
}

impl HapticSink for RecordingHaptics {
    fn pulse(&self, pattern: &[u64]) {
        self.pulses.lock().push(pattern.to_vec());
    }
}
