//! Three-finger double tap.

use chrono::{DateTime, Duration, Utc};

use super::{GestureKind, Trigger};
use crate::config::GestureConfig;

/// Touch-down with the number of fingers currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchDown {
    pub at: DateTime<Utc>,
    pub contacts: u32,
}

impl TouchDown {
    pub fn new(at: DateTime<Utc>, contacts: u32) -> Self {
        Self { at, contacts }
    }
}

/// Multi-finger tap recognizer
#[derive(Debug, Clone)]
pub struct MultiTouchTap {
    contacts: u32,
    max_gap: Duration,
    required_taps: u32,
    taps: u32,
    last_tap: Option<DateTime<Utc>>,
}

impl MultiTouchTap {
    pub fn new(contacts: u32, max_gap: Duration, required_taps: u32) -> Self {
        Self {
            contacts,
            max_gap,
            required_taps: required_taps.max(1),
            taps: 0,
            last_tap: None,
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(
            config.multi_touch_contacts,
            Duration::milliseconds(config.multi_touch_window_ms as i64),
            config.multi_touch_taps,
        )
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }

    pub fn feed(&mut self, event: TouchDown) -> Option<Trigger> {
        if event.contacts != self.contacts {
            return None;
        }

        self.taps = match self.last_tap {
            Some(last) if event.at - last < self.max_gap => self.taps + 1,
            _ => 1,
        };
        self.last_tap = Some(event.at);

        if self.taps == self.required_taps {
            self.taps = 0;
            log::debug!("{}-finger tap x{}", self.contacts, self.required_taps);
            return Some(Trigger::new(GestureKind::MultiTouch));
        }

        None
    }

    pub fn reset(&mut self) {
        self.taps = 0;
        self.last_tap = None;
    }
}
