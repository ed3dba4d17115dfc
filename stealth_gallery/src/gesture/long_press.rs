//! Sustained contact on the gallery title.

use chrono::{DateTime, Duration, Utc};

use super::{GestureKind, Trigger};
use crate::config::GestureConfig;

/// Pointer or touch event on the press target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactEvent {
    Start(DateTime<Utc>),
    End(DateTime<Utc>),
    /// Pointer left the target
    Leave(DateTime<Utc>),
    /// Finger dragged
    Move(DateTime<Utc>),
    /// Timer poll from the host event loop
    Tick(DateTime<Utc>),
}

impl ContactEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match *self {
            ContactEvent::Start(t)
            | ContactEvent::End(t)
            | ContactEvent::Leave(t)
            | ContactEvent::Move(t)
            | ContactEvent::Tick(t) => t,
        }
    }
}

type Callback = Box<dyn FnMut() + Send>;

/// Long press recognizer
pub struct LongPress {
    threshold: Duration,
    /// When the current press began
    pressed_at: Option<DateTime<Utc>>,
    on_start: Option<Callback>,
    on_finish: Option<Callback>,
    on_cancel: Option<Callback>,
}

impl LongPress {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            pressed_at: None,
            on_start: None,
            on_finish: None,
            on_cancel: None,
        }
    }

    pub fn from_config(config: &GestureConfig) -> Self {
        Self::new(Duration::milliseconds(config.long_press_ms as i64))
    }

    /// Called when a press begins
    pub fn on_start(&mut self, f: impl FnMut() + Send + 'static) -> &mut Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Called when a press completes
    pub fn on_finish(&mut self, f: impl FnMut() + Send + 'static) -> &mut Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    /// Called when an in-progress press is abandoned
    pub fn on_cancel(&mut self, f: impl FnMut() + Send + 'static) -> &mut Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    pub fn is_pressing(&self) -> bool {
        self.pressed_at.is_some()
    }

    /// When the running press completes, if one is running
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pressed_at.map(|t| t + self.threshold)
    }

    pub fn feed(&mut self, event: ContactEvent) -> Option<Trigger> {
        // The timer runs out before any later event is handled
        if let Some(deadline) = self.deadline() {
            if event.at() >= deadline {
                self.pressed_at = None;
                if let Some(f) = self.on_finish.as_mut() {
                    f();
                }
                log::debug!("long press held past {}ms", self.threshold.num_milliseconds());
                return Some(Trigger::new(GestureKind::LongPress));
            }
        }

        match event {
            ContactEvent::Start(at) => {
                if self.pressed_at.is_none() {
                    self.pressed_at = Some(at);
                    if let Some(f) = self.on_start.as_mut() {
                        f();
                    }
                }
            }
            ContactEvent::End(_) | ContactEvent::Leave(_) | ContactEvent::Move(_) => self.cancel(),
            ContactEvent::Tick(_) => {}
        }

        None
    }

    pub fn reset(&mut self) {
        self.pressed_at = None;
    }

    fn cancel(&mut self) {
        if self.pressed_at.take().is_some() {
            if let Some(f) = self.on_cancel.as_mut() {
                f();
            }
        }
    }
}
