//! Stealth Gallery - Access Mode State Machine
//!
//! The gallery is either showing the decoy (public) partition or the real
//! (private) one. All changes go through [`transition`], a pure function of
//! the current state and one event; [`ModeMachine`] owns the state and plays
//! the resulting side effects.

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::gesture::GestureKind;
use crate::haptics::{HapticSink, UNLOCK_PATTERN};

/// Which partition the gallery shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccessMode {
    #[default]
    Decoy,
    Real,
}

/// Host lifecycle signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// App moved to the background
    Hidden,
    /// Window lost focus
    Blurred,
    /// App is visible again
    Visible,
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    Trigger(GestureKind),
    /// Explicit lock button
    Lock,
    Lifecycle(Lifecycle),
    ImportStarted,
    ImportFinished,
    OpenViewer(String),
    CloseViewer,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Haptic(&'static [u64]),
    ViewerCleared,
}

/// Everything the machine tracks
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeState {
    pub mode: AccessMode,
    pub importing: bool,
    /// Record shown full-screen
    pub viewer: Option<String>,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ModeState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &ModeState) -> Self {
        Self { state: state.clone(), effects: Vec::new() }
    }
}

/// Pure transition function
pub fn transition(state: &ModeState, event: ModeEvent) -> Transition {
    match event {
        ModeEvent::Trigger(_) => {
            if state.mode == AccessMode::Real || state.importing {
                return Transition::unchanged(state);
            }
            Transition {
                state: ModeState { mode: AccessMode::Real, ..state.clone() },
                effects: vec![Effect::Haptic(UNLOCK_PATTERN)],
            }
        }

        ModeEvent::Lock => lock(state),

        ModeEvent::Lifecycle(Lifecycle::Hidden) => lock(state),

        ModeEvent::Lifecycle(Lifecycle::Blurred) => {
            if state.importing {
                Transition::unchanged(state)
            } else {
                lock(state)
            }
        }

        ModeEvent::Lifecycle(Lifecycle::Visible) => Transition::unchanged(state),

        ModeEvent::ImportStarted => Transition {
            state: ModeState { importing: true, ..state.clone() },
            effects: Vec::new(),
        },

        ModeEvent::ImportFinished => Transition {
            state: ModeState { importing: false, ..state.clone() },
            effects: Vec::new(),
        },

        ModeEvent::OpenViewer(id) => Transition {
            state: ModeState { viewer: Some(id), ..state.clone() },
            effects: Vec::new(),
        },

        ModeEvent::CloseViewer => Transition {
            state: ModeState { viewer: None, ..state.clone() },
            effects: Vec::new(),
        },
    }
}

fn lock(state: &ModeState) -> Transition {
    if state.mode == AccessMode::Decoy {
        return Transition::unchanged(state);
    }

    let mut effects = Vec::new();
    if state.viewer.is_some() {
        effects.push(Effect::ViewerCleared);
    }

    Transition {
        state: ModeState { mode: AccessMode::Decoy, viewer: None, ..state.clone() },
        effects,
    }
}

/// Owns the mode state and plays effects
pub struct ModeMachine {
    state: ModeState,
    haptics: Arc<dyn HapticSink>,
}

impl ModeMachine {
    /// Every session starts in decoy mode
    pub fn new(haptics: Arc<dyn HapticSink>) -> Self {
        Self {
            state: ModeState::default(),
            haptics,
        }
    }

    pub fn mode(&self) -> AccessMode {
        self.state.mode
    }

    pub fn state(&self) -> &ModeState {
        &self.state
    }

    pub fn is_importing(&self) -> bool {
        self.state.importing
    }

    pub fn viewer(&self) -> Option<&str> {
        self.state.viewer.as_deref()
    }

    /// Apply one event and return the effects that were played
    pub fn apply(&mut self, event: ModeEvent) -> Vec<Effect> {
        let before = self.state.mode;
        let Transition { state, effects } = transition(&self.state, event);
        self.state = state;

        if before != self.state.mode {
            log::info!("access mode {:?} -> {:?}", before, self.state.mode);
        }

        for effect in &effects {
            if let Effect::Haptic(pattern) = effect {
                self.haptics.pulse(pattern);
            }
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haptics::RecordingHaptics;

    fn machine() -> (ModeMachine, RecordingHaptics) {
        let haptics = RecordingHaptics::new();
        (ModeMachine::new(Arc::new(haptics.clone())), haptics)
    }

    fn real_with_viewer() -> ModeState {
        ModeState {
            mode: AccessMode::Real,
            importing: false,
            viewer: Some("p1".into()),
        }
    }

    #[test]
    fn test_starts_in_decoy() {
        let (m, _) = machine();
        assert_eq!(m.mode(), AccessMode::Decoy);
        assert!(!m.is_importing());
        assert_eq!(m.viewer(), None);
    }

    #[test]
    fn test_trigger_unlocks_with_pulse() {
        let (mut m, haptics) = machine();
        let effects = m.apply(ModeEvent::Trigger(GestureKind::Shake));

        assert_eq!(m.mode(), AccessMode::Real);
        assert_eq!(effects, vec![Effect::Haptic(UNLOCK_PATTERN)]);
        assert_eq!(haptics.pulses(), vec![vec![100, 50, 100]]);
    }

    #[test]
    fn test_repeated_trigger_is_noop() {
        let state = real_with_viewer();
        let t = transition(&state, ModeEvent::Trigger(GestureKind::LongPress));
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_lock_clears_viewer() {
        let t = transition(&real_with_viewer(), ModeEvent::Lock);
        assert_eq!(t.state.mode, AccessMode::Decoy);
        assert_eq!(t.state.viewer, None);
        assert_eq!(t.effects, vec![Effect::ViewerCleared]);
    }

    #[test]
    fn test_lock_in_decoy_is_noop() {
        let state = ModeState { viewer: Some("d1".into()), ..ModeState::default() };
        let t = transition(&state, ModeEvent::Lock);
        assert_eq!(t.state, state);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_blur_locks_without_import() {
        for signal in [Lifecycle::Blurred, Lifecycle::Hidden] {
            let t = transition(&real_with_viewer(), ModeEvent::Lifecycle(signal));
            assert_eq!(t.state.mode, AccessMode::Decoy);
            assert_eq!(t.state.viewer, None);
        }
    }

    #[test]
    fn test_blur_during_import_keeps_real() {
        let state = ModeState { importing: true, ..real_with_viewer() };
        let t = transition(&state, ModeEvent::Lifecycle(Lifecycle::Blurred));
        assert_eq!(t.state, state);

        // Explicit lock still wins
        let t = transition(&state, ModeEvent::Lock);
        assert_eq!(t.state.mode, AccessMode::Decoy);
        assert!(t.state.importing);
    }

    #[test]
    fn test_background_during_import_locks() {
        let state = ModeState { importing: true, ..real_with_viewer() };
        let t = transition(&state, ModeEvent::Lifecycle(Lifecycle::Hidden));
        assert_eq!(t.state.mode, AccessMode::Decoy);
        assert_eq!(t.state.viewer, None);
        assert!(t.state.importing);
        assert_eq!(t.effects, vec![Effect::ViewerCleared]);
    }

    #[test]
    fn test_trigger_ignored_during_import() {
        let (mut m, haptics) = machine();
        m.apply(ModeEvent::ImportStarted);
        m.apply(ModeEvent::Trigger(GestureKind::MultiTouch));
        assert_eq!(m.mode(), AccessMode::Decoy);

        m.apply(ModeEvent::ImportFinished);
        m.apply(ModeEvent::Trigger(GestureKind::MultiTouch));
        assert_eq!(m.mode(), AccessMode::Real);
        assert_eq!(haptics.pulses().len(), 1);
    }

    #[test]
    fn test_visible_never_restores_real() {
        let (mut m, _) = machine();
        m.apply(ModeEvent::Trigger(GestureKind::Shake));
        m.apply(ModeEvent::Lifecycle(Lifecycle::Hidden));
        m.apply(ModeEvent::Lifecycle(Lifecycle::Visible));
        assert_eq!(m.mode(), AccessMode::Decoy);
    }

    #[test]
    fn test_viewer_tracking() {
        let (mut m, _) = machine();
        m.apply(ModeEvent::OpenViewer("d2".into()));
        assert_eq!(m.viewer(), Some("d2"));
        m.apply(ModeEvent::CloseViewer);
        assert_eq!(m.viewer(), None);
    }
}
