//! Stealth Gallery - Unified Public API
//!
//! Single entry point a host embeds. Sensor events go in, the visible media
//! set comes out; everything in between (gesture recognition, mode policy,
//! partition scoping, first-run import) is handled here.

use std::sync::Arc;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use uuid::Uuid;

use crate::config::GalleryConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::gesture::{
    ContactEvent, GestureHub, GestureKind, LongPress, MotionSample, TouchDown, Trigger,
};
use crate::haptics::{HapticSink, IMPORT_DONE_PATTERN, PRIVATE_ADDED_PATTERN};
use crate::media::{decoy_placeholders, MediaRecord, Partition};
use crate::mode::{AccessMode, Lifecycle, ModeEvent, ModeMachine};
use crate::onboarding::{
    mark_onboarded, onboarding_status, BulkImport, ConsentPrompt, ImportObserver, MediaCandidate,
    MediaSource, OnboardingStatus, SkippedCandidate,
};
use crate::store::{BatchReport, FlagStore, MediaStore, RecordStore, SqliteRecordStore};

/// How a call to `run_onboarding` ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OnboardingOutcome {
    AlreadyDone,
    Declined,
    NothingSelected,
    /// Another onboarding import is still running
    InProgress,
    Imported {
        report: BatchReport,
        skipped: Vec<SkippedCandidate>,
    },
}

/// Snapshot for status displays. Never reveals private counts.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryStatus {
    pub mode: AccessMode,
    pub importing: bool,
    pub onboarding: OnboardingStatus,
    pub public_count: usize,
}

/// Stealth Gallery API
///
/// ```rust,ignore
/// use stealth_gallery::api::StealthGallery;
///
/// let gallery = StealthGallery::open(GalleryConfig::default(), Arc::new(LogHaptics))?;
///
/// // Decoy view
/// let photos = gallery.visible_media();
///
/// // Accelerometer callback
/// gallery.on_motion(MotionSample::new(Utc::now(), x, y, z));
///
/// // App went to background
/// gallery.on_lifecycle(Lifecycle::Hidden);
/// ```
pub struct StealthGallery {
    config: GalleryConfig,
    store: MediaStore,
    flags: Arc<dyn FlagStore>,
    machine: RwLock<ModeMachine>,
    gestures: Mutex<GestureHub>,
    haptics: Arc<dyn HapticSink>,
}

impl StealthGallery {
    // ═══════════════════════════════════════════════════════════════════════
    // INITIALIZATION
    // ═══════════════════════════════════════════════════════════════════════

    /// Open the SQLite store named in the config
    pub fn open(config: GalleryConfig, haptics: Arc<dyn HapticSink>) -> GalleryResult<Self> {
        let backend = Arc::new(SqliteRecordStore::open(&config.db_path)?);
        Ok(Self::with_backend(backend, config, haptics))
    }

    /// Use any store that keeps both records and flags
    pub fn with_backend<B>(backend: Arc<B>, config: GalleryConfig, haptics: Arc<dyn HapticSink>) -> Self
    where
        B: RecordStore + FlagStore + 'static,
    {
        let records: Arc<dyn RecordStore> = backend.clone();
        let flags: Arc<dyn FlagStore> = backend;

        Self {
            store: MediaStore::new(records),
            flags,
            machine: RwLock::new(ModeMachine::new(Arc::clone(&haptics))),
            gestures: Mutex::new(GestureHub::new(&config.gestures)),
            haptics,
            config,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MODE
    // ═══════════════════════════════════════════════════════════════════════

    pub fn mode(&self) -> AccessMode {
        self.machine.read().mode()
    }

    pub fn is_importing(&self) -> bool {
        self.machine.read().is_importing()
    }

    /// Explicit lock button
    pub fn lock(&self) {
        self.dispatch(ModeEvent::Lock);
    }

    /// Host visibility/focus change
    pub fn on_lifecycle(&self, signal: Lifecycle) {
        self.dispatch(ModeEvent::Lifecycle(signal));
    }

    /// Returns whether the access mode changed
    fn dispatch(&self, event: ModeEvent) -> bool {
        let (before, after) = {
            let mut machine = self.machine.write();
            let before = machine.mode();
            machine.apply(event);
            (before, machine.mode())
        };
        self.gestures.lock().set_mode(after);
        before != after
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SENSOR INPUT
    // ═══════════════════════════════════════════════════════════════════════

    pub fn on_contact(&self, event: ContactEvent) -> Option<Trigger> {
        let trigger = self.gestures.lock().on_contact(event);
        self.fire(trigger)
    }

    pub fn on_motion(&self, sample: MotionSample) -> Option<Trigger> {
        let trigger = self.gestures.lock().on_motion(sample);
        self.fire(trigger)
    }

    pub fn on_touch(&self, event: TouchDown) -> Option<Trigger> {
        let trigger = self.gestures.lock().on_touch(event);
        self.fire(trigger)
    }

    /// A sensor adapter could not start; the other gestures keep working
    pub fn sensor_failed(&self, kind: GestureKind, cause: &str) {
        self.gestures.lock().sensor_failed(kind, cause);
    }

    /// Wire presentation feedback for the long press
    pub fn with_long_press<R>(&self, f: impl FnOnce(&mut LongPress) -> R) -> R {
        f(self.gestures.lock().long_press_mut())
    }

    /// Only a trigger that actually unlocked is reported
    fn fire(&self, trigger: Option<Trigger>) -> Option<Trigger> {
        let trigger = trigger?;
        self.dispatch(ModeEvent::Trigger(trigger.kind)).then_some(trigger)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // MEDIA
    // ═══════════════════════════════════════════════════════════════════════

    /// What the grid shows right now
    pub fn visible_media(&self) -> Vec<MediaRecord> {
        match self.mode() {
            AccessMode::Real => self.store.list(Partition::Private),
            AccessMode::Decoy => {
                let public = self.store.list(Partition::Public);
                if public.is_empty() {
                    decoy_placeholders()
                } else {
                    public
                }
            }
        }
    }

    /// Record currently shown full-screen
    pub fn viewer(&self) -> Option<String> {
        self.machine.read().viewer().map(str::to_string)
    }

    /// Show a visible record full-screen
    pub fn open_viewer(&self, id: &str) -> GalleryResult<()> {
        if !self.visible_media().iter().any(|r| r.id == id) {
            return Err(GalleryError::NotFound(id.to_string()));
        }
        self.dispatch(ModeEvent::OpenViewer(id.to_string()));
        Ok(())
    }

    pub fn close_viewer(&self) {
        self.dispatch(ModeEvent::CloseViewer);
    }

    /// Store a new private photo. Real mode only.
    pub fn add_private(&self, candidate: &MediaCandidate) -> GalleryResult<MediaRecord> {
        if self.mode() != AccessMode::Real {
            return Err(GalleryError::Locked);
        }

        let record = MediaRecord {
            id: Uuid::new_v4().to_string(),
            content: candidate.decode()?,
            captured_at: Utc::now(),
            is_private: true,
        };

        self.store.add(record.clone())?;
        self.haptics.pulse(PRIVATE_ADDED_PATTERN);
        Ok(record)
    }

    /// Permanently remove a private photo and close the viewer
    pub fn delete(&self, id: &str) -> GalleryResult<()> {
        self.store.delete(self.mode(), id)?;
        self.dispatch(ModeEvent::CloseViewer);
        Ok(())
    }

    pub fn status(&self) -> GalleryStatus {
        let state = self.machine.read().state().clone();
        GalleryStatus {
            mode: state.mode,
            importing: state.importing,
            onboarding: onboarding_status(self.flags.as_ref()),
            public_count: self.store.count(Partition::Public),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ONBOARDING
    // ═══════════════════════════════════════════════════════════════════════

    pub fn needs_onboarding(&self) -> bool {
        onboarding_status(self.flags.as_ref()) == OnboardingStatus::Unset
    }

    /// First-run flow: consent, folder pick, import as public media.
    ///
    /// While the import runs, losing focus does not lock the gallery.
    pub async fn run_onboarding(
        &self,
        prompt: &dyn ConsentPrompt,
        source: &dyn MediaSource,
        observer: &mut dyn ImportObserver,
    ) -> GalleryResult<OnboardingOutcome> {
        if self.is_importing() {
            return Ok(OnboardingOutcome::InProgress);
        }
        if !self.needs_onboarding() {
            return Ok(OnboardingOutcome::AlreadyDone);
        }

        if !prompt.ask() {
            log::info!("Media access declined");
            return Ok(OnboardingOutcome::Declined);
        }

        let selection = match source.select()? {
            Some(selection) if !selection.is_empty() => selection,
            _ => return Ok(OnboardingOutcome::NothingSelected),
        };

        let import = BulkImport::new(selection, &self.config.import, Utc::now());
        if import.total() == 0 {
            return Ok(OnboardingOutcome::NothingSelected);
        }

        let _guard = match self.begin_import() {
            Some(guard) => guard,
            None => return Ok(OnboardingOutcome::InProgress),
        };

        let outcome = import.run(observer).await;
        let report = self.store.add_batch(outcome.records);

        if report.stored.is_empty() {
            log::warn!("Onboarding stored nothing; will ask again next start");
        } else {
            if let Err(e) = mark_onboarded(self.flags.as_ref()) {
                log::error!("Saving onboarding flag failed, discarding import: {}", e);
                self.store.rollback(&report.stored);
                return Err(e);
            }
            self.haptics.pulse(IMPORT_DONE_PATTERN);
            log::info!("Onboarding imported {} items", report.stored.len());
        }

        Ok(OnboardingOutcome::Imported {
            report,
            skipped: outcome.skipped,
        })
    }

    /// Set the import flag unless an import already holds it
    fn begin_import(&self) -> Option<ImportGuard<'_>> {
        let mut machine = self.machine.write();
        if machine.is_importing() {
            return None;
        }
        machine.apply(ModeEvent::ImportStarted);
        Some(ImportGuard { gallery: self })
    }
}

/// Clears the import flag however the import ends
struct ImportGuard<'a> {
    gallery: &'a StealthGallery,
}

impl Drop for ImportGuard<'_> {
    fn drop(&mut self) {
        self.gallery.dispatch(ModeEvent::ImportFinished);
    }
}
