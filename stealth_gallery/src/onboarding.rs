//! Stealth Gallery - Onboarding Import
//!
//! On first run the gallery asks for media access, lets the user pick the
//! device's camera folder and imports it as the public partition, so the
//! decoy view looks like a normal phone gallery.
//!
//! The import is a cooperative task: [`BulkImport::step`] decodes exactly one
//! candidate, and [`BulkImport::run`] yields to the scheduler between steps.
//! Nothing is written until every candidate has been processed.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::ImportConfig;
use crate::error::{GalleryError, GalleryResult};
use crate::media::{MediaContent, MediaRecord};
use crate::store::FlagStore;

/// Persisted key recording that onboarding completed
pub const ONBOARDING_FLAG: &str = "stealth_gallery_permission";

const GRANTED: &str = "granted";

/// Whether the first-run import has happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OnboardingStatus {
    Unset,
    Granted,
}

/// Read the flag. An unreadable flag counts as unset.
pub fn onboarding_status(flags: &dyn FlagStore) -> OnboardingStatus {
    match flags.flag(ONBOARDING_FLAG) {
        Ok(Some(value)) if value == GRANTED => OnboardingStatus::Granted,
        Ok(_) => OnboardingStatus::Unset,
        Err(e) => {
            log::warn!("Could not read onboarding flag: {}", e);
            OnboardingStatus::Unset
        }
    }
}

pub fn mark_onboarded(flags: &dyn FlagStore) -> GalleryResult<()> {
    flags.set_flag(ONBOARDING_FLAG, GRANTED)
}

// ═══════════════════════════════════════════════════════════════════════════
// HOST COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════

/// "Allow access to photos?" dialog
pub trait ConsentPrompt {
    fn ask(&self) -> bool;
}

impl<F: Fn() -> bool> ConsentPrompt for F {
    fn ask(&self) -> bool {
        self()
    }
}

/// Device folder picker. `None` means the user backed out.
pub trait MediaSource {
    fn select(&self) -> GalleryResult<Option<Vec<MediaCandidate>>>;
}

/// Receives import progress in percent
pub trait ImportObserver {
    fn on_progress(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ImportObserver for F {
    fn on_progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Where a candidate's bytes live
#[derive(Debug, Clone)]
pub enum CandidateData {
    Bytes(Vec<u8>),
    /// Read lazily when the candidate is decoded
    File(PathBuf),
}

/// One file handed over by the picker
#[derive(Debug, Clone)]
pub struct MediaCandidate {
    pub name: String,
    pub mime_type: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub data: CandidateData,
}

impl MediaCandidate {
    pub fn from_bytes(name: &str, mime_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            last_modified: None,
            data: CandidateData::Bytes(bytes),
        }
    }

    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Read and probe the image; returns content ready to store
    pub fn decode(&self) -> GalleryResult<MediaContent> {
        let bytes = match &self.data {
            CandidateData::Bytes(bytes) => bytes.clone(),
            CandidateData::File(path) => std::fs::read(path)
                .map_err(|e| GalleryError::DecodeFault(format!("{}: {}", self.name, e)))?,
        };

        probe_image(&bytes).map(|mime_type| MediaContent::Inline { bytes, mime_type })
    }
}

/// Check that `bytes` hold a readable image header and return its mime type
pub fn probe_image(bytes: &[u8]) -> GalleryResult<String> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| GalleryError::DecodeFault(e.to_string()))?;

    let format = reader
        .format()
        .ok_or_else(|| GalleryError::DecodeFault("unrecognized image format".into()))?;

    reader.into_dimensions()?;
    Ok(format.to_mime_type().to_string())
}

/// Picks every file under a directory, sorted by name
pub struct FolderSource {
    root: PathBuf,
}

impl FolderSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl MediaSource for FolderSource {
    fn select(&self) -> GalleryResult<Option<Vec<MediaCandidate>>> {
        if !self.root.is_dir() {
            log::warn!("Media folder {} not found", self.root.display());
            return Ok(None);
        }

        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let mime_type = image::ImageFormat::from_path(path)
                .map(|f| f.to_mime_type().to_string())
                .unwrap_or_else(|_| "application/octet-stream".into());

            let last_modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from);

            candidates.push(MediaCandidate {
                name: entry.file_name().to_string_lossy().to_string(),
                mime_type,
                last_modified,
                data: CandidateData::File(path.to_path_buf()),
            });
        }

        Ok(Some(candidates))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BULK IMPORT TASK
// ═══════════════════════════════════════════════════════════════════════════

/// Candidate left out of the import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    pub name: String,
    pub reason: String,
}

/// Decoded records ready for `add_batch`
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub records: Vec<MediaRecord>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Cooperative decode of a selection into public records
pub struct BulkImport {
    candidates: Vec<MediaCandidate>,
    next: usize,
    started_at: DateTime<Utc>,
    records: Vec<MediaRecord>,
    skipped: Vec<SkippedCandidate>,
}

impl BulkImport {
    /// Keep image candidates only, first come, up to the configured cap
    pub fn new(selection: Vec<MediaCandidate>, config: &ImportConfig, started_at: DateTime<Utc>) -> Self {
        let candidates: Vec<MediaCandidate> = selection
            .into_iter()
            .filter(MediaCandidate::is_image)
            .take(config.max_items)
            .collect();

        log::info!("Import of {} candidates queued", candidates.len());

        Self {
            records: Vec::with_capacity(candidates.len()),
            candidates,
            next: 0,
            started_at,
            skipped: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.candidates.len()
    }

    /// Decode one candidate and return progress in percent, or `None` when
    /// there is nothing left.
    pub fn step(&mut self) -> Option<u8> {
        let index = self.next;
        let candidate = self.candidates.get(index)?;
        self.next += 1;

        match candidate.decode() {
            Ok(content) => {
                let captured_at = candidate
                    .last_modified
                    .unwrap_or(self.started_at - Duration::milliseconds(index as i64));

                self.records.push(MediaRecord {
                    id: format!("pub_{}_{}", self.started_at.timestamp_millis(), index),
                    content,
                    captured_at,
                    is_private: false,
                });
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", candidate.name, e);
                self.skipped.push(SkippedCandidate {
                    name: candidate.name.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let total = self.candidates.len() as f64;
        Some(((index + 1) as f64 / total * 100.0).round() as u8)
    }

    /// Drive every step, yielding to the runtime in between
    pub async fn run(mut self, observer: &mut dyn ImportObserver) -> ImportOutcome {
        while let Some(percent) = self.step() {
            observer.on_progress(percent);
            tokio::task::yield_now().await;
        }
        self.finish()
    }

    pub fn finish(self) -> ImportOutcome {
        ImportOutcome {
            records: self.records,
            skipped: self.skipped,
        }
    }
}
