//! # Stealth Gallery
//!
//! An ordinary-looking photo gallery with a second, hidden partition that
//! only opens after an inconspicuous physical gesture.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    STEALTH GALLERY                       │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ LONG PRESS  │  │   SHAKE x3  │  │ 3-FINGER TAP x2 │  │
//! │  └──────┬──────┘  └──────┬──────┘  └────────┬────────┘  │
//! │         └────────────────┼──────────────────┘           │
//! │                     trigger                             │
//! │  ┌───────────────────────┴────────────────────────────┐ │
//! │  │        MODE MACHINE   DECOY ⇄ REAL                 │ │
//! │  │   lock on blur/background, haptic pulses           │ │
//! │  └───────────────────────┬────────────────────────────┘ │
//! │                     query scope                         │
//! │  ┌─────────────┐  ┌──────┴──────┐  ┌─────────────────┐  │
//! │  │ ONBOARDING  │─▶│ MEDIA STORE │  │   PLACEHOLDER   │  │
//! │  │ IMPORT      │  │ public|priv │  │   DECOY SET     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threat Model
//!
//! - A casual observer glancing at or briefly handling the unlocked device
//! - No encryption, no OS-level access control
//! - Errors are never surfaced while the decoy is showing

pub mod api;
pub mod config;
pub mod error;
pub mod gesture;
pub mod haptics;
pub mod media;
pub mod mode;
pub mod onboarding;
pub mod store;

pub use api::{GalleryStatus, OnboardingOutcome, StealthGallery};
pub use config::GalleryConfig;
pub use error::{GalleryError, GalleryResult};
pub use media::{MediaContent, MediaRecord, Partition};
pub use mode::{AccessMode, Lifecycle};
pub use store::{MediaStore, MemoryRecordStore, SqliteRecordStore};

/// Stealth Gallery version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
