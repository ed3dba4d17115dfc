//! Stealth Gallery - Error Types

use thiserror::Error;

use crate::gesture::GestureKind;
use crate::mode::AccessMode;

/// Result type for gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Gallery error types
#[derive(Error, Debug)]
pub enum GalleryError {
    // ═══════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Storage fault: {0}")]
    StorageFault(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record {0} already exists in the other partition")]
    PartitionViolation(String),

    // ═══════════════════════════════════════════════════════════════
    // ACCESS ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Vault is locked")]
    Locked,

    #[error("Record {0} is public and cannot be removed from the vault")]
    PublicRecord(String),

    // ═══════════════════════════════════════════════════════════════
    // IMPORT ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Decode fault: {0}")]
    DecodeFault(String),

    // ═══════════════════════════════════════════════════════════════
    // SENSOR / CONFIG ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Sensor unavailable for {0:?} gesture")]
    SensorUnavailable(GestureKind),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GalleryError {
    /// A single import candidate failed; the batch goes on
    pub fn is_skippable(&self) -> bool {
        matches!(self, GalleryError::DecodeFault(_))
    }

    /// Whether this error may be shown to the user in the given mode.
    ///
    /// Nothing is ever surfaced in decoy mode.
    pub fn surfaces_in(&self, mode: AccessMode) -> bool {
        mode == AccessMode::Real
    }

    /// Check if the backing medium is at fault
    pub fn is_storage_fault(&self) -> bool {
        matches!(self, GalleryError::StorageFault(_))
    }
}

impl From<rusqlite::Error> for GalleryError {
    fn from(e: rusqlite::Error) -> Self {
        GalleryError::StorageFault(e.to_string())
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(e: std::io::Error) -> Self {
        GalleryError::StorageFault(e.to_string())
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(e: serde_json::Error) -> Self {
        GalleryError::StorageFault(e.to_string())
    }
}

impl From<image::ImageError> for GalleryError {
    fn from(e: image::ImageError) -> Self {
        GalleryError::DecodeFault(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_hidden_in_decoy() {
        let err = GalleryError::StorageFault("disk full".into());
        assert!(!err.surfaces_in(AccessMode::Decoy));
        assert!(err.surfaces_in(AccessMode::Real));
        assert!(err.is_storage_fault());
    }

    #[test]
    fn test_decode_fault_is_skippable() {
        assert!(GalleryError::DecodeFault("truncated".into()).is_skippable());
        assert!(!GalleryError::NotFound("x".into()).is_skippable());
    }
}
