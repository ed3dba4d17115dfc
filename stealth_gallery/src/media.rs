//! Stealth Gallery - Media Records
//!
//! The record type shared by both partitions, plus the built-in decoy set.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use base64::Engine;

use crate::mode::AccessMode;

/// Image content held by a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaContent {
    /// Raw image bytes
    Inline { bytes: Vec<u8>, mime_type: String },
    /// External handle (URI)
    Reference(String),
}

impl MediaContent {
    /// Render as a URI a viewer can display
    pub fn to_uri(&self) -> String {
        match self {
            MediaContent::Inline { bytes, mime_type } => format!(
                "data:{};base64,{}",
                mime_type,
                base64::engine::general_purpose::STANDARD.encode(bytes)
            ),
            MediaContent::Reference(uri) => uri.clone(),
        }
    }

    /// Content size in bytes (0 for references)
    pub fn len(&self) -> usize {
        match self {
            MediaContent::Inline { bytes, .. } => bytes.len(),
            MediaContent::Reference(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single photo in either partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Unique across both partitions
    pub id: String,
    pub content: MediaContent,
    /// Capture or file modification time
    pub captured_at: DateTime<Utc>,
    /// Fixed at creation
    pub is_private: bool,
}

impl MediaRecord {
    pub fn partition(&self) -> Partition {
        Partition::of(self.is_private)
    }
}

/// Logical half of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    Public,
    Private,
}

impl Partition {
    pub fn of(is_private: bool) -> Self {
        if is_private {
            Partition::Private
        } else {
            Partition::Public
        }
    }

    /// Partition visible in the given mode
    pub fn for_mode(mode: AccessMode) -> Self {
        match mode {
            AccessMode::Real => Partition::Private,
            AccessMode::Decoy => Partition::Public,
        }
    }

    pub fn is_private(self) -> bool {
        self == Partition::Private
    }
}

/// Shown in decoy mode whenever the public partition is empty
pub fn decoy_placeholders() -> Vec<MediaRecord> {
    [
        ("d1", "https://picsum.photos/id/11/800/800", 1),
        ("d2", "https://picsum.photos/id/15/800/800", 2),
    ]
    .into_iter()
    .map(|(id, uri, ts)| MediaRecord {
        id: id.to_string(),
        content: MediaContent::Reference(uri.to_string()),
        captured_at: Utc.timestamp_millis_opt(ts).single().unwrap_or_else(Utc::now),
        is_private: false,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_uri() {
        let content = MediaContent::Inline {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".into(),
        };
        assert_eq!(content.to_uri(), "data:image/jpeg;base64,/9j/");
        assert_eq!(content.len(), 3);
    }

    #[test]
    fn test_partition_for_mode() {
        assert_eq!(Partition::for_mode(AccessMode::Decoy), Partition::Public);
        assert_eq!(Partition::for_mode(AccessMode::Real), Partition::Private);
        assert!(Partition::of(true).is_private());
    }

    #[test]
    fn test_placeholders_are_public() {
        let set = decoy_placeholders();
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|r| !r.is_private));
        assert_eq!(set[0].id, "d1");
    }
}
