//! Stealth Gallery - Partitioned Media Store
//!
//! One durable collection holds both partitions. Reads are always scoped to
//! a single [`Partition`]; deletes are only possible from the real mode and
//! only for private records.

mod memory;
mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

use std::collections::HashSet;
use std::sync::Arc;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{GalleryError, GalleryResult};
use crate::media::{MediaRecord, Partition};
use crate::mode::AccessMode;

/// Durable key-value storage keyed by record id
pub trait RecordStore: Send + Sync {
    fn get(&self, id: &str) -> GalleryResult<Option<MediaRecord>>;

    /// Every record, in insertion order
    fn get_all(&self) -> GalleryResult<Vec<MediaRecord>>;

    /// Insert or replace. A replaced record keeps its position.
    fn put(&self, record: &MediaRecord) -> GalleryResult<()>;

    /// All records or none
    fn put_many(&self, records: &[MediaRecord]) -> GalleryResult<()>;

    /// Fails with `NotFound` if the id is absent
    fn delete(&self, id: &str) -> GalleryResult<()>;
}

/// Small persisted settings
pub trait FlagStore: Send + Sync {
    fn flag(&self, key: &str) -> GalleryResult<Option<String>>;
    fn set_flag(&self, key: &str, value: &str) -> GalleryResult<()>;
}

/// A record rejected from a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of `add_batch`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Ids written, in batch order
    pub stored: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Mode-scoped access to the record store
pub struct MediaStore {
    backend: Arc<dyn RecordStore>,
    /// Serializes all mutations
    writes: Mutex<()>,
}

impl MediaStore {
    pub fn new(backend: Arc<dyn RecordStore>) -> Self {
        Self {
            backend,
            writes: Mutex::new(()),
        }
    }

    /// Records of one partition in insertion order. Never fails.
    pub fn list(&self, partition: Partition) -> Vec<MediaRecord> {
        match self.backend.get_all() {
            Ok(records) => records
                .into_iter()
                .filter(|r| r.is_private == partition.is_private())
                .collect(),
            Err(e) => {
                log::error!("Listing {:?} media failed: {}", partition, e);
                Vec::new()
            }
        }
    }

    pub fn count(&self, partition: Partition) -> usize {
        self.list(partition).len()
    }

    /// Persist one record
    pub fn add(&self, record: MediaRecord) -> GalleryResult<()> {
        let _guard = self.writes.lock();

        self.check_partition(&record)?;
        self.backend.put(&record)?;

        log::debug!("Stored {:?} record {}", record.partition(), record.id);
        Ok(())
    }

    /// Persist many records, reporting every one that did not make it
    pub fn add_batch(&self, records: Vec<MediaRecord>) -> BatchReport {
        let _guard = self.writes.lock();

        let mut report = BatchReport::default();
        let mut seen = HashSet::new();
        let mut accepted = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id.clone()) {
                report.failed.push(BatchFailure {
                    id: record.id,
                    reason: "duplicate id in batch".into(),
                });
                continue;
            }

            match self.check_partition(&record) {
                Ok(()) => accepted.push(record),
                Err(e) => report.failed.push(BatchFailure {
                    id: record.id,
                    reason: e.to_string(),
                }),
            }
        }

        match self.backend.put_many(&accepted) {
            Ok(()) => {
                report.stored = accepted.into_iter().map(|r| r.id).collect();
            }
            Err(e) => {
                log::error!("Batch write of {} records failed: {}", accepted.len(), e);
                let reason = e.to_string();
                report.failed.extend(accepted.into_iter().map(|r| BatchFailure {
                    id: r.id,
                    reason: reason.clone(),
                }));
            }
        }

        log::info!(
            "Batch stored {} records, {} failed",
            report.stored.len(),
            report.failed.len()
        );
        report
    }

    /// Undo a batch that was stored but could not be committed.
    /// Returns the ids that could not be removed.
    pub fn rollback(&self, ids: &[String]) -> Vec<String> {
        let _guard = self.writes.lock();

        let mut left = Vec::new();
        for id in ids {
            match self.backend.delete(id) {
                Ok(()) | Err(GalleryError::NotFound(_)) => {}
                Err(e) => {
                    log::error!("Rolling back {} failed: {}", id, e);
                    left.push(id.clone());
                }
            }
        }

        log::warn!("Rolled back {} of {} records", ids.len() - left.len(), ids.len());
        left
    }

    /// Remove a private record. Only allowed in real mode.
    pub fn delete(&self, mode: AccessMode, id: &str) -> GalleryResult<MediaRecord> {
        if mode != AccessMode::Real {
            return Err(GalleryError::Locked);
        }

        let _guard = self.writes.lock();

        let record = self
            .backend
            .get(id)?
            .ok_or_else(|| GalleryError::NotFound(id.to_string()))?;

        if !record.is_private {
            return Err(GalleryError::PublicRecord(id.to_string()));
        }

        self.backend.delete(id)?;
        log::debug!("Deleted private record {}", id);
        Ok(record)
    }

    /// An existing id may not switch partitions
    fn check_partition(&self, record: &MediaRecord) -> GalleryResult<()> {
        match self.backend.get(&record.id)? {
            Some(existing) if existing.is_private != record.is_private => {
                Err(GalleryError::PartitionViolation(record.id.clone()))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::media::MediaContent;

    fn record(id: &str, is_private: bool) -> MediaRecord {
        MediaRecord {
            id: id.into(),
            content: MediaContent::Inline {
                bytes: id.as_bytes().to_vec(),
                mime_type: "image/png".into(),
            },
            captured_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            is_private,
        }
    }

    fn ids(records: &[MediaRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    fn store() -> (MediaStore, Arc<MemoryRecordStore>) {
        let backend = Arc::new(MemoryRecordStore::new());
        (MediaStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_public_batch_is_invisible_to_private_scope() {
        let (store, _) = store();
        let report = store.add_batch(vec![
            record("a", false),
            record("b", false),
            record("c", false),
        ]);

        assert!(report.is_complete());
        assert!(store.list(Partition::Private).is_empty());
        assert_eq!(ids(&store.list(Partition::Public)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_add_visible_in_own_scope_only() {
        let (store, _) = store();
        store.add(record("secret", true)).unwrap();

        assert_eq!(ids(&store.list(Partition::Private)), vec!["secret"]);
        assert!(store.list(Partition::Public).is_empty());
        assert_eq!(store.count(Partition::Private), 1);
    }

    #[test]
    fn test_readd_keeps_position() {
        let (store, _) = store();
        store.add(record("a", true)).unwrap();
        store.add(record("b", true)).unwrap();

        let mut updated = record("a", true);
        updated.content = MediaContent::Reference("file:///a.jpg".into());
        store.add(updated.clone()).unwrap();

        let listed = store.list(Partition::Private);
        assert_eq!(ids(&listed), vec!["a", "b"]);
        assert_eq!(listed[0], updated);
    }

    #[test]
    fn test_partition_is_immutable() {
        let (store, _) = store();
        store.add(record("a", false)).unwrap();

        assert!(matches!(
            store.add(record("a", true)),
            Err(GalleryError::PartitionViolation(_))
        ));
        assert!(store.list(Partition::Private).is_empty());
    }

    #[test]
    fn test_batch_reports_rejected_records() {
        let (store, _) = store();
        store.add(record("taken", true)).unwrap();

        let report = store.add_batch(vec![
            record("x", false),
            record("x", false),
            record("taken", false),
            record("y", false),
        ]);

        assert_eq!(report.stored, vec!["x", "y"]);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, vec!["x", "taken"]);
        assert_eq!(ids(&store.list(Partition::Public)), vec!["x", "y"]);
    }

    #[test]
    fn test_batch_storage_fault_fails_everything() {
        let (store, backend) = store();
        backend.set_unavailable(true);

        let report = store.add_batch(vec![record("a", false), record("b", false)]);
        assert!(report.stored.is_empty());
        assert_eq!(report.failed.len(), 2);

        backend.set_unavailable(false);
        assert!(store.list(Partition::Public).is_empty());
    }

    #[test]
    fn test_rollback_removes_batch() {
        let (store, backend) = store();
        store.add(record("keep", false)).unwrap();
        let report = store.add_batch(vec![record("a", false), record("b", false)]);

        let left = store.rollback(&report.stored);
        assert!(left.is_empty());
        assert_eq!(ids(&store.list(Partition::Public)), vec!["keep"]);

        // Already gone counts as rolled back
        assert!(store.rollback(&["a".to_string()]).is_empty());

        store.add_batch(vec![record("c", false)]);
        backend.set_unavailable(true);
        assert_eq!(store.rollback(&["c".to_string()]), vec!["c"]);
    }

    #[test]
    fn test_add_storage_fault() {
        let (store, backend) = store();
        backend.set_unavailable(true);
        assert!(matches!(
            store.add(record("a", true)),
            Err(GalleryError::StorageFault(_))
        ));
    }

    #[test]
    fn test_delete_missing_leaves_store_unchanged() {
        let (store, _) = store();
        store.add(record("keep", true)).unwrap();

        assert!(matches!(
            store.delete(AccessMode::Real, "ghost"),
            Err(GalleryError::NotFound(_))
        ));
        assert_eq!(ids(&store.list(Partition::Private)), vec!["keep"]);
    }

    #[test]
    fn test_delete_requires_real_mode() {
        let (store, _) = store();
        store.add(record("p", true)).unwrap();

        assert!(matches!(store.delete(AccessMode::Decoy, "p"), Err(GalleryError::Locked)));
        assert_eq!(store.count(Partition::Private), 1);
    }

    #[test]
    fn test_delete_rejects_public_record() {
        let (store, _) = store();
        store.add(record("pub", false)).unwrap();

        assert!(matches!(
            store.delete(AccessMode::Real, "pub"),
            Err(GalleryError::PublicRecord(_))
        ));
        assert_eq!(store.count(Partition::Public), 1);
    }

    #[test]
    fn test_double_delete_fails_cleanly() {
        let (store, _) = store();
        store.add(record("p", true)).unwrap();

        let removed = store.delete(AccessMode::Real, "p").unwrap();
        assert_eq!(removed.id, "p");
        assert!(matches!(
            store.delete(AccessMode::Real, "p"),
            Err(GalleryError::NotFound(_))
        ));
    }

    #[test]
    fn test_concurrent_deletes_of_same_id() {
        let (store, _) = store();
        let store = Arc::new(store);
        store.add(record("p", true)).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.delete(AccessMode::Real, "p").is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert!(store.list(Partition::Private).is_empty());
    }
}
