//! In-process record store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::RwLock;

use super::{FlagStore, RecordStore};
use crate::error::{GalleryError, GalleryResult};
use crate::media::MediaRecord;

/// Volatile store; writes can be switched off to simulate a full disk
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<MediaRecord>>,
    flags: RwLock<HashMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with `StorageFault`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_writable(&self) -> GalleryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(GalleryError::StorageFault("medium unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn upsert(records: &mut Vec<MediaRecord>, record: &MediaRecord) {
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => records.push(record.clone()),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, id: &str) -> GalleryResult<Option<MediaRecord>> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }

    fn get_all(&self) -> GalleryResult<Vec<MediaRecord>> {
        Ok(self.records.read().clone())
    }

    fn put(&self, record: &MediaRecord) -> GalleryResult<()> {
        self.ensure_writable()?;
        Self::upsert(&mut self.records.write(), record);
        Ok(())
    }

    fn put_many(&self, records: &[MediaRecord]) -> GalleryResult<()> {
        self.ensure_writable()?;
        let mut all = self.records.write();
        for record in records {
            Self::upsert(&mut all, record);
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> GalleryResult<()> {
        self.ensure_writable()?;
        let mut all = self.records.write();
        let pos = all
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.to_string()))?;
        all.remove(pos);
        Ok(())
    }
}

impl FlagStore for MemoryRecordStore {
    fn flag(&self, key: &str) -> GalleryResult<Option<String>> {
        Ok(self.flags.read().get(key).cloned())
    }

    fn set_flag(&self, key: &str, value: &str) -> GalleryResult<()> {
        self.ensure_writable()?;
        self.flags.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
