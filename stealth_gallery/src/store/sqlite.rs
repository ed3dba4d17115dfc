//! SQLite-backed record store.
//!
//! Records keep their insertion slot through `seq`; an upsert on an existing
//! id updates the row in place.

use std::path::Path;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{FlagStore, RecordStore};
use crate::error::{GalleryError, GalleryResult};
use crate::media::{MediaContent, MediaRecord};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS media (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        is_private INTEGER NOT NULL,
        captured_at INTEGER NOT NULL,
        mime_type TEXT,
        uri TEXT,
        bytes BLOB
    );

    CREATE INDEX IF NOT EXISTS idx_media_private ON media(is_private);

    CREATE TABLE IF NOT EXISTS flags (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

const UPSERT: &str = r#"
    INSERT INTO media (id, is_private, captured_at, mime_type, uri, bytes)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(id) DO UPDATE SET
        is_private = excluded.is_private,
        captured_at = excluded.captured_at,
        mime_type = excluded.mime_type,
        uri = excluded.uri,
        bytes = excluded.bytes
"#;

const SELECT: &str = "SELECT id, is_private, captured_at, mime_type, uri, bytes FROM media";

/// Durable store in a single SQLite file
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open or create the database file
    pub fn open<P: AsRef<Path>>(path: P) -> GalleryResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened media store at {}", path.display());

        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Throwaway database
    pub fn in_memory() -> GalleryResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn insert(conn: &Connection, record: &MediaRecord) -> rusqlite::Result<usize> {
        let (mime_type, uri, bytes) = match &record.content {
            MediaContent::Inline { bytes, mime_type } => (Some(mime_type.as_str()), None, Some(bytes.as_slice())),
            MediaContent::Reference(uri) => (None, Some(uri.as_str()), None),
        };

        conn.execute(
            UPSERT,
            params![
                record.id,
                record.is_private,
                record.captured_at.timestamp_millis(),
                mime_type,
                uri,
                bytes,
            ],
        )
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<MediaRecord> {
        let id: String = row.get(0)?;
        let is_private: bool = row.get(1)?;
        let millis: i64 = row.get(2)?;
        let mime_type: Option<String> = row.get(3)?;
        let uri: Option<String> = row.get(4)?;
        let bytes: Option<Vec<u8>> = row.get(5)?;

        let content = match (bytes, uri) {
            (Some(bytes), _) => MediaContent::Inline {
                bytes,
                mime_type: mime_type.unwrap_or_else(|| "application/octet-stream".into()),
            },
            (None, Some(uri)) => MediaContent::Reference(uri),
            (None, None) => MediaContent::Reference(String::new()),
        };

        let captured_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, millis))?;

        Ok(MediaRecord {
            id,
            content,
            captured_at,
            is_private,
        })
    }
}

impl RecordStore for SqliteRecordStore {
    fn get(&self, id: &str) -> GalleryResult<Option<MediaRecord>> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(&format!("{} WHERE id = ?1", SELECT), params![id], Self::from_row)
            .optional()?;
        Ok(record)
    }

    fn get_all(&self) -> GalleryResult<Vec<MediaRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!("{} ORDER BY seq", SELECT))?;
        let rows = stmt.query_map([], Self::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            match row {
                Ok(record) => records.push(record),
                Err(e) => log::warn!("Skipping unreadable media row: {}", e),
            }
        }

        Ok(records)
    }

    fn put(&self, record: &MediaRecord) -> GalleryResult<()> {
        let conn = self.conn.lock();
        Self::insert(&conn, record)?;
        Ok(())
    }

    fn put_many(&self, records: &[MediaRecord]) -> GalleryResult<()> {
        let mut conn = self.conn.lock();

        let tx = conn.transaction()?;
        for record in records {
            Self::insert(&tx, record)?;
        }
        tx.commit()?;

        Ok(())
    }

    fn delete(&self, id: &str) -> GalleryResult<()> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM media WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(GalleryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl FlagStore for SqliteRecordStore {
    fn flag(&self, key: &str) -> GalleryResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM flags WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_flag(&self, key: &str, value: &str) -> GalleryResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO flags (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(id: &str, is_private: bool, millis: i64) -> MediaRecord {
        MediaRecord {
            id: id.into(),
            content: MediaContent::Inline {
                bytes: vec![1, 2, 3],
                mime_type: "image/jpeg".into(),
            },
            captured_at: Utc.timestamp_millis_opt(millis).unwrap(),
            is_private,
        }
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db").join("media.db");

        {
            let store = SqliteRecordStore::open(&path).unwrap();
            store.put(&record("a", false, 10)).unwrap();
            store.put_many(&[record("b", true, 20), record("c", false, 30)]).unwrap();
            store.set_flag("onboarding", "granted").unwrap();
        }

        let store = SqliteRecordStore::open(&path).unwrap();
        let all = store.get_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all[1], record("b", true, 20));
        assert_eq!(store.flag("onboarding").unwrap().as_deref(), Some("granted"));
    }

    #[test]
    fn test_reference_content() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let r = MediaRecord {
            id: "ref".into(),
            content: MediaContent::Reference("https://example.org/a.jpg".into()),
            captured_at: Utc.timestamp_millis_opt(5).unwrap(),
            is_private: false,
        };
        store.put(&r).unwrap();
        assert_eq!(store.get("ref").unwrap(), Some(r));
    }

    #[test]
    fn test_upsert_keeps_order() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store.put(&record("a", true, 1)).unwrap();
        store.put(&record("b", true, 2)).unwrap();
        store.put(&record("a", true, 99)).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].captured_at.timestamp_millis(), 99);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = SqliteRecordStore::in_memory().unwrap();
        assert!(matches!(store.delete("nope"), Err(GalleryError::NotFound(_))));
        assert_eq!(store.get("nope").unwrap(), None);
        assert_eq!(store.flag("onboarding").unwrap(), None);
    }
}
