//! Append-only log of conversions.
//!
//! Records are assigned increasing ids by the store and listed newest
//! first. [`MemoryHistory`] keeps everything in process; [`RedbHistory`]
//! keeps the same records in an embedded `redb` database, together with
//! the id counter, so ids are never reused across deletes and restarts.

use crate::{constants::HISTORY_DATE_FORMAT, Error, Result};
use chrono::{DateTime, Local};
use log::{debug, info};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Kind of records produced by the lip reader
pub const LIP_READING_KIND: &str = "lip-reading";

/// Kind of records produced by the sign recognizer
pub const SIGN_KIND: &str = "asl-to-text";

/// Kind filter that matches every record
pub const ALL_KINDS: &str = "all";

/// A record before the store assigns its id and timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub kind: String,
    pub input: String,
    pub output: String,
    pub confidence: f64,
    pub method: String,
    pub duration_seconds: f64,
    pub metadata: Value,
}

impl NewRecord {
    /// Record for a word emitted by the lip reader
    #[must_use]
    pub fn lip_reading(word: &str, confidence: f64) -> Self {
        Self {
            kind: LIP_READING_KIND.to_string(),
            input: "Lip Movement".to_string(),
            output: word.to_string(),
            confidence,
            method: "pattern-matching".to_string(),
            duration_seconds: 0.0,
            metadata: json!({ "word": word }),
        }
    }

    /// Record for a sign accepted by the sign recognizer
    #[must_use]
    pub fn sign(label: &str, confidence: f64) -> Self {
        Self {
            kind: SIGN_KIND.to_string(),
            input: "Camera Input".to_string(),
            output: label.to_string(),
            confidence,
            method: "sign-detector".to_string(),
            duration_seconds: 0.0,
            metadata: json!({ "sign": label }),
        }
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub kind: String,
    pub input: String,
    pub output: String,
    pub confidence: f64,
    pub method: String,
    pub duration_seconds: f64,
    pub metadata: Value,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// Local time formatted as `%Y-%m-%d %H:%M:%S`
    pub date: String,
}

impl HistoryRecord {
    fn stamp(id: u64, record: NewRecord, at: DateTime<Local>) -> Self {
        Self {
            id,
            kind: record.kind,
            input: record.input,
            output: record.output,
            confidence: record.confidence,
            method: record.method,
            duration_seconds: record.duration_seconds,
            metadata: record.metadata,
            timestamp: at.timestamp_millis() as f64 / 1000.0,
            date: at.format(HISTORY_DATE_FORMAT).to_string(),
        }
    }
}

/// Aggregate counts over the stored records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStatistics {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    /// Mean over records with positive confidence, `0.0` when there are none
    pub average_confidence: f64,
}

/// Persistent log of conversions
pub trait HistoryStore: Send {
    /// Store a record and return its id
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted
    fn append(&mut self, record: NewRecord) -> Result<u64>;

    /// Up to `limit` records, newest first
    ///
    /// `None` or [`ALL_KINDS`] lists every kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn list(&self, limit: usize, kind: Option<&str>) -> Result<Vec<HistoryRecord>>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn statistics(&self) -> Result<HistoryStatistics>;

    /// Remove one record, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted
    fn delete(&mut self, id: u64) -> Result<bool>;

    /// Remove every record of `kind` (all records for `None` or [`ALL_KINDS`])
    /// and return how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted
    fn clear(&mut self, kind: Option<&str>) -> Result<usize>;
}

fn kind_filter(kind: Option<&str>) -> Option<&str> {
    kind.filter(|k| *k != ALL_KINDS)
}

fn summarize<'a>(records: impl IntoIterator<Item = &'a HistoryRecord>) -> HistoryStatistics {
    let mut stats = HistoryStatistics::default();
    let (mut confidence_sum, mut confident) = (0.0, 0usize);
    for record in records {
        stats.total += 1;
        *stats.by_kind.entry(record.kind.clone()).or_insert(0) += 1;
        if record.confidence > 0.0 {
            confidence_sum += record.confidence;
            confident += 1;
        }
    }
    if confident > 0 {
        stats.average_confidence = confidence_sum / confident as f64;
    }
    stats
}

/// In-process history
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    records: Vec<HistoryRecord>,
    next_id: u64,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, record: NewRecord) -> &HistoryRecord {
        let stored = HistoryRecord::stamp(self.next_id, record, Local::now());
        self.next_id += 1;
        self.records.push(stored);
        &self.records[self.records.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, record: NewRecord) -> Result<u64> {
        Ok(self.insert(record).id)
    }

    fn list(&self, limit: usize, kind: Option<&str>) -> Result<Vec<HistoryRecord>> {
        let kind = kind_filter(kind);
        Ok(self
            .records
            .iter()
            .rev()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .take(limit)
            .cloned()
            .collect())
    }

    fn statistics(&self) -> Result<HistoryStatistics> {
        Ok(summarize(&self.records))
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        Ok(self.records.len() != before)
    }

    fn clear(&mut self, kind: Option<&str>) -> Result<usize> {
        let before = self.records.len();
        match kind_filter(kind) {
            Some(kind) => self.records.retain(|r| r.kind != kind),
            None => self.records.clear(),
        }
        Ok(before - self.records.len())
    }
}

const RECORDS: TableDefinition<u64, &str> = TableDefinition::new("history");
const META: TableDefinition<&str, u64> = TableDefinition::new("history_meta");
const NEXT_ID_KEY: &str = "next_id";

fn storage_error(e: impl Display) -> Error {
    Error::HistoryError(e.to_string())
}

/// History stored in a `redb` database file
///
/// Every operation runs in its own transaction, so a failed write leaves
/// the stored records untouched.
pub struct RedbHistory {
    path: PathBuf,
    db: Database,
}

impl RedbHistory {
    /// Open or create a history database
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened as a `redb` database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(storage_error)?;

        let tx = db.begin_write().map_err(storage_error)?;
        {
            let _ = tx.open_table(RECORDS).map_err(storage_error)?;
            let _ = tx.open_table(META).map_err(storage_error)?;
        }
        tx.commit().map_err(storage_error)?;

        let history = Self { path, db };
        info!(
            "Opened history {} with {} records",
            history.path.display(),
            history.records()?.len()
        );
        Ok(history)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first
    fn records(&self) -> Result<Vec<HistoryRecord>> {
        let tx = self.db.begin_read().map_err(storage_error)?;
        let table = tx.open_table(RECORDS).map_err(storage_error)?;

        let mut records = Vec::new();
        for item in table.iter().map_err(storage_error)? {
            let (id, json) = item.map_err(storage_error)?;
            let record: HistoryRecord = serde_json::from_str(json.value())
                .map_err(|e| Error::HistoryError(format!("record {}: {e}", id.value())))?;
            records.push(record);
        }
        Ok(records)
    }
}

impl HistoryStore for RedbHistory {
    fn append(&mut self, record: NewRecord) -> Result<u64> {
        let tx = self.db.begin_write().map_err(storage_error)?;
        let id = {
            let mut meta = tx.open_table(META).map_err(storage_error)?;
            let id = meta
                .get(NEXT_ID_KEY)
                .map_err(storage_error)?
                .map_or(1, |next| next.value());
            meta.insert(NEXT_ID_KEY, id + 1).map_err(storage_error)?;

            let stored = HistoryRecord::stamp(id, record, Local::now());
            let json = serde_json::to_string(&stored)?;
            let mut records = tx.open_table(RECORDS).map_err(storage_error)?;
            records.insert(id, json.as_str()).map_err(storage_error)?;
            id
        };
        tx.commit().map_err(storage_error)?;
        debug!("Stored history entry {id}");
        Ok(id)
    }

    fn list(&self, limit: usize, kind: Option<&str>) -> Result<Vec<HistoryRecord>> {
        let kind = kind_filter(kind);
        Ok(self
            .records()?
            .into_iter()
            .rev()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .take(limit)
            .collect())
    }

    fn statistics(&self) -> Result<HistoryStatistics> {
        Ok(summarize(&self.records()?))
    }

    fn delete(&mut self, id: u64) -> Result<bool> {
        let tx = self.db.begin_write().map_err(storage_error)?;
        let deleted = {
            let mut records = tx.open_table(RECORDS).map_err(storage_error)?;
            let removed = records.remove(id).map_err(storage_error)?;
            removed.is_some()
        };
        tx.commit().map_err(storage_error)?;
        if deleted {
            info!("Deleted history entry {id}");
        }
        Ok(deleted)
    }

    fn clear(&mut self, kind: Option<&str>) -> Result<usize> {
        let kind_name = kind.unwrap_or(ALL_KINDS);
        let kind = kind_filter(kind);
        let doomed: Vec<u64> = self
            .records()?
            .into_iter()
            .filter(|r| kind.map_or(true, |k| r.kind == k))
            .map(|r| r.id)
            .collect();

        let tx = self.db.begin_write().map_err(storage_error)?;
        {
            let mut records = tx.open_table(RECORDS).map_err(storage_error)?;
            for id in &doomed {
                records.remove(*id).map_err(storage_error)?;
            }
        }
        tx.commit().map_err(storage_error)?;
        info!("Cleared {} history entries ({kind_name})", doomed.len());
        Ok(doomed.len())
    }
}
