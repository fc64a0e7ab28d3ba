//! Append-only audit store
//!
//! Records are kept in a line-delimited JSON file (JSONL), one record per
//! line, in append order. The file is opened once in append mode and every
//! write is flushed and synced before it is acknowledged.
//!
//! The typed surface is `append` plus reads. `execute` is the raw statement
//! entry point; it routes everything through the [`ImmutabilityGuard`], so
//! there is no way to reach the file except by appending a new record.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::guard::{ImmutabilityGuard, StoreStatement};
use super::record::AuditRecord;
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::AuditRecordId;
use crate::storage::file_io::{read_json, write_json_atomic};

/// Schema version written by this build
pub const AUDIT_SCHEMA_VERSION: u32 = 1;

/// Schema manifest stored next to the audit log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditSchema {
    pub schema_version: u32,
    pub collection: String,
    pub append_only: bool,
    pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct LogIndex {
    records: Vec<AuditRecord>,
    positions: HashMap<AuditRecordId, usize>,
}

impl LogIndex {
    fn push(&mut self, record: AuditRecord) {
        self.positions.insert(record.id(), self.records.len());
        self.records.push(record);
    }
}

/// The audit store connection
pub struct AuditStore {
    log_path: PathBuf,
    guard: ImmutabilityGuard,
    /// Serializes appends; `None` once closed
    file: Mutex<Option<File>>,
    index: RwLock<LogIndex>,
}

impl AuditStore {
    /// Open (or create) the audit log at the given path
    pub fn open(log_path: impl Into<PathBuf>) -> SimulottoResult<Self> {
        let log_path = log_path.into();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SimulottoError::AuditWrite(format!(
                    "Failed to create audit store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let index = load_index(&log_path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to open audit log: {}", e)))?;

        info!(
            path = %log_path.display(),
            records = index.records.len(),
            "opened audit store"
        );

        Ok(Self {
            log_path,
            guard: ImmutabilityGuard,
            file: Mutex::new(Some(file)),
            index: RwLock::new(index),
        })
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    fn schema_path(&self) -> PathBuf {
        self.log_path.with_file_name("schema.json")
    }

    /// The applied schema, if any
    pub fn schema(&self) -> SimulottoResult<Option<AuditSchema>> {
        let schema: AuditSchema = read_json(self.schema_path())?;
        Ok((schema.schema_version > 0).then_some(schema))
    }

    /// Apply or upgrade the schema manifest
    ///
    /// Existing records are never touched. A manifest written by a newer
    /// build is left alone and reported as a configuration error.
    pub fn apply_schema(&self) -> SimulottoResult<AuditSchema> {
        if let Some(existing) = self.schema()? {
            if existing.schema_version > AUDIT_SCHEMA_VERSION {
                return Err(SimulottoError::Config(format!(
                    "audit store schema v{} is newer than supported v{}",
                    existing.schema_version, AUDIT_SCHEMA_VERSION
                )));
            }
            if existing.schema_version == AUDIT_SCHEMA_VERSION {
                return Ok(existing);
            }
        }

        let schema = AuditSchema {
            schema_version: AUDIT_SCHEMA_VERSION,
            collection: "audit_records".into(),
            append_only: true,
            applied_at: Some(Utc::now()),
        };
        write_json_atomic(self.schema_path(), &schema)?;
        info!(version = AUDIT_SCHEMA_VERSION, "applied audit store schema");
        Ok(schema)
    }

    /// Append a new record
    pub fn append(&self, record: &AuditRecord) -> SimulottoResult<()> {
        self.execute(StoreStatement::Append(record.clone()))
    }

    /// Run a raw statement against the store
    ///
    /// Only appends of unused ids get past the guard; updates and deletes
    /// fail with an immutability violation and leave the log untouched.
    pub fn execute(&self, statement: StoreStatement) -> SimulottoResult<()> {
        let mut file_slot = self.file.lock().map_err(|e| {
            SimulottoError::AuditWrite(format!("Failed to acquire audit log lock: {}", e))
        })?;

        let record = {
            let index = self.index.read().map_err(|e| {
                SimulottoError::AuditWrite(format!("Failed to acquire read lock: {}", e))
            })?;
            self.guard
                .admit(statement, |id| index.positions.contains_key(id))?
        };

        let file = file_slot
            .as_mut()
            .ok_or_else(|| SimulottoError::AuditWrite("audit store is closed".into()))?;

        let mut line = serde_json::to_string(&record).map_err(|e| {
            SimulottoError::AuditWrite(format!("Failed to serialize audit record: {}", e))
        })?;
        line.push('\n');

        // One write per line: concurrent O_APPEND writers cannot split it
        file.write_all(line.as_bytes())
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to write audit record: {}", e)))?;

        file.flush()
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to flush audit log: {}", e)))?;

        file.sync_data()
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to sync audit log: {}", e)))?;

        debug!(
            record_id = %record.id().full(),
            event = record.event().as_str(),
            table = record.source_table(),
            "appended audit record"
        );

        let mut index = self.index.write().map_err(|e| {
            SimulottoError::AuditWrite(format!("Failed to acquire write lock: {}", e))
        })?;
        index.push(record);

        Ok(())
    }

    /// Get a record by id
    pub fn get(&self, id: AuditRecordId) -> SimulottoResult<Option<AuditRecord>> {
        let index = self.read_index()?;
        Ok(index
            .positions
            .get(&id)
            .and_then(|&pos| index.records.get(pos))
            .cloned())
    }

    /// All records matching the predicate, in append order
    pub fn scan(&self, predicate: impl Fn(&AuditRecord) -> bool) -> SimulottoResult<Vec<AuditRecord>> {
        let index = self.read_index()?;
        Ok(index
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    /// Get the number of records in the store
    pub fn count(&self) -> SimulottoResult<usize> {
        Ok(self.read_index()?.records.len())
    }

    /// Newest capture timestamp in the store
    pub fn latest_created_at(&self) -> SimulottoResult<Option<DateTime<Utc>>> {
        Ok(self.read_index()?.records.iter().map(|r| r.created_at()).max())
    }

    /// Sync and release the log file; later appends fail
    pub fn close(&self) -> SimulottoResult<()> {
        let mut file_slot = self.file.lock().map_err(|e| {
            SimulottoError::AuditWrite(format!("Failed to acquire audit log lock: {}", e))
        })?;

        if let Some(file) = file_slot.take() {
            file.sync_all()
                .map_err(|e| SimulottoError::AuditWrite(format!("Failed to sync audit log: {}", e)))?;
            info!(path = %self.log_path.display(), "closed audit store");
        }

        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }

    fn read_index(&self) -> SimulottoResult<std::sync::RwLockReadGuard<'_, LogIndex>> {
        self.index
            .read()
            .map_err(|e| SimulottoError::Storage(format!("Failed to acquire read lock: {}", e)))
    }
}

/// Read every record already in the log
fn load_index(log_path: &Path) -> SimulottoResult<LogIndex> {
    let mut index = LogIndex::default();

    if !log_path.exists() {
        return Ok(index);
    }

    let file = File::open(log_path)
        .map_err(|e| SimulottoError::AuditWrite(format!("Failed to open audit log: {}", e)))?;

    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            SimulottoError::Storage(format!(
                "Failed to read audit log line {}: {}",
                line_num + 1,
                e
            ))
        })?;

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let record: AuditRecord = serde_json::from_str(&line).map_err(|e| {
            SimulottoError::Storage(format!(
                "Failed to parse audit record at line {}: {}",
                line_num + 1,
                e
            ))
        })?;

        if index.positions.contains_key(&record.id()) {
            return Err(SimulottoError::Storage(format!(
                "Duplicate audit record id {} at line {}",
                record.id().full(),
                line_num + 1
            )));
        }

        index.push(record);
    }

    Ok(index)
}
