//! Generic JSON-file table with audit capture
//!
//! Each table is one JSON file holding all rows, mirrored in memory behind a
//! `RwLock`. On a monitored table every mutation runs as one unit of work
//! under the write lock:
//!
//! 1. compute the next set of rows and the before/after snapshot
//! 2. prepare the audit record (serialization errors stop here)
//! 3. deliver the audit record
//! 4. persist the new table file
//! 5. publish the new rows in memory
//!
//! Nothing reaches the table file before its audit record is durable. If
//! step 4 fails the record stays in the audit store without a matching
//! change: the trail may over-report a mutation, never miss one.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::audit::{AuditRecord, ChangeInterceptor, MonitoredEntitySnapshot};
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{Bet, BetId, Draw, DrawId, GameType, GameTypeId, User, UserId};

use super::file_io::{read_json, remove_file_if_exists, write_json_atomic};

/// A row type stored in a [`Table`]
pub trait MonitoredEntity: Clone + Serialize + DeserializeOwned + Send + Sync {
    type Id: Copy + Eq + Hash + fmt::Display + Send + Sync;

    /// Table name, as recorded in `source_table`
    const TABLE: &'static str;

    /// Human-readable entity name for errors
    const ENTITY: &'static str;

    fn id(&self) -> Self::Id;

    /// Identity written to `source_record_id`
    fn record_id(&self) -> String;

    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! monitored_entity {
    ($ty:ty, $id:ty, $table:literal, $entity:literal) => {
        impl MonitoredEntity for $ty {
            type Id = $id;
            const TABLE: &'static str = $table;
            const ENTITY: &'static str = $entity;

            fn id(&self) -> $id {
                self.id
            }

            fn record_id(&self) -> String {
                self.id.full()
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

monitored_entity!(User, UserId, "users", "User");
monitored_entity!(GameType, GameTypeId, "game_types", "Game type");
monitored_entity!(Draw, DrawId, "draws", "Draw");
monitored_entity!(Bet, BetId, "bets", "Bet");

/// On-disk layout of a table file
#[derive(Serialize, Deserialize)]
struct TableData<T> {
    rows: Vec<T>,
}

impl<T> Default for TableData<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

type Rows<T> = HashMap<<T as MonitoredEntity>::Id, T>;

/// A table of entities persisted to a single JSON file
pub struct Table<T: MonitoredEntity> {
    path: PathBuf,
    monitored: bool,
    rows: RwLock<Rows<T>>,
    hooks: RwLock<Option<Arc<ChangeInterceptor>>>,
}

impl<T: MonitoredEntity> Table<T> {
    /// Create a table backed by `path`; nothing is read until [`load`](Self::load)
    pub fn new(path: PathBuf, monitored: bool) -> Self {
        Self {
            path,
            monitored,
            rows: RwLock::new(HashMap::new()),
            hooks: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        T::TABLE
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_monitored(&self) -> bool {
        self.monitored
    }

    /// Load rows from disk, replacing what is in memory
    pub fn load(&self) -> SimulottoResult<()> {
        let data: TableData<T> = read_json(&self.path)?;
        let mut rows = self.write_rows()?;
        rows.clear();
        for row in data.rows {
            rows.insert(row.id(), row);
        }
        Ok(())
    }

    /// Attach the capture hook
    pub fn install_hooks(&self, interceptor: Arc<ChangeInterceptor>) -> SimulottoResult<()> {
        let mut hooks = self.hooks.write().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire hooks lock: {}", e))
        })?;
        *hooks = Some(interceptor);
        debug!(table = T::TABLE, "installed capture hooks");
        Ok(())
    }

    /// Detach the capture hook; mutations are refused until reinstalled
    pub fn uninstall_hooks(&self) -> SimulottoResult<()> {
        let mut hooks = self.hooks.write().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire hooks lock: {}", e))
        })?;
        *hooks = None;
        Ok(())
    }

    pub fn hooks_installed(&self) -> bool {
        self.hooks.read().map(|h| h.is_some()).unwrap_or(false)
    }

    /// Drop every row and the table file without capturing anything
    pub fn reset(&self) -> SimulottoResult<()> {
        let mut rows = self.write_rows()?;
        remove_file_if_exists(&self.path)?;
        rows.clear();
        Ok(())
    }

    /// Get a row by ID
    pub fn get(&self, id: T::Id) -> SimulottoResult<Option<T>> {
        let rows = self.rows.read().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(rows.get(&id).cloned())
    }

    /// All rows, oldest first
    pub fn list(&self) -> SimulottoResult<Vec<T>> {
        let rows = self.rows.read().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(sorted(&rows))
    }

    /// Find a row by its short display id (`bet-1a2b3c4d`) or full UUID
    pub fn find(&self, identifier: &str) -> SimulottoResult<Option<T>> {
        let identifier = identifier.trim();
        let rows = self.rows.read().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(rows
            .values()
            .find(|row| row.id().to_string() == identifier || row.record_id() == identifier)
            .cloned())
    }

    pub fn count(&self) -> SimulottoResult<usize> {
        let rows = self.rows.read().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(rows.len())
    }

    /// Insert a new row
    pub fn insert(&self, row: T) -> SimulottoResult<T> {
        let mut rows = self.write_rows()?;

        if rows.contains_key(&row.id()) {
            return Err(SimulottoError::Duplicate {
                entity_type: T::ENTITY,
                identifier: row.id().to_string(),
            });
        }

        let snapshot = self.snapshot(|| {
            MonitoredEntitySnapshot::insert(T::TABLE, row.record_id(), &row)
        })?;

        let mut next = rows.clone();
        next.insert(row.id(), row.clone());
        self.commit(&mut rows, next, snapshot)?;

        Ok(row)
    }

    /// Apply `change` to an existing row
    ///
    /// The change runs under the write lock against a copy; if it returns an
    /// error nothing is written anywhere.
    pub fn update(
        &self,
        id: T::Id,
        change: impl FnOnce(&mut T) -> SimulottoResult<()>,
    ) -> SimulottoResult<T> {
        let mut rows = self.write_rows()?;

        let before = rows.get(&id).cloned().ok_or_else(|| self.not_found(id))?;
        let mut after = before.clone();
        change(&mut after)?;

        if after.id() != id {
            return Err(SimulottoError::Validation(format!(
                "{} {} cannot change its identity",
                T::ENTITY,
                id
            )));
        }

        let snapshot = self.snapshot(|| {
            MonitoredEntitySnapshot::update(T::TABLE, before.record_id(), &before, &after)
        })?;

        let mut next = rows.clone();
        next.insert(id, after.clone());
        self.commit(&mut rows, next, snapshot)?;

        Ok(after)
    }

    /// Remove a row, returning its last state
    pub fn delete(&self, id: T::Id) -> SimulottoResult<T> {
        let mut rows = self.write_rows()?;

        let before = rows.get(&id).cloned().ok_or_else(|| self.not_found(id))?;
        let snapshot = self.snapshot(|| {
            MonitoredEntitySnapshot::delete(T::TABLE, before.record_id(), &before)
        })?;

        let mut next = rows.clone();
        next.remove(&id);
        self.commit(&mut rows, next, snapshot)?;

        Ok(before)
    }

    fn snapshot(
        &self,
        take: impl FnOnce() -> SimulottoResult<MonitoredEntitySnapshot>,
    ) -> SimulottoResult<Option<MonitoredEntitySnapshot>> {
        if self.monitored {
            take().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Deliver the audit record for `next`, then persist and publish it
    fn commit(
        &self,
        rows: &mut RwLockWriteGuard<'_, Rows<T>>,
        next: Rows<T>,
        snapshot: Option<MonitoredEntitySnapshot>,
    ) -> SimulottoResult<Option<AuditRecord>> {
        let record = match snapshot {
            Some(snapshot) => {
                let interceptor = self.interceptor()?;
                let record = interceptor.prepare(&snapshot)?;
                interceptor.deliver(&record)?;
                Some(record)
            }
            None => None,
        };

        if let Err(e) = self.save(&next) {
            if let Some(record) = &record {
                error!(
                    table = T::TABLE,
                    record_id = %record.id().full(),
                    source_record_id = record.source_record_id(),
                    error = %e,
                    "audit record written but table file was not"
                );
            }
            return Err(e);
        }

        **rows = next;
        Ok(record)
    }

    fn interceptor(&self) -> SimulottoResult<Arc<ChangeInterceptor>> {
        let hooks = self.hooks.read().map_err(|e| {
            SimulottoError::Storage(format!("Failed to acquire hooks lock: {}", e))
        })?;
        hooks.clone().ok_or_else(|| {
            SimulottoError::Storage(format!(
                "capture hooks for '{}' are not installed; run `simulotto provision`",
                T::TABLE
            ))
        })
    }

    fn save(&self, rows: &Rows<T>) -> SimulottoResult<()> {
        write_json_atomic(&self.path, &TableData { rows: sorted(rows) })
    }

    fn write_rows(&self) -> SimulottoResult<RwLockWriteGuard<'_, Rows<T>>> {
        self.rows
            .write()
            .map_err(|e| SimulottoError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn not_found(&self, id: T::Id) -> SimulottoError {
        SimulottoError::NotFound {
            entity_type: T::ENTITY,
            identifier: id.to_string(),
        }
    }
}

fn sorted<T: MonitoredEntity>(rows: &Rows<T>) -> Vec<T> {
    let mut list: Vec<_> = rows.values().cloned().collect();
    list.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.record_id().cmp(&b.record_id()))
    });
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, AuditStore, AuditWriter, MonotonicClock};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Delegates to a store until told to fail
    struct FlakyWriter {
        store: Arc<AuditStore>,
        down: AtomicBool,
    }

    impl AuditWriter for FlakyWriter {
        fn write(&self, record: &AuditRecord) -> SimulottoResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SimulottoError::AuditWrite("audit store unreachable".into()));
            }
            self.store.append(record)
        }
    }

    struct Fixture {
        table: Table<Bet>,
        store: Arc<AuditStore>,
        writer: Arc<FlakyWriter>,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(AuditStore::open(temp.path().join("audit").join("log.jsonl")).unwrap());
        let writer = Arc::new(FlakyWriter {
            store: Arc::clone(&store),
            down: AtomicBool::new(false),
        });
        let table = Table::<Bet>::new(temp.path().join("data").join("bets.json"), true);
        table
            .install_hooks(Arc::new(ChangeInterceptor::new(
                writer.clone(),
                MonotonicClock::new(),
            )))
            .unwrap();
        Fixture {
            table,
            store,
            writer,
            _temp: temp,
        }
    }

    fn bet(numbers: Vec<u8>) -> Bet {
        Bet::new(UserId::new(), GameTypeId::new(), numbers)
    }

    #[test]
    fn test_each_mutation_is_captured() {
        let f = fixture();
        let b = f.table.insert(bet(vec![1, 2, 3, 4, 5, 6])).unwrap();
        f.table
            .update(b.id, |row| {
                row.set_numbers(vec![6, 12, 24, 36, 48, 54]);
                Ok(())
            })
            .unwrap();
        f.table.delete(b.id).unwrap();

        let events: Vec<_> = f
            .store
            .scan(|r| r.source_record_id() == b.id.full())
            .unwrap()
            .iter()
            .map(|r| r.event())
            .collect();
        assert_eq!(
            events,
            vec![AuditEvent::Insert, AuditEvent::Update, AuditEvent::Delete]
        );
        assert_eq!(f.table.count().unwrap(), 0);
    }

    #[test]
    fn test_failed_capture_leaves_no_insert() {
        let f = fixture();
        f.writer.down.store(true, Ordering::SeqCst);

        let err = f.table.insert(bet(vec![1, 2, 3])).unwrap_err();
        assert!(err.is_audit_write());
        assert_eq!(f.table.count().unwrap(), 0);
        assert!(!f.table.path().exists());
        assert_eq!(f.store.count().unwrap(), 0);
    }

    #[test]
    fn test_failed_capture_leaves_update_unapplied() {
        let f = fixture();
        let b = f.table.insert(bet(vec![1, 2, 3])).unwrap();
        f.writer.down.store(true, Ordering::SeqCst);

        let err = f
            .table
            .update(b.id, |row| {
                row.set_numbers(vec![4, 5, 6]);
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_audit_write());
        assert_eq!(f.table.get(b.id).unwrap().unwrap().numbers, vec![1, 2, 3]);

        // What is on disk agrees with memory
        f.table.load().unwrap();
        assert_eq!(f.table.get(b.id).unwrap().unwrap().numbers, vec![1, 2, 3]);
        assert_eq!(f.store.count().unwrap(), 1);
    }

    #[test]
    fn test_failed_change_writes_nothing() {
        let f = fixture();
        let b = f.table.insert(bet(vec![1, 2, 3])).unwrap();

        let err = f
            .table
            .update(b.id, |_| Err(SimulottoError::Validation("no".into())))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.store.count().unwrap(), 1);
    }

    #[test]
    fn test_missing_hooks_refuse_mutations() {
        let f = fixture();
        f.table.uninstall_hooks().unwrap();

        let err = f.table.insert(bet(vec![1])).unwrap_err();
        assert!(matches!(err, SimulottoError::Storage(_)));
        assert_eq!(f.table.count().unwrap(), 0);
    }

    #[test]
    fn test_unmonitored_table_skips_capture() {
        let temp = TempDir::new().unwrap();
        let table = Table::<User>::new(temp.path().join("users.json"), false);

        let user = table.insert(User::new("Ana", "ana@example.com")).unwrap();
        table.delete(user.id).unwrap();
        assert_eq!(table.count().unwrap(), 0);
    }

    #[test]
    fn test_missing_row() {
        let f = fixture();
        let err = f.table.delete(BetId::new()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(f.store.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_insert() {
        let f = fixture();
        let b = f.table.insert(bet(vec![1])).unwrap();
        let err = f.table.insert(b).unwrap_err();
        assert!(matches!(err, SimulottoError::Duplicate { .. }));
        assert_eq!(f.store.count().unwrap(), 1);
    }

    #[test]
    fn test_reload_from_disk() {
        let f = fixture();
        let b = f.table.insert(bet(vec![9, 8, 7])).unwrap();

        let reopened = Table::<Bet>::new(f.table.path().to_path_buf(), true);
        reopened.load().unwrap();
        assert_eq!(reopened.get(b.id).unwrap(), Some(b));
    }

    #[test]
    fn test_find_by_short_or_full_id() {
        let f = fixture();
        let b = f.table.insert(bet(vec![1])).unwrap();

        assert_eq!(f.table.find(&b.id.to_string()).unwrap(), Some(b.clone()));
        assert_eq!(f.table.find(&b.id.full()).unwrap(), Some(b));
        assert!(f.table.find("bet-00000000").unwrap().is_none());
    }

    #[test]
    fn test_reset_clears_rows_without_capture() {
        let f = fixture();
        f.table.insert(bet(vec![1])).unwrap();
        f.table.reset().unwrap();

        assert_eq!(f.table.count().unwrap(), 0);
        assert!(!f.table.path().exists());
        assert_eq!(f.store.count().unwrap(), 1);
    }

    #[test]
    fn test_table_names_are_known_to_settings() {
        use crate::config::DOMAIN_TABLES;

        for table in [User::TABLE, GameType::TABLE, Draw::TABLE, Bet::TABLE] {
            assert!(DOMAIN_TABLES.contains(&table), "{} missing", table);
        }
    }

    /// Reads the table file from disk on every write, as another process would
    struct OnDiskWitness {
        table_path: PathBuf,
        store: Arc<AuditStore>,
        seen: Mutex<Vec<Vec<Bet>>>,
    }

    impl AuditWriter for OnDiskWitness {
        fn write(&self, record: &AuditRecord) -> SimulottoResult<()> {
            let other = Table::<Bet>::new(self.table_path.clone(), false);
            other.load()?;
            self.seen.lock().unwrap().push(other.list()?);
            self.store.append(record)
        }
    }

    #[test]
    fn test_table_file_is_unchanged_until_audit_record_is_durable() {
        let temp = TempDir::new().unwrap();
        let table_path = temp.path().join("data").join("bets.json");
        let store = Arc::new(AuditStore::open(temp.path().join("audit.jsonl")).unwrap());
        let witness = Arc::new(OnDiskWitness {
            table_path: table_path.clone(),
            store: Arc::clone(&store),
            seen: Mutex::new(Vec::new()),
        });
        let table = Table::<Bet>::new(table_path, true);
        table
            .install_hooks(Arc::new(ChangeInterceptor::new(
                witness.clone(),
                MonotonicClock::new(),
            )))
            .unwrap();

        let b = table.insert(bet(vec![1, 2, 3, 4, 5, 6])).unwrap();
        table
            .update(b.id, |row| {
                row.set_numbers(vec![6, 12, 24, 36, 48, 54]);
                Ok(())
            })
            .unwrap();
        table.delete(b.id).unwrap();

        let seen = witness.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is_empty());
        assert_eq!(seen[1].len(), 1);
        assert_eq!(seen[1][0].numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(seen[2].len(), 1);
        assert_eq!(seen[2][0].numbers, vec![6, 12, 24, 36, 48, 54]);
        assert_eq!(store.count().unwrap(), 3);
    }

    /// A row whose state cannot be written as a field mapping once `marks`
    /// has entries: JSON object keys must be strings
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Ticket {
        id: BetId,
        created_at: DateTime<Utc>,
        marks: HashMap<(u8, u8), u8>,
    }

    impl MonitoredEntity for Ticket {
        type Id = BetId;
        const TABLE: &'static str = "tickets";
        const ENTITY: &'static str = "Ticket";

        fn id(&self) -> BetId {
            self.id
        }

        fn record_id(&self) -> String {
            self.id.full()
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn ticket(marks: &[((u8, u8), u8)]) -> Ticket {
        Ticket {
            id: BetId::new(),
            created_at: Utc::now(),
            marks: marks.iter().copied().collect(),
        }
    }

    fn ticket_table(temp: &TempDir, store: &Arc<AuditStore>) -> Table<Ticket> {
        let table = Table::<Ticket>::new(temp.path().join("data").join("tickets.json"), true);
        table
            .install_hooks(Arc::new(ChangeInterceptor::new(
                store.clone(),
                MonotonicClock::new(),
            )))
            .unwrap();
        table
    }

    #[test]
    fn test_unserializable_insert_is_not_applied() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(AuditStore::open(temp.path().join("audit.jsonl")).unwrap());
        let table = ticket_table(&temp, &store);

        let err = table.insert(ticket(&[((1, 2), 3)])).unwrap_err();

        assert!(err.is_serialization());
        assert_eq!(table.count().unwrap(), 0);
        assert!(!table.path().exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_unserializable_update_is_not_applied() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(AuditStore::open(temp.path().join("audit.jsonl")).unwrap());
        let table = ticket_table(&temp, &store);

        let t = table.insert(ticket(&[])).unwrap();
        let err = table
            .update(t.id, |row| {
                row.marks.insert((4, 5), 6);
                Ok(())
            })
            .unwrap_err();

        assert!(err.is_serialization());
        assert!(table.get(t.id).unwrap().unwrap().marks.is_empty());
        table.load().unwrap();
        assert!(table.get(t.id).unwrap().unwrap().marks.is_empty());
        assert_eq!(store.count().unwrap(), 1);
    }
}
