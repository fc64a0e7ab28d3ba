//! Storage layer for Simulotto
//!
//! Two independent stores: the domain tables (one JSON file per table under
//! the domain data directory) and the append-only audit store. `Storage`
//! opens both from the explicit descriptors in [`Settings`] and wires the
//! capture hooks between them. An open `Storage` holds an exclusive lock on
//! the domain data directory until it is dropped.

pub mod file_io;
pub mod init;
pub mod lock;
pub mod table;

pub use file_io::{read_json, write_json_atomic};
pub use init::{provision, ProvisionReport};
pub use lock::StoreLock;
pub use table::{MonitoredEntity, Table};

use std::fs;
use std::sync::Arc;

use tracing::info;

use crate::audit::{
    AuditReader, AuditStore, AuditStoreWriter, ChangeInterceptor, MonotonicClock,
};
use crate::config::Settings;
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{Bet, Draw, GameType, User};

/// Main storage coordinator that provides access to all tables
pub struct Storage {
    settings: Settings,
    pub users: Table<User>,
    pub game_types: Table<GameType>,
    pub draws: Table<Draw>,
    pub bets: Table<Bet>,
    audit: Arc<AuditStore>,
    writer: Arc<AuditStoreWriter>,
    interceptor: Arc<ChangeInterceptor>,
    _lock: StoreLock,
}

impl Storage {
    /// Open both stores and load the domain tables
    ///
    /// Capture hooks are installed only once the audit schema has been
    /// applied; before that, monitored tables refuse mutations.
    pub fn open(settings: Settings) -> SimulottoResult<Self> {
        settings.validate()?;
        let data_dir = &settings.domain_store.data_dir;
        fs::create_dir_all(data_dir).map_err(|e| {
            SimulottoError::Storage(format!(
                "Failed to create domain store directory {}: {}",
                data_dir.display(),
                e
            ))
        })?;
        let lock = StoreLock::acquire(data_dir)?;

        let audit = Arc::new(AuditStore::open(&settings.audit_store.log_path)?);
        let clock = match audit.latest_created_at()? {
            Some(latest) => MonotonicClock::starting_at(latest),
            None => MonotonicClock::new(),
        };
        let writer = Arc::new(AuditStoreWriter::start(
            Arc::clone(&audit),
            settings.audit_store.write_timeout(),
        )?);
        let interceptor = Arc::new(ChangeInterceptor::new(writer.clone(), clock));

        let storage = Self {
            users: Self::table(&settings),
            game_types: Self::table(&settings),
            draws: Self::table(&settings),
            bets: Self::table(&settings),
            settings,
            audit,
            writer,
            interceptor,
            _lock: lock,
        };

        storage.load_all()?;

        if storage.is_provisioned()? {
            storage.install_hooks()?;
        } else {
            info!("audit store schema not applied; monitored tables are read-only");
        }

        Ok(storage)
    }

    fn table<T: MonitoredEntity>(settings: &Settings) -> Table<T> {
        Table::new(
            settings
                .domain_store
                .data_dir
                .join(format!("{}.json", T::TABLE)),
            settings.is_monitored(T::TABLE),
        )
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The audit store, for reads
    pub fn audit_store(&self) -> &AuditStore {
        &self.audit
    }

    /// Read-only query interface over the audit store
    pub fn audit_reader(&self) -> AuditReader<'_> {
        AuditReader::new(&self.audit)
    }

    /// Load all tables from disk
    pub fn load_all(&self) -> SimulottoResult<()> {
        self.users.load()?;
        self.game_types.load()?;
        self.draws.load()?;
        self.bets.load()?;
        Ok(())
    }

    /// Whether the audit store schema has been applied
    pub fn is_provisioned(&self) -> SimulottoResult<bool> {
        Ok(self.audit.schema()?.is_some())
    }

    /// Attach capture hooks to every monitored table
    pub fn install_hooks(&self) -> SimulottoResult<Vec<&'static str>> {
        let mut hooked = Vec::new();
        self.for_each_monitored(|name, table| {
            table.install(Arc::clone(&self.interceptor))?;
            hooked.push(name);
            Ok(())
        })?;
        info!(tables = ?hooked, "capture hooks installed");
        Ok(hooked)
    }

    /// Detach capture hooks from every table
    pub fn uninstall_hooks(&self) -> SimulottoResult<()> {
        self.users.uninstall_hooks()?;
        self.game_types.uninstall_hooks()?;
        self.draws.uninstall_hooks()?;
        self.bets.uninstall_hooks()?;
        Ok(())
    }

    /// Whether every monitored table has its hooks
    pub fn hooks_installed(&self) -> bool {
        let mut all = true;
        let _ = self.for_each_monitored(|_, table| {
            all &= table.installed();
            Ok(())
        });
        all
    }

    /// Drop all domain rows; nothing is captured
    pub fn reset_domain(&self) -> SimulottoResult<()> {
        self.bets.reset()?;
        self.draws.reset()?;
        self.game_types.reset()?;
        self.users.reset()?;
        Ok(())
    }

    /// Stop the audit writer and close the audit store
    ///
    /// Mutations of monitored tables fail after this.
    pub fn close(&self) -> SimulottoResult<()> {
        self.writer.close()
    }

    fn for_each_monitored(
        &self,
        mut f: impl FnMut(&'static str, &dyn HookedTable) -> SimulottoResult<()>,
    ) -> SimulottoResult<()> {
        let tables: [(&'static str, bool, &dyn HookedTable); 4] = [
            (self.users.name(), self.users.is_monitored(), &self.users),
            (self.game_types.name(), self.game_types.is_monitored(), &self.game_types),
            (self.draws.name(), self.draws.is_monitored(), &self.draws),
            (self.bets.name(), self.bets.is_monitored(), &self.bets),
        ];

        for (name, monitored, table) in tables {
            if monitored {
                f(name, table)?;
            }
        }
        Ok(())
    }
}

/// Hook management without the row type
trait HookedTable {
    fn install(&self, interceptor: Arc<ChangeInterceptor>) -> SimulottoResult<()>;
    fn installed(&self) -> bool;
}

impl<T: MonitoredEntity> HookedTable for Table<T> {
    fn install(&self, interceptor: Arc<ChangeInterceptor>) -> SimulottoResult<()> {
        self.install_hooks(interceptor)
    }

    fn installed(&self) -> bool {
        self.hooks_installed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, AuditQuery};
    use crate::config::SimulottoPaths;
    use crate::models::{GameTypeId, UserId};
    use tempfile::TempDir;

    fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(Settings::defaults_for(&paths)).unwrap();
        provision(&storage).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_storage_creation() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(Settings::defaults_for(&paths)).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("audit").exists());
        assert!(!storage.is_provisioned().unwrap());
        assert!(!storage.hooks_installed());
    }

    #[test]
    fn test_unprovisioned_store_refuses_monitored_mutations() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(Settings::defaults_for(&paths)).unwrap();

        let bet = Bet::new(UserId::new(), GameTypeId::new(), vec![1, 2, 3, 4, 5, 6]);
        assert!(storage.bets.insert(bet).is_err());

        // Users are not monitored
        storage.users.insert(User::new("Ana", "ana@example.com")).unwrap();
    }

    #[test]
    fn test_hooks_come_back_after_reopen() {
        let (storage, temp) = create_test_storage();
        storage.close().unwrap();
        drop(storage);

        let paths = SimulottoPaths::with_base_dir(temp.path().to_path_buf());
        let reopened = Storage::open(Settings::defaults_for(&paths)).unwrap();
        assert!(reopened.hooks_installed());
    }

    #[test]
    fn test_bet_lifecycle_is_fully_audited() {
        let (storage, _temp) = create_test_storage();

        let bet = storage
            .bets
            .insert(Bet::new(UserId::new(), GameTypeId::new(), vec![1, 2, 3, 4, 5, 6]))
            .unwrap();
        storage
            .bets
            .update(bet.id, |b| {
                b.set_numbers(vec![6, 12, 24, 36, 48, 54]);
                Ok(())
            })
            .unwrap();
        storage.bets.delete(bet.id).unwrap();

        let history = storage
            .audit_reader()
            .query(&AuditQuery::for_entity("bets", bet.id.full()))
            .unwrap();
        let events: Vec<_> = history.iter().map(|r| r.event()).collect();
        assert_eq!(
            events,
            vec![AuditEvent::Insert, AuditEvent::Update, AuditEvent::Delete]
        );
        assert!(history.iter().all(|r| r.verify_integrity()));
    }

    #[test]
    fn test_closed_audit_store_fails_mutations() {
        let (storage, _temp) = create_test_storage();
        let bet = storage
            .bets
            .insert(Bet::new(UserId::new(), GameTypeId::new(), vec![1, 2, 3]))
            .unwrap();

        storage.close().unwrap();

        let err = storage.bets.delete(bet.id).unwrap_err();
        assert!(err.is_audit_write());
        assert!(storage.bets.get(bet.id).unwrap().is_some());
        assert_eq!(storage.audit_store().count().unwrap(), 1);
    }

    #[test]
    fn test_clock_resumes_after_latest_record() {
        let (storage, temp) = create_test_storage();
        let first = storage
            .bets
            .insert(Bet::new(UserId::new(), GameTypeId::new(), vec![1]))
            .unwrap();
        storage.close().unwrap();
        drop(storage);

        let paths = SimulottoPaths::with_base_dir(temp.path().to_path_buf());
        let reopened = Storage::open(Settings::defaults_for(&paths)).unwrap();
        reopened
            .bets
            .update(first.id, |b| {
                b.set_numbers(vec![2]);
                Ok(())
            })
            .unwrap();

        let history = reopened
            .audit_reader()
            .history("bets", &first.id.full())
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].created_at() <= history[1].created_at());
        assert_eq!(history[1].event(), AuditEvent::Update);
    }

    #[test]
    fn test_second_storage_on_same_data_dir_is_refused() {
        let (storage, temp) = create_test_storage();
        let paths = SimulottoPaths::with_base_dir(temp.path().to_path_buf());

        let err = Storage::open(Settings::defaults_for(&paths)).err().unwrap();
        assert!(matches!(err, SimulottoError::Storage(_)));

        // The first handle keeps working and nothing it commits is lost
        let bet = storage
            .bets
            .insert(Bet::new(UserId::new(), GameTypeId::new(), vec![1, 2, 3]))
            .unwrap();
        storage.close().unwrap();
        drop(storage);

        let reopened = Storage::open(Settings::defaults_for(&paths)).unwrap();
        assert!(reopened.bets.get(bet.id).unwrap().is_some());
        let history = reopened
            .audit_reader()
            .history("bets", &bet.id.full())
            .unwrap();
        assert_eq!(history.len(), 1);
    }
}
