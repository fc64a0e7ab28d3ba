//! Settings for Simulotto
//!
//! Holds the connection descriptors of the two storage domains. They are
//! loaded once at startup and handed to the storage layer explicitly; nothing
//! reads them from global state afterwards.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::SimulottoPaths;
use crate::error::SimulottoError;

/// Where the domain tables live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainStoreConfig {
    /// Directory holding one JSON file per table
    pub data_dir: PathBuf,
}

/// Where audit records are written and how long a write may take
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStoreConfig {
    /// Append-only log file
    pub log_path: PathBuf,

    /// Upper bound for a single write, in milliseconds
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl AuditStoreConfig {
    /// The write timeout as a duration
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Domain store connection descriptor
    pub domain_store: DomainStoreConfig,

    /// Audit store connection descriptor
    pub audit_store: AuditStoreConfig,

    /// Tables whose mutations must be captured
    #[serde(default = "default_monitored_tables")]
    pub monitored_tables: Vec<String>,
}

/// Every table of the domain store
pub const DOMAIN_TABLES: [&str; 4] = ["users", "game_types", "draws", "bets"];

fn default_schema_version() -> u32 {
    1
}

fn default_write_timeout_ms() -> u64 {
    5_000
}

fn default_monitored_tables() -> Vec<String> {
    vec!["bets".into(), "draws".into(), "game_types".into()]
}

impl Settings {
    /// Default settings rooted at the given paths
    pub fn defaults_for(paths: &SimulottoPaths) -> Self {
        Self {
            schema_version: default_schema_version(),
            domain_store: DomainStoreConfig {
                data_dir: paths.domain_dir(),
            },
            audit_store: AuditStoreConfig {
                log_path: paths.audit_log(),
                write_timeout_ms: default_write_timeout_ms(),
            },
            monitored_tables: default_monitored_tables(),
        }
    }

    /// Whether mutations of `table` are captured
    pub fn is_monitored(&self, table: &str) -> bool {
        self.monitored_tables.iter().any(|t| t == table)
    }

    /// Load settings from disk, or build defaults if the file doesn't exist
    pub fn load_or_create(paths: &SimulottoPaths) -> Result<Self, SimulottoError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                SimulottoError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                SimulottoError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::defaults_for(paths))
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SimulottoPaths) -> Result<(), SimulottoError> {
        paths.ensure_base_dir()?;

        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SimulottoError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| SimulottoError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject descriptors that would collapse the two stores into one, and
    /// monitored table names that match no table
    pub fn validate(&self) -> Result<(), SimulottoError> {
        if let Some(unknown) = self
            .monitored_tables
            .iter()
            .find(|t| !DOMAIN_TABLES.contains(&t.as_str()))
        {
            return Err(SimulottoError::Config(format!(
                "unknown monitored table '{}', expected one of: {}",
                unknown,
                DOMAIN_TABLES.join(", ")
            )));
        }

        if self.audit_store.write_timeout_ms == 0 {
            return Err(SimulottoError::Config(
                "audit_store.write_timeout_ms must be greater than zero".into(),
            ));
        }

        if self.audit_store.log_path.starts_with(&self.domain_store.data_dir) {
            return Err(SimulottoError::Config(
                "audit store must not live inside the domain store directory".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::defaults_for(&paths);

        assert_eq!(settings.audit_store.write_timeout(), Duration::from_secs(5));
        assert!(settings.is_monitored("bets"));
        assert!(settings.is_monitored("game_types"));
        assert!(!settings.is_monitored("users"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::defaults_for(&paths);
        settings.audit_store.write_timeout_ms = 250;
        settings.monitored_tables.push("users".into());
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.audit_store.write_timeout_ms, 250);
        assert!(loaded.is_monitored("users"));
    }

    #[test]
    fn test_audit_store_inside_domain_store_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::defaults_for(&paths);
        settings.audit_store.log_path = paths.domain_dir().join("audit.jsonl");

        assert!(matches!(
            settings.validate(),
            Err(SimulottoError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_monitored_table_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SimulottoPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::defaults_for(&paths);
        settings.monitored_tables = vec!["bet".into(), "draws".into()];
        settings.save(&paths).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, SimulottoError::Config(_)));
        assert!(err.to_string().contains("'bet'"));
    }
}
