//! Path management for Simulotto
//!
//! Resolves where the domain store and the audit store live on disk. The two
//! stores are kept in sibling directories so they can be placed on different
//! volumes by pointing the settings at another location.
//!
//! ## Path Resolution Order
//!
//! 1. `SIMULOTTO_DATA_DIR` environment variable (if set)
//! 2. The platform configuration directory reported by `directories`

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::SimulottoError;

/// Manages all paths used by Simulotto
#[derive(Debug, Clone)]
pub struct SimulottoPaths {
    /// Base directory for all Simulotto data
    base_dir: PathBuf,
}

impl SimulottoPaths {
    /// Create a new SimulottoPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no platform configuration directory can be found.
    pub fn new() -> Result<Self, SimulottoError> {
        let base_dir = if let Ok(custom) = std::env::var("SIMULOTTO_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create SimulottoPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Default location of the domain store tables
    pub fn domain_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Default location of the audit store
    pub fn audit_dir(&self) -> PathBuf {
        self.base_dir.join("audit")
    }

    /// Default path of the append-only audit log
    pub fn audit_log(&self) -> PathBuf {
        self.audit_dir().join("audit_records.jsonl")
    }

    /// Ensure the base directory exists
    pub fn ensure_base_dir(&self) -> Result<(), SimulottoError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SimulottoError::Io(format!("Failed to create base directory: {}", e)))
    }
}

/// Resolve the default data directory path based on platform
fn resolve_default_path() -> Result<PathBuf, SimulottoError> {
    ProjectDirs::from("", "", "simulotto")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| SimulottoError::Config("Could not determine a home directory".into()))
}
