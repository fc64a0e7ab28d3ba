//! Configuration module for Simulotto
//!
//! This module provides configuration management including:
//! - Path resolution for the domain and audit stores
//! - Settings persistence (store descriptors, monitored tables)

pub mod paths;
pub mod settings;

pub use paths::SimulottoPaths;
pub use settings::{AuditStoreConfig, DomainStoreConfig, Settings, DOMAIN_TABLES};
