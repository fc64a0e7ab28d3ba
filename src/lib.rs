//! Simulotto - lottery simulator with a tamper-evident audit trail
//!
//! The domain side is small: users, game definitions, draws and
//! bets stored as JSON tables. What matters is the audit trail around it:
//! every insert, update and delete on a monitored table produces one
//! immutable record in a separate append-only store, sealed with a SHA-256
//! digest of its canonical payload.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths and the two store descriptors
//! - `error`: Custom error types
//! - `models`: Domain entities
//! - `audit`: Capture, hashing, the append-only store and queries
//! - `storage`: JSON tables wired to the capture hooks, provisioning
//! - `services`: Business rules on top of storage
//! - `export`: CSV/JSON/YAML export of audit records
//! - `display`, `cli`: Terminal output and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use simulotto::config::{Settings, SimulottoPaths};
//! use simulotto::storage::{provision, Storage};
//!
//! let paths = SimulottoPaths::new()?;
//! let storage = Storage::open(Settings::load_or_create(&paths)?)?;
//! provision(&storage)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{SimulottoError, SimulottoResult};
