//! Audit trail engine for Simulotto
//!
//! Every insert, update and delete on a monitored table produces one
//! immutable, integrity-verifiable record in a separate append-only store.
//!
//! # Architecture
//!
//! - `canonical`: record state to deterministic text
//! - `hasher`: SHA-256 digest over the canonical text
//! - `record`: the `AuditRecord` and its builder
//! - `interceptor`: captures mutations and hands records to the writer
//! - `writer`: durable, time-bounded writes into the audit store
//! - `guard`: refuses any update or delete of stored records
//! - `store`: the append-only JSONL log
//! - `query`: read-only retrieval with filters
//! - `verify` / `diff`: tooling over stored records
//!
//! # Example
//!
//! ```rust,ignore
//! use simulotto::audit::{AuditQuery, AuditReader};
//!
//! let reader = AuditReader::new(storage.audit_store());
//! for record in reader.query(&AuditQuery::for_entity("bets", bet_id))? {
//!     println!("{}", record.format_human_readable());
//! }
//! ```

mod canonical;
mod diff;
mod guard;
mod hasher;
mod interceptor;
mod query;
mod record;
mod store;
mod verify;
mod writer;

pub use canonical::{canonicalize, canonicalize_update, state_of, RecordState};
pub use diff::{field_changes, record_changes, summarize, FieldChange};
pub use guard::{ImmutabilityGuard, StoreStatement};
pub use hasher::{IntegrityDigest, SealedPayload};
pub use interceptor::{ChangeInterceptor, MonitoredEntitySnapshot};
pub use query::{AuditQuery, AuditReader, QueryParams, SortOrder};
pub use record::{AuditEvent, AuditRecord, MonotonicClock, RecordBuilder};
pub use store::{AuditSchema, AuditStore, AUDIT_SCHEMA_VERSION};
pub use verify::{check_record, verify_records, verify_store, IntegrityReport, TamperReason, TamperedRecord};
pub use writer::{AuditStoreWriter, AuditWriter};

#[cfg(test)]
pub(crate) use record::forge_record;
