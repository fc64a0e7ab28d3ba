//! Immutability guard for the audit store
//!
//! Every statement that reaches the audit log passes through the guard. Only
//! appends of a record with an unused identifier are admitted; anything that
//! would change or remove an existing record is refused, whoever sends it.

use serde_json::Value;
use tracing::warn;

use super::record::AuditRecord;
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::AuditRecordId;

/// A statement addressed to the audit store
#[derive(Debug, Clone)]
pub enum StoreStatement {
    /// Add a new record
    Append(AuditRecord),
    /// Overwrite one field of an existing record
    Update {
        id: AuditRecordId,
        field: String,
        value: Value,
    },
    /// Remove an existing record
    Delete { id: AuditRecordId },
}

/// Admits appends, rejects modifications
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmutabilityGuard;

impl ImmutabilityGuard {
    /// Check a statement before it touches storage
    ///
    /// `exists` reports whether a record id is already stored. On success the
    /// record to append is handed back.
    pub fn admit(
        &self,
        statement: StoreStatement,
        exists: impl Fn(&AuditRecordId) -> bool,
    ) -> SimulottoResult<AuditRecord> {
        match statement {
            StoreStatement::Append(record) => {
                if exists(&record.id()) {
                    warn!(record_id = %record.id().full(), "rejected append reusing an audit record id");
                    return Err(SimulottoError::immutable(record.id().full()));
                }

                if !record.verify_integrity() {
                    return Err(SimulottoError::AuditWrite(format!(
                        "digest of audit record {} does not match its payload",
                        record.id().full()
                    )));
                }

                Ok(record)
            }
            StoreStatement::Update { id, field, .. } => {
                warn!(record_id = %id.full(), field = %field, "rejected update of audit record");
                Err(SimulottoError::immutable(id.full()))
            }
            StoreStatement::Delete { id } => {
                warn!(record_id = %id.full(), "rejected delete of audit record");
                Err(SimulottoError::immutable(id.full()))
            }
        }
    }
}
