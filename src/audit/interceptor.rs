//! Change event interceptor
//!
//! The single point through which mutations of monitored entities are
//! observed. A capture is split in two so the domain store can keep it
//! inside its own unit of work:
//!
//! 1. [`ChangeInterceptor::prepare`] canonicalizes the snapshot, seals it with
//!    its digest and builds the record. Nothing is persisted yet, so a
//!    serialization failure leaves both stores untouched.
//! 2. [`ChangeInterceptor::deliver`] hands the record to the writer and
//!    blocks until it is durable or the write failed.
//!
//! Ordering per entity comes from the caller: the domain table holds its
//! write lock across both steps.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::canonical::{canonicalize, canonicalize_update, state_of, RecordState};
use super::hasher::SealedPayload;
use super::record::{AuditEvent, AuditRecord, MonotonicClock, RecordBuilder};
use super::writer::AuditWriter;
use crate::error::{SimulottoError, SimulottoResult};

/// Before/after state of one mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredEntitySnapshot {
    pub table: String,
    pub record_id: String,
    pub event: AuditEvent,
    pub before: Option<RecordState>,
    pub after: Option<RecordState>,
}

impl MonitoredEntitySnapshot {
    /// Snapshot of a newly inserted entity
    pub fn insert<T: Serialize>(
        table: &str,
        record_id: impl Into<String>,
        after: &T,
    ) -> SimulottoResult<Self> {
        Ok(Self {
            table: table.to_string(),
            record_id: record_id.into(),
            event: AuditEvent::Insert,
            before: None,
            after: Some(state_of(after)?),
        })
    }

    /// Snapshot of an entity before and after an update
    pub fn update<T: Serialize>(
        table: &str,
        record_id: impl Into<String>,
        before: &T,
        after: &T,
    ) -> SimulottoResult<Self> {
        Ok(Self {
            table: table.to_string(),
            record_id: record_id.into(),
            event: AuditEvent::Update,
            before: Some(state_of(before)?),
            after: Some(state_of(after)?),
        })
    }

    /// Snapshot of an entity immediately before removal
    pub fn delete<T: Serialize>(
        table: &str,
        record_id: impl Into<String>,
        before: &T,
    ) -> SimulottoResult<Self> {
        Ok(Self {
            table: table.to_string(),
            record_id: record_id.into(),
            event: AuditEvent::Delete,
            before: Some(state_of(before)?),
            after: None,
        })
    }

    /// Check the before/after pair against the event kind
    pub fn validate(&self) -> SimulottoResult<()> {
        if self.event.has_before() != self.before.is_some() {
            return Err(SimulottoError::Validation(format!(
                "{} capture on '{}' {} a prior state",
                self.event,
                self.table,
                if self.event.has_before() { "requires" } else { "must not carry" }
            )));
        }

        if self.event.has_after() != self.after.is_some() {
            return Err(SimulottoError::Validation(format!(
                "{} capture on '{}' {} a new state",
                self.event,
                self.table,
                if self.event.has_after() { "requires" } else { "must not carry" }
            )));
        }

        Ok(())
    }

    /// The canonical payload text for this capture
    pub fn canonical_payload(&self) -> SimulottoResult<String> {
        self.validate()?;
        match (&self.before, &self.after) {
            (None, Some(after)) => canonicalize(after),
            (Some(before), Some(after)) => canonicalize_update(before, after),
            (Some(before), None) => canonicalize(before),
            (None, None) => Err(SimulottoError::Validation(format!(
                "capture on '{}' has no state at all",
                self.table
            ))),
        }
    }
}

/// Turns snapshots into durable audit records
pub struct ChangeInterceptor {
    writer: Arc<dyn AuditWriter>,
    builder: RecordBuilder,
}

impl ChangeInterceptor {
    pub fn new(writer: Arc<dyn AuditWriter>, clock: MonotonicClock) -> Self {
        Self {
            writer,
            builder: RecordBuilder::new(clock),
        }
    }

    /// Serialize, hash and build the record for a snapshot
    pub fn prepare(&self, snapshot: &MonitoredEntitySnapshot) -> SimulottoResult<AuditRecord> {
        let payload = SealedPayload::seal(snapshot.canonical_payload()?);
        self.builder.build(
            snapshot.event,
            &snapshot.table,
            &snapshot.record_id,
            payload,
        )
    }

    /// Durably write a prepared record
    pub fn deliver(&self, record: &AuditRecord) -> SimulottoResult<()> {
        match self.writer.write(record) {
            Ok(()) => {
                debug!(
                    record_id = %record.id().full(),
                    event = record.event().as_str(),
                    table = record.source_table(),
                    source_record_id = record.source_record_id(),
                    "captured mutation"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    record_id = %record.id().full(),
                    table = record.source_table(),
                    error = %e,
                    "audit capture failed"
                );
                Err(e)
            }
        }
    }

    /// Prepare and deliver in one step
    pub fn capture(&self, snapshot: &MonitoredEntitySnapshot) -> SimulottoResult<AuditRecord> {
        let record = self.prepare(snapshot)?;
        self.deliver(&record)?;
        Ok(record)
    }
}
