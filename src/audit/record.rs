//! Audit record data structures
//!
//! Defines the event kinds, the immutable audit record, and the builder that
//! assembles records at capture time.

use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hasher::{IntegrityDigest, SealedPayload};
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::AuditRecordId;

/// Kinds of mutation that are captured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEvent {
    /// Entity was inserted
    Insert,
    /// Entity was updated
    Update,
    /// Entity was deleted
    Delete,
}

impl AuditEvent {
    /// Whether a capture of this kind carries the prior state
    pub fn has_before(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }

    /// Whether a capture of this kind carries the new state
    pub fn has_after(&self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            AuditEvent::Insert => "INSERT",
            AuditEvent::Update => "UPDATE",
            AuditEvent::Delete => "DELETE",
        })
    }
}

impl FromStr for AuditEvent {
    type Err = SimulottoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(SimulottoError::Query(format!(
                "unknown event '{}', expected insert, update or delete",
                other
            ))),
        }
    }
}

/// A single captured mutation
///
/// Fields are private: once built, a record can only be read. The payload is
/// kept as the exact canonical text that was hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    id: AuditRecordId,
    event: AuditEvent,
    source_table: String,
    source_record_id: String,
    payload: String,
    integrity_digest: IntegrityDigest,
    created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn id(&self) -> AuditRecordId {
        self.id
    }

    pub fn event(&self) -> AuditEvent {
        self.event
    }

    pub fn source_table(&self) -> &str {
        &self.source_table
    }

    pub fn source_record_id(&self) -> &str {
        &self.source_record_id
    }

    /// The canonical payload text, exactly as hashed
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn integrity_digest(&self) -> &IntegrityDigest {
        &self.integrity_digest
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Parse the payload into a structured document
    pub fn payload_document(&self) -> SimulottoResult<serde_json::Value> {
        serde_json::from_str(&self.payload).map_err(|e| {
            SimulottoError::Json(format!(
                "payload of audit record {} is not valid JSON: {}",
                self.id.full(),
                e
            ))
        })
    }

    /// Recompute the digest and compare it with the stored one
    pub fn verify_integrity(&self) -> bool {
        self.integrity_digest.is_well_formed() && self.integrity_digest.matches(&self.payload)
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        format!(
            "[{}] {} {} {} ({})",
            self.created_at.format("%Y-%m-%d %H:%M:%S%.6f UTC"),
            self.event,
            self.source_table,
            self.source_record_id,
            self.id
        )
    }
}

/// Capture timestamps that never go backwards
///
/// Lock-free: concurrent captures may share a timestamp, but a later call
/// never observes an earlier one.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that never issues a timestamp before `floor`
    pub fn starting_at(floor: DateTime<Utc>) -> Self {
        Self {
            last_micros: AtomicI64::new(floor.timestamp_micros()),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let micros = now.timestamp_micros();
        let previous = self.last_micros.fetch_max(micros, Ordering::SeqCst);
        DateTime::<Utc>::from_timestamp_micros(micros.max(previous)).unwrap_or(now)
    }
}

/// Assembles audit records from sealed payloads
#[derive(Debug, Default)]
pub struct RecordBuilder {
    clock: MonotonicClock,
}

impl RecordBuilder {
    pub fn new(clock: MonotonicClock) -> Self {
        Self { clock }
    }

    /// Build a record with a fresh identifier and capture timestamp
    pub fn build(
        &self,
        event: AuditEvent,
        source_table: &str,
        source_record_id: &str,
        payload: SealedPayload,
    ) -> SimulottoResult<AuditRecord> {
        if source_table.trim().is_empty() {
            return Err(SimulottoError::Validation(
                "audit record needs a source table".into(),
            ));
        }

        if source_record_id.trim().is_empty() {
            return Err(SimulottoError::Validation(format!(
                "{} on '{}' has no source record id",
                event, source_table
            )));
        }

        let (payload, integrity_digest) = payload.into_parts();

        Ok(AuditRecord {
            id: AuditRecordId::new(),
            event,
            source_table: source_table.to_string(),
            source_record_id: source_record_id.to_string(),
            payload,
            integrity_digest,
            created_at: self.clock.now(),
        })
    }
}

#[cfg(test)]
pub(crate) fn forge_record(record: &AuditRecord, payload: &str) -> AuditRecord {
    AuditRecord {
        payload: payload.to_string(),
        ..record.clone()
    }
}
