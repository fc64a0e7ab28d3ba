//! Integrity verification over stored records

use serde::Serialize;
use tracing::warn;

use super::hasher::IntegrityDigest;
use super::record::AuditRecord;
use super::store::AuditStore;
use crate::error::SimulottoResult;
use crate::models::AuditRecordId;

/// Why a record failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperReason {
    /// Digest is well formed but does not match the payload
    DigestMismatch,
    /// Digest is not 64 lowercase hex characters
    MalformedDigest,
}

impl std::fmt::Display for TamperReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TamperReason::DigestMismatch => write!(f, "digest does not match payload"),
            TamperReason::MalformedDigest => write!(f, "malformed digest"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TamperedRecord {
    pub id: AuditRecordId,
    pub source_table: String,
    pub source_record_id: String,
    pub reason: TamperReason,
}

/// Outcome of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub tampered: Vec<TamperedRecord>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.tampered.is_empty()
    }
}

/// Check one record's digest against its payload
pub fn check_record(record: &AuditRecord) -> Option<TamperReason> {
    let digest = record.integrity_digest();
    if !digest.is_well_formed() {
        Some(TamperReason::MalformedDigest)
    } else if *digest != IntegrityDigest::of(record.payload()) {
        Some(TamperReason::DigestMismatch)
    } else {
        None
    }
}

/// Verify a set of records
pub fn verify_records<'a>(records: impl IntoIterator<Item = &'a AuditRecord>) -> IntegrityReport {
    let mut report = IntegrityReport::default();

    for record in records {
        report.checked += 1;
        if let Some(reason) = check_record(record) {
            warn!(record_id = %record.id().full(), %reason, "audit record failed verification");
            report.tampered.push(TamperedRecord {
                id: record.id(),
                source_table: record.source_table().to_string(),
                source_record_id: record.source_record_id().to_string(),
                reason,
            });
        }
    }

    report
}

/// Verify every record in the store
pub fn verify_store(store: &AuditStore) -> SimulottoResult<IntegrityReport> {
    let records = store.scan(|_| true)?;
    Ok(verify_records(&records))
}
