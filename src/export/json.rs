//! JSON export of audit records

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::AuditRecord;
use crate::error::{SimulottoError, SimulottoResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Exported query result
#[derive(Debug, Clone, Serialize)]
pub struct AuditExport<'a> {
    /// Schema version for compatibility checking
    pub schema_version: &'static str,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: &'static str,

    pub record_count: usize,

    /// Capture time of the oldest and newest exported record
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,

    pub records: &'a [AuditRecord],
}

impl<'a> AuditExport<'a> {
    pub fn new(records: &'a [AuditRecord]) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION"),
            record_count: records.len(),
            earliest: records.iter().map(|r| r.created_at()).min(),
            latest: records.iter().map(|r| r.created_at()).max(),
            records,
        }
    }
}

/// Write records as pretty-printed JSON
pub fn export_records_json<W: Write>(
    records: &[AuditRecord],
    writer: &mut W,
) -> SimulottoResult<()> {
    serde_json::to_writer_pretty(&mut *writer, &AuditExport::new(records))
        .map_err(|e| SimulottoError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| SimulottoError::Export(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEvent, RecordBuilder, SealedPayload};

    #[test]
    fn test_json_export_keeps_payload_and_digest() {
        let record = RecordBuilder::default()
            .build(
                AuditEvent::Insert,
                "bets",
                "b-1",
                SealedPayload::seal(r#"{"numbers":[1,2,3]}"#.to_string()),
            )
            .unwrap();

        let mut out = Vec::new();
        export_records_json(std::slice::from_ref(&record), &mut out).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["schema_version"], EXPORT_SCHEMA_VERSION);
        assert_eq!(doc["record_count"], 1);
        assert_eq!(doc["records"][0]["payload"], record.payload());
        assert_eq!(
            doc["records"][0]["integrity_digest"],
            record.integrity_digest().as_str()
        );
    }
}
