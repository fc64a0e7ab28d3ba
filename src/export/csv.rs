//! CSV export of audit records

use std::io::Write;

use chrono::SecondsFormat;

use crate::audit::AuditRecord;
use crate::error::{SimulottoError, SimulottoResult};

const HEADER: [&str; 7] = [
    "id",
    "created_at",
    "event",
    "source_table",
    "source_record_id",
    "integrity_digest",
    "payload",
];

/// Write one CSV row per record
pub fn export_records_csv<W: Write>(
    records: &[AuditRecord],
    writer: &mut W,
) -> SimulottoResult<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    csv_writer
        .write_record(HEADER)
        .map_err(|e| SimulottoError::Export(e.to_string()))?;

    for record in records {
        csv_writer
            .write_record([
                record.id().full().as_str(),
                record
                    .created_at()
                    .to_rfc3339_opts(SecondsFormat::Micros, true)
                    .as_str(),
                record.event().as_str(),
                record.source_table(),
                record.source_record_id(),
                record.integrity_digest().as_str(),
                record.payload(),
            ])
            .map_err(|e| SimulottoError::Export(e.to_string()))?;
    }

    csv_writer
        .flush()
        .map_err(|e| SimulottoError::Export(e.to_string()))?;

    Ok(())
}
