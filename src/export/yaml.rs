//! YAML export of audit records

use std::io::Write;

use super::json::AuditExport;
use crate::audit::AuditRecord;
use crate::error::{SimulottoError, SimulottoResult};

/// Write records as YAML with a short header
pub fn export_records_yaml<W: Write>(
    records: &[AuditRecord],
    writer: &mut W,
) -> SimulottoResult<()> {
    let export = AuditExport::new(records);

    writeln!(writer, "# Simulotto audit export")
        .and_then(|_| writeln!(writer, "# Generated: {}", export.exported_at))
        .and_then(|_| writeln!(writer, "# Records: {}", export.record_count))
        .and_then(|_| writeln!(writer))
        .map_err(|e| SimulottoError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| SimulottoError::Export(e.to_string()))?;

    Ok(())
}
