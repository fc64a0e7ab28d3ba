//! Audit record display formatting
//!
//! Formats audit records for terminal output in table and detail views.

use crate::audit::{summarize, AuditEvent, AuditRecord, IntegrityReport};

/// Format a list of audit records as a table
pub fn format_record_list(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.".to_string();
    }

    let table_width = records
        .iter()
        .map(|r| r.source_table().len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<26}  {:<6}  {:<table_width$}  {:<36}  {}\n",
        "Captured (UTC)",
        "Event",
        "Table",
        "Record",
        "Audit ID",
        table_width = table_width,
    ));
    output.push_str(&format!(
        "{:-<26}  {:-<6}  {:-<table_width$}  {:-<36}  {:-<12}\n",
        "",
        "",
        "",
        "",
        "",
        table_width = table_width,
    ));

    for record in records {
        output.push_str(&format!(
            "{:<26}  {:<6}  {:<table_width$}  {:<36}  {}\n",
            record.created_at().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            record.event(),
            record.source_table(),
            record.source_record_id(),
            record.id(),
            table_width = table_width,
        ));
    }

    output.push_str(&format!("\n{} record(s)\n", records.len()));
    output
}

/// Format one audit record with its payload and integrity status
pub fn format_record_details(record: &AuditRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit record:  {}\n", record.id().full()));
    output.push_str(&format!("Event:         {}\n", record.event()));
    output.push_str(&format!("Table:         {}\n", record.source_table()));
    output.push_str(&format!("Record:        {}\n", record.source_record_id()));
    output.push_str(&format!(
        "Captured:      {}\n",
        record.created_at().format("%Y-%m-%d %H:%M:%S%.6f UTC")
    ));
    output.push_str(&format!("Digest:        {}\n", record.integrity_digest()));
    output.push_str(&format!(
        "Integrity:     {}\n",
        if record.verify_integrity() {
            "OK"
        } else {
            "TAMPERED"
        }
    ));

    if record.event() == AuditEvent::Update {
        match summarize(record) {
            Ok(summary) => output.push_str(&format!("Changes:       {}\n", summary)),
            Err(e) => output.push_str(&format!("Changes:       unavailable ({})\n", e)),
        }
    }

    output.push_str("\nPayload:\n");
    let pretty = record
        .payload_document()
        .ok()
        .and_then(|doc| serde_json::to_string_pretty(&doc).ok())
        .unwrap_or_else(|| record.payload().to_string());
    output.push_str(&pretty);
    output.push('\n');

    output
}

/// Format the outcome of a verification pass
pub fn format_integrity_report(report: &IntegrityReport) -> String {
    if report.is_clean() {
        return format!("All {} audit record(s) verified.", report.checked);
    }

    let mut output = format!(
        "{} of {} audit record(s) FAILED verification:\n",
        report.tampered.len(),
        report.checked
    );
    for tampered in &report.tampered {
        output.push_str(&format!(
            "  {}  {} {}  {}\n",
            tampered.id.full(),
            tampered.source_table,
            tampered.source_record_id,
            tampered.reason
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{verify_records, RecordBuilder, SealedPayload};

    fn record(event: AuditEvent, payload: &str) -> AuditRecord {
        RecordBuilder::default()
            .build(event, "bets", "b-1", SealedPayload::seal(payload.to_string()))
            .unwrap()
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_record_list(&[]), "No audit records found.");
    }

    #[test]
    fn test_list_has_one_row_per_record() {
        let records = vec![
            record(AuditEvent::Insert, "{}"),
            record(AuditEvent::Delete, "{}"),
        ];
        let output = format_record_list(&records);

        assert!(output.contains("INSERT"));
        assert!(output.contains("DELETE"));
        assert!(output.contains("2 record(s)"));
    }

    #[test]
    fn test_details_show_changes() {
        let r = record(
            AuditEvent::Update,
            r#"{"before":{"numbers":[1,2]},"after":{"numbers":[3,4]}}"#,
        );
        let output = format_record_details(&r);

        assert!(output.contains("Integrity:     OK"));
        assert!(output.contains("numbers: [1,2] -> [3,4]"));
    }

    #[test]
    fn test_clean_report() {
        let records = vec![record(AuditEvent::Insert, "{}")];
        let report = verify_records(&records);
        assert_eq!(format_integrity_report(&report), "All 1 audit record(s) verified.");
    }
}
