//! Export of audit records
//!
//! Query results can be written as:
//! - CSV: one row per record, spreadsheet-compatible
//! - JSON: machine-readable, with export metadata
//! - YAML: human-readable, same structure as JSON

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_records_csv;
pub use self::json::{export_records_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::export_records_yaml;
