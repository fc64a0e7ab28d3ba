//! Audit trail CLI commands
//!
//! Read-only access to the audit store: listing, record details, entity
//! history, integrity verification and export.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::audit::{verify_store, QueryParams};
use crate::display::{format_integrity_report, format_record_details, format_record_list};
use crate::error::{SimulottoError, SimulottoResult};
use crate::export::{export_records_csv, export_records_json, export_records_yaml};
use crate::storage::Storage;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// One row per record
    Csv,
    /// Records with export metadata
    Json,
    /// Same as JSON, human-readable
    Yaml,
}

/// Filters shared by `list` and `export`
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Source table (bets, draws, game_types, ...)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Source record id (full UUID)
    #[arg(short, long)]
    pub record: Option<String>,

    /// Event kind: insert, update or delete
    #[arg(short, long)]
    pub event: Option<String>,

    /// Captured at or after (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Captured at or before (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Newest first
    #[arg(long)]
    pub desc: bool,

    /// Maximum number of records
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl From<FilterArgs> for QueryParams {
    fn from(args: FilterArgs) -> Self {
        Self {
            table: args.table,
            record_id: args.record,
            event: args.event,
            from: args.from,
            to: args.to,
            descending: args.desc,
            limit: args.limit,
        }
    }
}

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// List audit records
    List {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show one audit record
    Show {
        /// Audit record ID
        id: String,
    },
    /// Show every record for one entity, oldest first
    History {
        /// Source table
        table: String,
        /// Source record id (full UUID)
        record: String,
    },
    /// Recompute every digest and report tampered records
    Verify,
    /// Export audit records
    Export {
        /// Output file, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "json")]
        format: ExportFormat,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Handle an audit command
pub fn handle_audit_command(storage: &Storage, cmd: AuditCommands) -> SimulottoResult<()> {
    let reader = storage.audit_reader();

    match cmd {
        AuditCommands::List { filters } => {
            let query = QueryParams::from(filters).into_query()?;
            print!("{}", format_record_list(&reader.query(&query)?));
        }

        AuditCommands::Show { id } => {
            print!("{}", format_record_details(&reader.find(&id)?));
        }

        AuditCommands::History { table, record } => {
            print!("{}", format_record_list(&reader.history(&table, &record)?));
        }

        AuditCommands::Verify => {
            let report = verify_store(storage.audit_store())?;
            println!("{}", format_integrity_report(&report));
            if !report.is_clean() {
                return Err(SimulottoError::Storage(format!(
                    "{} audit record(s) failed verification",
                    report.tampered.len()
                )));
            }
        }

        AuditCommands::Export {
            output,
            format,
            filters,
        } => {
            let query = QueryParams::from(filters).into_query()?;
            let records = reader.query(&query)?;

            let mut writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
                    SimulottoError::Export(format!("Failed to create {}: {}", path.display(), e))
                })?)),
                None => Box::new(io::stdout().lock()),
            };

            match format {
                ExportFormat::Csv => export_records_csv(&records, &mut writer)?,
                ExportFormat::Json => export_records_json(&records, &mut writer)?,
                ExportFormat::Yaml => export_records_yaml(&records, &mut writer)?,
            }
            writer
                .flush()
                .map_err(|e| SimulottoError::Export(e.to_string()))?;

            if let Some(path) = output {
                eprintln!("Exported {} record(s) to {}", records.len(), path.display());
            }
        }
    }

    Ok(())
}
