//! Schema provisioning
//!
//! Runs in a fixed order: reset the domain tables, apply or upgrade the
//! audit store schema, then install capture hooks on the monitored tables.
//! Existing audit records survive every step.

use serde::Serialize;
use tracing::info;

use crate::audit::AuditSchema;
use crate::error::SimulottoResult;

use super::Storage;

/// What a provisioning run did
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub schema: AuditSchema,
    pub hooked_tables: Vec<&'static str>,
    pub preserved_records: usize,
}

/// Reset the domain store and bring the audit store up to date
pub fn provision(storage: &Storage) -> SimulottoResult<ProvisionReport> {
    // Nothing may be captured while the tables are being reset
    storage.uninstall_hooks()?;

    storage.reset_domain()?;
    info!("domain tables reset");

    let schema = storage.audit_store().apply_schema()?;
    let hooked_tables = storage.install_hooks()?;
    let preserved_records = storage.audit_store().count()?;

    info!(
        schema_version = schema.schema_version,
        preserved_records,
        "provisioning complete"
    );

    Ok(ProvisionReport {
        schema,
        hooked_tables,
        preserved_records,
    })
}
