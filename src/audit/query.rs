//! Read-only query interface over the audit store

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::record::{AuditEvent, AuditRecord};
use super::store::AuditStore;
use crate::error::{SimulottoError, SimulottoResult};
use crate::models::AuditRecordId;

/// Result ordering by capture time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filters for reading audit records
///
/// Every filter is optional; bounds on `created_at` are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub source_table: Option<String>,
    pub source_record_id: Option<String>,
    pub event: Option<AuditEvent>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records for one entity instance
    pub fn for_entity(table: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self::new().table(table).record_id(record_id)
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.source_table = Some(table.into());
        self
    }

    pub fn record_id(mut self, record_id: impl Into<String>) -> Self {
        self.source_record_id = Some(record_id.into());
        self
    }

    pub fn event(mut self, event: AuditEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reject malformed filters before touching the store
    pub fn validate(&self) -> SimulottoResult<()> {
        if matches!(&self.source_table, Some(t) if t.trim().is_empty()) {
            return Err(SimulottoError::Query("source table filter is empty".into()));
        }

        if matches!(&self.source_record_id, Some(id) if id.trim().is_empty()) {
            return Err(SimulottoError::Query(
                "source record id filter is empty".into(),
            ));
        }

        if let (Some(from), Some(to)) = (self.created_from, self.created_to) {
            if from > to {
                return Err(SimulottoError::Query(format!(
                    "time range starts after it ends ({} > {})",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }

        if self.limit == Some(0) {
            return Err(SimulottoError::Query("limit must be at least 1".into()));
        }

        Ok(())
    }

    /// Whether a record passes every filter
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(table) = &self.source_table {
            if record.source_table() != table {
                return false;
            }
        }

        if let Some(record_id) = &self.source_record_id {
            if record.source_record_id() != record_id {
                return false;
            }
        }

        if let Some(event) = self.event {
            if record.event() != event {
                return false;
            }
        }

        if let Some(from) = self.created_from {
            if record.created_at() < from {
                return false;
            }
        }

        if let Some(to) = self.created_to {
            if record.created_at() > to {
                return false;
            }
        }

        true
    }
}

/// Raw filter strings, as they arrive from the command line
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub table: Option<String>,
    pub record_id: Option<String>,
    pub event: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub descending: bool,
    pub limit: Option<usize>,
}

impl QueryParams {
    /// Parse into a validated query
    pub fn into_query(self) -> SimulottoResult<AuditQuery> {
        let event = self
            .event
            .as_deref()
            .map(AuditEvent::from_str)
            .transpose()?;
        let created_from = self.from.as_deref().map(|s| parse_bound(s, false)).transpose()?;
        let created_to = self.to.as_deref().map(|s| parse_bound(s, true)).transpose()?;

        let query = AuditQuery {
            source_table: self.table,
            source_record_id: self.record_id,
            event,
            created_from,
            created_to,
            order: if self.descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            },
            limit: self.limit,
        };

        query.validate()?;
        Ok(query)
    }
}

/// Parse an RFC 3339 timestamp or a plain date
///
/// A plain date as an upper bound covers the whole day.
fn parse_bound(s: &str, end_of_day: bool) -> SimulottoResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
        SimulottoError::Query(format!(
            "invalid timestamp '{}', expected RFC 3339 or YYYY-MM-DD",
            s
        ))
    })?;

    let time = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| SimulottoError::Query(format!("invalid date '{}'", s)))
}

/// Read-only access to the audit store
pub struct AuditReader<'a> {
    store: &'a AuditStore,
}

impl<'a> AuditReader<'a> {
    pub fn new(store: &'a AuditStore) -> Self {
        Self { store }
    }

    /// Records matching the query, ordered by capture time
    pub fn query(&self, query: &AuditQuery) -> SimulottoResult<Vec<AuditRecord>> {
        query.validate()?;

        let mut records = self.store.scan(|r| query.matches(r))?;

        // Stable sort keeps append order for equal timestamps
        records.sort_by_key(|r| r.created_at());
        if query.order == SortOrder::Descending {
            records.reverse();
        }

        if let Some(limit) = query.limit {
            records.truncate(limit);
        }

        Ok(records)
    }

    /// A single record by id
    pub fn get(&self, id: AuditRecordId) -> SimulottoResult<AuditRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| SimulottoError::audit_record_not_found(id.full()))
    }

    /// A record by full UUID or short display id (`aud-1a2b3c4d`)
    pub fn find(&self, identifier: &str) -> SimulottoResult<AuditRecord> {
        let identifier = identifier.trim();
        if let Ok(id) = identifier.parse::<AuditRecordId>() {
            return self.get(id);
        }

        let mut matches = self.store.scan(|r| r.id().to_string() == identifier)?;
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(SimulottoError::audit_record_not_found(identifier)),
            n => Err(SimulottoError::Query(format!(
                "'{}' matches {} audit records; use the full id",
                identifier, n
            ))),
        }
    }

    /// Full history of one entity instance, oldest first
    pub fn history(&self, table: &str, record_id: &str) -> SimulottoResult<Vec<AuditRecord>> {
        self.query(&AuditQuery::for_entity(table, record_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::hasher::SealedPayload;
    use crate::audit::record::RecordBuilder;
    use tempfile::TempDir;

    fn create_test_store() -> (AuditStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AuditStore::open(temp_dir.path().join("audit_records.jsonl")).unwrap();
        (store, temp_dir)
    }

    fn append(store: &AuditStore, event: AuditEvent, table: &str, id: &str) -> AuditRecord {
        let record = RecordBuilder::default()
            .build(event, table, id, SealedPayload::seal("{}".to_string()))
            .unwrap();
        store.append(&record).unwrap();
        record
    }

    fn populated_store() -> (AuditStore, TempDir) {
        let (store, temp) = create_test_store();
        append(&store, AuditEvent::Insert, "bets", "b-1");
        append(&store, AuditEvent::Insert, "bets", "b-2");
        append(&store, AuditEvent::Update, "bets", "b-1");
        append(&store, AuditEvent::Insert, "draws", "d-1");
        append(&store, AuditEvent::Delete, "bets", "b-1");
        (store, temp)
    }

    #[test]
    fn test_history_for_entity() {
        let (store, _temp) = populated_store();
        let reader = AuditReader::new(&store);

        let events: Vec<_> = reader
            .history("bets", "b-1")
            .unwrap()
            .iter()
            .map(|r| r.event())
            .collect();
        assert_eq!(
            events,
            vec![AuditEvent::Insert, AuditEvent::Update, AuditEvent::Delete]
        );
    }

    #[test]
    fn test_filter_by_table_and_event() {
        let (store, _temp) = populated_store();
        let reader = AuditReader::new(&store);

        let inserts = reader
            .query(&AuditQuery::new().table("bets").event(AuditEvent::Insert))
            .unwrap();
        assert_eq!(inserts.len(), 2);

        let draws = reader.query(&AuditQuery::new().table("draws")).unwrap();
        assert_eq!(draws.len(), 1);
    }

    #[test]
    fn test_descending_with_limit() {
        let (store, _temp) = populated_store();
        let reader = AuditReader::new(&store);

        let latest = reader
            .query(&AuditQuery::new().descending().limit(2))
            .unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].event(), AuditEvent::Delete);
        assert!(latest[0].created_at() >= latest[1].created_at());
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let (store, _temp) = create_test_store();
        let first = append(&store, AuditEvent::Insert, "bets", "b-1");
        let second = append(&store, AuditEvent::Update, "bets", "b-1");
        let reader = AuditReader::new(&store);

        let query = AuditQuery::new()
            .created_between(Some(first.created_at()), Some(first.created_at()));
        let hits = reader.query(&query).unwrap();
        assert!(hits.iter().any(|r| r.id() == first.id()));

        let query = AuditQuery::new().created_between(Some(second.created_at()), None);
        let hits = reader.query(&query).unwrap();
        assert!(hits.iter().any(|r| r.id() == second.id()));
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let (store, _temp) = populated_store();
        let reader = AuditReader::new(&store);
        let query = AuditQuery::new().table("bets");

        assert_eq!(reader.query(&query).unwrap(), reader.query(&query).unwrap());
    }

    #[test]
    fn test_unknown_id_not_found() {
        let (store, _temp) = create_test_store();
        let err = AuditReader::new(&store).get(AuditRecordId::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_find_by_short_id() {
        let (store, _temp) = create_test_store();
        let record = append(&store, AuditEvent::Insert, "bets", "b-1");
        let reader = AuditReader::new(&store);

        assert_eq!(reader.find(&record.id().to_string()).unwrap(), record);
        assert_eq!(reader.find(&record.id().full()).unwrap(), record);
        assert!(reader.find("aud-00000000").unwrap_err().is_not_found());
    }

    #[test]
    fn test_malformed_filters() {
        let (store, _temp) = create_test_store();
        let reader = AuditReader::new(&store);

        assert!(reader
            .query(&AuditQuery::new().table(" "))
            .unwrap_err()
            .is_query());
        assert!(reader
            .query(&AuditQuery::new().limit(0))
            .unwrap_err()
            .is_query());

        let now = Utc::now();
        let inverted =
            AuditQuery::new().created_between(Some(now), Some(now - chrono::Duration::seconds(1)));
        assert!(reader.query(&inverted).unwrap_err().is_query());
    }

    #[test]
    fn test_params_parsing() {
        let query = QueryParams {
            table: Some("bets".into()),
            event: Some("update".into()),
            from: Some("2025-01-01".into()),
            to: Some("2025-01-31T12:00:00Z".into()),
            descending: true,
            ..Default::default()
        }
        .into_query()
        .unwrap();

        assert_eq!(query.event, Some(AuditEvent::Update));
        assert_eq!(query.order, SortOrder::Descending);
        assert_eq!(
            query.created_from.unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn test_params_date_upper_bound_covers_day() {
        let query = QueryParams {
            to: Some("2025-03-01".into()),
            ..Default::default()
        }
        .into_query()
        .unwrap();

        let to = query.created_to.unwrap();
        assert_eq!(to.date_naive().to_string(), "2025-03-01");
        assert_eq!(to.format("%H:%M:%S").to_string(), "23:59:59");
    }

    #[test]
    fn test_params_reject_garbage() {
        for params in [
            QueryParams {
                event: Some("created".into()),
                ..Default::default()
            },
            QueryParams {
                from: Some("yesterday".into()),
                ..Default::default()
            },
            QueryParams {
                from: Some("2025-02-01".into()),
                to: Some("2025-01-01".into()),
                ..Default::default()
            },
        ] {
            assert!(params.into_query().unwrap_err().is_query());
        }
    }
}
