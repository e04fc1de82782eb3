//! Raw record -> transaction row normalisation
//!
//! Each record is mapped independently. A record that cannot become a row
//! is reported as a [`SkippedRecord`] and the batch carries on.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use fintrack_config::ColumnNames;
use fintrack_notion::{
    extract_date_start, extract_number, extract_rollup_relation_ids, extract_select,
    extract_title, first_relation_id, RawRecord,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{TransactionRow, TransactionTable};
use crate::resolver::CategoryLookups;

/// Why a record was left out of the table
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("record has no properties")]
    MissingProperties,

    #[error("missing name")]
    MissingName,

    #[error("missing date")]
    MissingDate,

    #[error("unparsable date '{value}'")]
    InvalidDate { value: String },
}

/// A record that did not make it into the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub record_id: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Output of a normalisation pass
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub table: TransactionTable,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse a date property's start value.
///
/// Accepts an RFC 3339 date-time (the wall-clock part is kept, the offset
/// dropped), a date-time without offset, or a bare date (midnight).
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Map one record to a row
pub fn normalize_record(
    record: &RawRecord,
    lookups: &CategoryLookups,
    columns: &ColumnNames,
) -> Result<TransactionRow, SkipReason> {
    let props = &record.properties;
    if props.is_empty() {
        return Err(SkipReason::MissingProperties);
    }

    let name = extract_title(props, &columns.name).ok_or(SkipReason::MissingName)?;
    let raw_date = extract_date_start(props, &columns.date).ok_or(SkipReason::MissingDate)?;
    let date = parse_date(&raw_date).ok_or(SkipReason::InvalidDate { value: raw_date })?;

    let sub_category = first_relation_id(props, &columns.sub_category)
        .and_then(|id| lookups.sub_names.get(&id).cloned());

    let mut main_category = sub_category
        .as_deref()
        .and_then(|sub| lookups.main_for_sub(sub))
        .map(str::to_string);

    if main_category.is_none() {
        if let Some(rollup_column) = columns.main_category_rollup.as_deref() {
            main_category = extract_rollup_relation_ids(props, rollup_column)
                .into_iter()
                .next()
                .and_then(|id| lookups.main_names.get(&id).cloned());
        }
    }

    Ok(TransactionRow {
        name,
        date,
        amount: extract_number(props, &columns.amount),
        account: extract_select(props, &columns.account),
        cash_flow_type: extract_select(props, &columns.cash_flow_type),
        business_related: extract_select(props, &columns.business_related),
        sub_category,
        main_category,
    })
}

/// Map every record, keeping source order and collecting skips
pub fn normalize(records: &[RawRecord], lookups: &CategoryLookups, columns: &ColumnNames) -> Normalized {
    let mut rows = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        match normalize_record(record, lookups, columns) {
            Ok(row) => rows.push(row),
            Err(reason) => {
                log::warn!("Skipping record {}: {}", record.id, reason);
                skipped.push(SkippedRecord {
                    record_id: record.id.clone(),
                    reason,
                });
            }
        }
    }

    Normalized {
        table: TransactionTable::new(rows),
        skipped,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::resolver::fixtures::{page, relation, title};
    use fintrack_notion::RawRecord;
    use serde_json::{json, Map, Value};

    /// A transaction page with the default column names
    pub fn transaction(
        id: &str,
        name: &str,
        date: &str,
        amount: f64,
        kind: &str,
        business: Option<&str>,
        sub_ids: &[&str],
    ) -> RawRecord {
        let mut props = Map::new();
        props.insert("Name".to_string(), title(name));
        props.insert(
            "Date".to_string(),
            json!({"type": "date", "date": {"start": date, "end": null}}),
        );
        props.insert("Amount".to_string(), json!({"type": "number", "number": amount}));
        props.insert("Account".to_string(), select("Prestia"));
        props.insert("Cash Flow Type".to_string(), select(kind));
        props.insert(
            "Business Related?".to_string(),
            match business {
                Some(flag) => select(flag),
                None => json!({"type": "select", "select": null}),
            },
        );
        props.insert("Sub Category".to_string(), relation(sub_ids));
        page(id, Value::Object(props))
    }

    pub fn select(name: &str) -> Value {
        json!({"type": "select", "select": {"name": name}})
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::resolver::fixtures::{page, title};
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    fn lookups() -> CategoryLookups {
        let mut lookups = CategoryLookups::default();
        lookups.sub_names.insert("s-groc".to_string(), "Groceries".to_string());
        lookups.sub_names.insert("s-misc".to_string(), "Misc".to_string());
        lookups.main_names.insert("m-food".to_string(), "Living".to_string());
        lookups.sub_to_main.insert("Groceries".to_string(), Some("Living".to_string()));
        lookups.sub_to_main.insert("Misc".to_string(), None);
        lookups
    }

    #[test]
    fn test_parse_date_formats() {
        let midnight = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-05-01"), Some(midnight));
        assert_eq!(parse_date("2024-05-01T00:00:00"), Some(midnight));
        assert_eq!(parse_date("2024-05-01T00:00:00.000+09:00"), Some(midnight));
        assert_eq!(parse_date("2024-05-01T21:30:00Z").map(|d| d.hour()), Some(21));
        assert_eq!(parse_date("May 1st"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_normalize_record_preserves_fields() {
        let record = transaction("t1", "Supermarket", "2024-05-03", 4200.5, "Expense", Some("Not Business-Related"), &["s-groc"]);
        let row = normalize_record(&record, &lookups(), &ColumnNames::default()).unwrap();

        assert_eq!(row.name, "Supermarket");
        assert_eq!(row.date.date(), NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        assert_eq!(row.amount, Some(4200.5));
        assert_eq!(row.account.as_deref(), Some("Prestia"));
        assert_eq!(row.cash_flow_type.as_deref(), Some("Expense"));
        assert_eq!(row.business_related.as_deref(), Some("Not Business-Related"));
        assert_eq!(row.sub_category.as_deref(), Some("Groceries"));
        assert_eq!(row.main_category.as_deref(), Some("Living"));
    }

    #[test]
    fn test_optional_fields_default_to_none() {
        let record = page(
            "t1",
            json!({
                "Name": title("Bare"),
                "Date": {"type": "date", "date": {"start": "2024-06-01"}}
            }),
        );
        let row = normalize_record(&record, &lookups(), &ColumnNames::default()).unwrap();
        assert_eq!(row.amount, None);
        assert_eq!(row.account, None);
        assert_eq!(row.cash_flow_type, None);
        assert_eq!(row.business_related, None);
        assert_eq!(row.sub_category, None);
        assert_eq!(row.main_category, None);
    }

    #[test]
    fn test_sub_category_without_main_gives_null_main() {
        let columns = ColumnNames::default();
        let records = vec![
            transaction("t1", "Odd job", "2024-05-01", 100.0, "Expense", Some("Business-Related"), &["s-misc"]),
            transaction("t2", "Another", "2024-05-02", 50.0, "Expense", Some("Business-Related"), &["s-misc"]),
        ];
        let normalized = normalize(&records, &lookups(), &columns);
        assert_eq!(normalized.table.len(), 2);
        for row in normalized.table.iter() {
            assert_eq!(row.sub_category.as_deref(), Some("Misc"));
            assert_eq!(row.main_category, None);
        }
    }

    #[test]
    fn test_unknown_sub_category_id() {
        let record = transaction("t1", "X", "2024-05-01", 1.0, "Expense", None, &["gone"]);
        let row = normalize_record(&record, &lookups(), &ColumnNames::default()).unwrap();
        assert_eq!(row.sub_category, None);
        assert_eq!(row.main_category, None);
    }

    #[test]
    fn test_skip_reasons() {
        let columns = ColumnNames::default();
        let no_props = RawRecord::new("p0", Default::default());
        assert_eq!(
            normalize_record(&no_props, &lookups(), &columns),
            Err(SkipReason::MissingProperties)
        );

        let no_name = page("p1", json!({"Date": {"date": {"start": "2024-01-01"}}}));
        assert_eq!(normalize_record(&no_name, &lookups(), &columns), Err(SkipReason::MissingName));

        let empty_title = page("p2", json!({"Name": {"title": []}, "Date": {"date": {"start": "2024-01-01"}}}));
        assert_eq!(normalize_record(&empty_title, &lookups(), &columns), Err(SkipReason::MissingName));

        let no_date = page("p3", json!({"Name": title("A"), "Date": {"date": null}}));
        assert_eq!(normalize_record(&no_date, &lookups(), &columns), Err(SkipReason::MissingDate));

        let bad_date = page("p4", json!({"Name": title("A"), "Date": {"date": {"start": "soon"}}}));
        assert_eq!(
            normalize_record(&bad_date, &lookups(), &columns),
            Err(SkipReason::InvalidDate { value: "soon".to_string() })
        );
    }

    #[test]
    fn test_normalize_drops_only_invalid_records() {
        let columns = ColumnNames::default();
        let records = vec![
            transaction("t1", "A", "2024-05-01", 10.0, "Revenue", Some("Business-Related"), &[]),
            page("bad1", json!({"Date": {"date": {"start": "2024-05-01"}}})),
            transaction("t2", "B", "2024-05-02", 20.0, "Expense", Some("Business-Related"), &[]),
            page("bad2", json!({"Name": title("C")})),
            transaction("t3", "D", "2024-05-03", 30.0, "Expense", None, &[]),
        ];
        let normalized = normalize(&records, &lookups(), &columns);

        assert_eq!(normalized.table.len(), records.len() - 2);
        let names: Vec<&str> = normalized.table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "D"]);
        assert_eq!(normalized.skipped.len(), 2);
        assert_eq!(normalized.skipped[0].record_id, "bad1");
        assert_eq!(normalized.skipped[0].reason, SkipReason::MissingName);
        assert_eq!(normalized.skipped[1].reason, SkipReason::MissingDate);
    }

    #[test]
    fn test_all_skipped_is_distinguishable_from_empty() {
        let columns = ColumnNames::default();
        let empty = normalize(&[], &lookups(), &columns);
        assert!(empty.table.is_empty());
        assert!(empty.skipped.is_empty());

        let broken = normalize(&[page("x", json!({"Name": title("A")}))], &lookups(), &columns);
        assert!(broken.table.is_empty());
        assert_eq!(broken.skipped.len(), 1);
    }

    #[test]
    fn test_rollup_fallback_for_main_category() {
        let columns = ColumnNames {
            main_category_rollup: Some("Main Category".to_string()),
            ..ColumnNames::default()
        };
        let record = page(
            "t1",
            json!({
                "Name": title("Rollup only"),
                "Date": {"type": "date", "date": {"start": "2024-05-01"}},
                "Main Category": {
                    "type": "rollup",
                    "rollup": {"type": "array", "array": [
                        {"type": "relation", "relation": [{"id": "m-food"}]}
                    ]}
                }
            }),
        );
        let row = normalize_record(&record, &lookups(), &columns).unwrap();
        assert_eq!(row.main_category.as_deref(), Some("Living"));

        let without = normalize_record(&record, &lookups(), &ColumnNames::default()).unwrap();
        assert_eq!(without.main_category, None);
    }

    #[test]
    fn test_skipped_record_serializes_flat() {
        let skipped = SkippedRecord {
            record_id: "p4".to_string(),
            reason: SkipReason::InvalidDate { value: "soon".to_string() },
        };
        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            json!({"record_id": "p4", "reason": "invalid_date", "value": "soon"})
        );
    }
}
