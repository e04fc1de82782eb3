//! Typed value extraction from a record's property bag
//!
//! Every extractor is total: a missing column or a value of an unexpected
//! shape yields `None` (or an empty list), never an error.
//!
//! Relations distinguish "absent" from "empty": a column that is missing or
//! not relation-shaped gives `None`, a relation with no links gives `Some(vec![])`.

use serde_json::Value;

use crate::record::Properties;

/// Name of the selected option of a `select` column
pub fn extract_select(props: &Properties, column: &str) -> Option<String> {
    props
        .get(column)?
        .get("select")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Value of a `number` column
pub fn extract_number(props: &Properties, column: &str) -> Option<f64> {
    props.get(column)?.get("number")?.as_f64()
}

/// Ids of the pages linked by a `relation` column
pub fn extract_relation_ids(props: &Properties, column: &str) -> Option<Vec<String>> {
    let links = props.get(column)?.get("relation")?.as_array()?;
    Some(links.iter().filter_map(link_id).collect())
}

/// First linked id of a relation, if any
pub fn first_relation_id(props: &Properties, column: &str) -> Option<String> {
    extract_relation_ids(props, column)?.into_iter().next()
}

/// Ids collected from the relation entries of a `rollup` array
pub fn extract_rollup_relation_ids(props: &Properties, column: &str) -> Vec<String> {
    let Some(column_value) = props.get(column) else {
        return Vec::new();
    };
    if type_of(column_value) != Some("rollup") {
        return Vec::new();
    }

    let items = column_value
        .get("rollup")
        .and_then(|r| r.get("array"))
        .and_then(Value::as_array);

    let mut ids = Vec::new();
    for item in items.into_iter().flatten() {
        if type_of(item) != Some("relation") {
            continue;
        }
        if let Some(links) = item.get("relation").and_then(Value::as_array) {
            ids.extend(links.iter().filter_map(link_id));
        }
    }
    ids
}

/// Text of the first run of a `title` column
pub fn extract_title(props: &Properties, column: &str) -> Option<String> {
    let first = props.get(column)?.get("title")?.as_array()?.first()?;
    first
        .get("text")
        .and_then(|t| t.get("content"))
        .or_else(|| first.get("plain_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Raw `start` string of a `date` column
pub fn extract_date_start(props: &Properties, column: &str) -> Option<String> {
    props
        .get(column)?
        .get("date")?
        .get("start")?
        .as_str()
        .map(str::to_string)
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn link_id(link: &Value) -> Option<String> {
    link.get("id").and_then(Value::as_str).map(str::to_string)
}
