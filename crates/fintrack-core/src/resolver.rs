//! Category resolution across the sub- and main-category tables
//!
//! A transaction links to a sub-category page; the sub-category page links
//! to a main-category page. Both links are ids, so names are resolved here
//! once per run and handed to the normaliser as plain lookups.

use fintrack_config::ColumnNames;
use fintrack_notion::{extract_title, first_relation_id, RawRecord, RecordSource};
use std::collections::HashMap;

use crate::error::CoreResult;
use crate::timing::timed;

/// Page id -> page name
pub type NameMapping = HashMap<String, String>;

/// Sub-category name -> main-category name (None when the sub-category has no main)
pub type SubToMainMapping = HashMap<String, Option<String>>;

/// Everything the normaliser needs to name a transaction's categories
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryLookups {
    pub sub_names: NameMapping,
    pub main_names: NameMapping,
    pub sub_to_main: SubToMainMapping,
}

impl CategoryLookups {
    pub fn is_empty(&self) -> bool {
        self.sub_names.is_empty() && self.main_names.is_empty()
    }

    /// Main category of a sub-category name; None for unknown or unlinked names
    pub fn main_for_sub(&self, sub_name: &str) -> Option<&str> {
        self.sub_to_main.get(sub_name)?.as_deref()
    }
}

/// id -> name for records whose title column has text; others are skipped
pub fn name_mapping_from_records(records: &[RawRecord], title_column: &str) -> NameMapping {
    let mut mapping = NameMapping::with_capacity(records.len());
    for record in records {
        match extract_title(&record.properties, title_column) {
            Some(name) => {
                mapping.insert(record.id.clone(), name);
            }
            None => log::debug!("Record {} has no name, not mapped", record.id),
        }
    }
    mapping
}

/// Join sub-category records to main-category names through the relation column
pub fn sub_to_main_from_records(
    sub_records: &[RawRecord],
    main_names: &NameMapping,
    columns: &ColumnNames,
) -> SubToMainMapping {
    let mut mapping = SubToMainMapping::with_capacity(sub_records.len());
    for record in sub_records {
        let Some(sub_name) = extract_title(&record.properties, &columns.name) else {
            log::warn!("Skipping sub-category {}: missing name", record.id);
            continue;
        };
        let main_name = first_relation_id(&record.properties, &columns.main_category_relation)
            .and_then(|id| main_names.get(&id).cloned());
        mapping.insert(sub_name, main_name);
    }
    mapping
}

/// Fetch a table and map its page ids to names
pub async fn build_name_mapping(
    source: &dyn RecordSource,
    source_id: &str,
    title_column: &str,
) -> CoreResult<NameMapping> {
    let records = timed(&format!("fetch {}", source_id), source.fetch_all(source_id)).await?;
    Ok(name_mapping_from_records(&records, title_column))
}

/// Fetch both category tables and build the sub -> main name mapping
pub async fn build_sub_to_main_mapping(
    source: &dyn RecordSource,
    sub_source_id: &str,
    main_source_id: &str,
    columns: &ColumnNames,
) -> CoreResult<SubToMainMapping> {
    let main_names = build_name_mapping(source, main_source_id, &columns.name).await?;
    let sub_records = source.fetch_all(sub_source_id).await?;
    Ok(sub_to_main_from_records(&sub_records, &main_names, columns))
}

/// Build all category lookups, fetching each category table once
pub async fn resolve_categories(
    source: &dyn RecordSource,
    sub_source_id: &str,
    main_source_id: &str,
    columns: &ColumnNames,
) -> CoreResult<CategoryLookups> {
    let main_names = build_name_mapping(source, main_source_id, &columns.name).await?;
    let sub_records = timed(
        &format!("fetch {}", sub_source_id),
        source.fetch_all(sub_source_id),
    )
    .await?;

    let lookups = CategoryLookups {
        sub_names: name_mapping_from_records(&sub_records, &columns.name),
        sub_to_main: sub_to_main_from_records(&sub_records, &main_names, columns),
        main_names,
    };
    log::debug!(
        "Resolved {} sub-categories across {} main categories",
        lookups.sub_names.len(),
        lookups.main_names.len()
    );
    Ok(lookups)
}
