//! In-memory record source, used for fixtures and offline runs

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::NotionError;
use crate::record::{QueryResponse, RawRecord};
use crate::RecordSource;

/// Serves fixed record sets through the same cursor protocol the API uses
#[derive(Debug, Clone)]
pub struct MemorySource {
    tables: HashMap<String, Vec<RawRecord>>,
    page_size: usize,
}

/// On-disk fixture: source id -> list of page objects
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct Fixture(HashMap<String, Vec<RawRecord>>);

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_table(mut self, source_id: impl Into<String>, records: Vec<RawRecord>) -> Self {
        self.insert(source_id, records);
        self
    }

    pub fn insert(&mut self, source_id: impl Into<String>, records: Vec<RawRecord>) {
        self.tables.insert(source_id.into(), records);
    }

    /// Parse a fixture document `{"<source id>": [<page>, ...], ...}`
    pub fn from_json(content: &str) -> Result<Self, NotionError> {
        let fixture: Fixture = serde_json::from_str(content).map_err(|e| NotionError::Decode {
            source_id: "fixture".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            tables: fixture.0,
            page_size: 100,
        })
    }

    pub async fn from_file(path: &Path) -> Result<Self, NotionError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NotionError::Decode {
                source_id: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::from_json(&content)
    }

    /// One page of results starting at `cursor`, shaped like an API response
    fn page(&self, source_id: &str, cursor: Option<&str>) -> Result<QueryResponse, NotionError> {
        let records = self
            .tables
            .get(source_id)
            .ok_or_else(|| NotionError::UnknownSource {
                source_id: source_id.to_string(),
            })?;

        let start = match cursor {
            Some(c) => c.parse::<usize>().map_err(|_| NotionError::Api {
                status: 400,
                message: format!("invalid start_cursor: {}", c),
            })?,
            None => 0,
        };
        let end = (start + self.page_size).min(records.len());
        let has_more = end < records.len();

        Ok(QueryResponse {
            results: records.get(start..end).unwrap_or_default().to_vec(),
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch_all(&self, source_id: &str) -> Result<Vec<RawRecord>, NotionError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.page(source_id, cursor.as_deref())?;
            records.extend(page.results);
            if !page.has_more {
                break;
            }
            cursor = Some(page.next_cursor.ok_or_else(|| NotionError::MissingCursor {
                source_id: source_id.to_string(),
            })?);
        }

        Ok(records)
    }
}
