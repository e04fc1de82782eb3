//! Notion database reader
//!
//! Fetches every record of a database, following pagination, and offers
//! typed extractors over the property bags of those records.

use async_trait::async_trait;
use std::sync::Arc;

pub mod client;
pub mod error;
pub mod memory;
pub mod properties;
pub mod record;

pub use client::NotionClient;
pub use error::NotionError;
pub use memory::MemorySource;
pub use properties::{
    extract_date_start, extract_number, extract_relation_ids, extract_rollup_relation_ids,
    extract_select, extract_title, first_relation_id,
};
pub use record::{Properties, RawRecord};

// ==================== Source Trait ====================

/// Record source reference type
pub type SourceRef = Arc<dyn RecordSource>;

/// Anything that can return the full contents of a table, in server order
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch all records of `source_id`, concatenating every page
    async fn fetch_all(&self, source_id: &str) -> Result<Vec<RawRecord>, NotionError>;
}
