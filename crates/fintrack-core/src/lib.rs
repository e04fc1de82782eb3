//! Core finance processing: category resolution, normalisation and report shaping

pub mod aggregation;
pub mod cache;
pub mod error;
pub mod models;
pub mod normalize;
pub mod reports;
pub mod resolver;
pub mod timing;

use fintrack_config::Config;
use fintrack_notion::SourceRef;

pub use cache::TableCache;
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use models::{CacheStatus, Snapshot, TransactionRow, TransactionTable};
pub use normalize::{Normalized, SkipReason, SkippedRecord};
pub use reports::{build_report, CategoryMode, CategoryView, ChartKind, Report};
pub use resolver::CategoryLookups;
pub use timing::{timed, timed_sync};

/// Fetches the transactions table and turns it into a [`Snapshot`]
pub struct FinanceTracker {
    config: Config,
    source: SourceRef,
}

impl FinanceTracker {
    pub fn new(config: Config, source: SourceRef) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve category names, or empty lookups when either category table is unset
    async fn category_lookups(&self) -> CoreResult<CategoryLookups> {
        let notion = &self.config.notion;
        match (
            notion.sub_categories_database.as_deref(),
            notion.main_categories_database.as_deref(),
        ) {
            (Some(sub), Some(main)) => {
                timed(
                    "resolve_categories",
                    resolver::resolve_categories(self.source.as_ref(), sub, main, &notion.columns),
                )
                .await
            }
            _ => {
                log::warn!("Category databases not configured; rows will have no categories");
                Ok(CategoryLookups::default())
            }
        }
    }

    /// Fetch every transaction, resolve categories and normalise.
    ///
    /// Remote failures abort the run; bad records are only skipped.
    pub async fn fetch_snapshot(&self) -> CoreResult<Snapshot> {
        let transactions_id = self.config.transactions_database().ok_or_else(|| {
            CoreError::NotConfigured {
                field: fintrack_config::transactions_database_field(),
            }
        })?;

        let lookups = self.category_lookups().await?;
        let records = timed(
            "fetch_transactions",
            self.source.fetch_all(transactions_id),
        )
        .await?;

        let normalized = timed_sync("normalize", || {
            normalize::normalize(&records, &lookups, &self.config.notion.columns)
        });

        if !normalized.skipped.is_empty() {
            log::warn!(
                "{} of {} records skipped during normalisation",
                normalized.skipped.len(),
                records.len()
            );
        }

        Ok(Snapshot::new(normalized.table, normalized.skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{BUSINESS_RELATED, EXPENSE, REVENUE, TRANSFER_TO_SAVINGS};
    use crate::normalize::fixtures::transaction;
    use crate::resolver::fixtures::{main_category, page, sub_category, title};
    use fintrack_notion::MemorySource;
    use serde_json::json;
    use std::sync::Arc;

    fn config(with_categories: bool) -> Config {
        let mut config = Config::default();
        config.notion.transactions_database = Some("tx".to_string());
        if with_categories {
            config.notion.sub_categories_database = Some("sub".to_string());
            config.notion.main_categories_database = Some("main".to_string());
        }
        config
    }

    fn source() -> MemorySource {
        MemorySource::new()
            .with_page_size(2)
            .with_table("main", vec![main_category("m-biz", "Business Costs")])
            .with_table(
                "sub",
                vec![
                    sub_category("s-host", "Hosting", &["m-biz"]),
                    sub_category("s-loose", "Loose", &[]),
                ],
            )
            .with_table(
                "tx",
                vec![
                    transaction("t1", "Client A", "2024-05-01", 1000.0, REVENUE, Some(BUSINESS_RELATED), &[]),
                    transaction("t2", "Server", "2024-05-15", 300.0, EXPENSE, Some(BUSINESS_RELATED), &["s-host"]),
                    transaction("t3", "Pot", "2024-05-20", 200.0, TRANSFER_TO_SAVINGS, Some(BUSINESS_RELATED), &["s-loose"]),
                    page("t4", json!({ "Name": title("No date") })),
                ],
            )
    }

    #[tokio::test]
    async fn test_fetch_snapshot_end_to_end() {
        let tracker = FinanceTracker::new(config(true), Arc::new(source()));
        let snapshot = tracker.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.table.len(), 3);
        assert_eq!(snapshot.skipped.len(), 1);
        assert_eq!(snapshot.skipped[0].record_id, "t4");

        let server = &snapshot.table.rows[1];
        assert_eq!(server.sub_category.as_deref(), Some("Hosting"));
        assert_eq!(server.main_category.as_deref(), Some("Business Costs"));
        let pot = &snapshot.table.rows[2];
        assert_eq!(pot.sub_category.as_deref(), Some("Loose"));
        assert_eq!(pot.main_category, None);

        let report = reports::business_expense_vs_revenue(&snapshot.table);
        assert_eq!(report.total_for("2024-05", REVENUE), Some(1000.0));
        assert_eq!(report.total_for("2024-05", EXPENSE), Some(500.0));
        assert_eq!(report.summary[0].amount, 500.0);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_without_category_tables() {
        let tracker = FinanceTracker::new(config(false), Arc::new(source()));
        let snapshot = tracker.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.table.len(), 3);
        assert!(snapshot.table.iter().all(|r| r.sub_category.is_none()));
    }

    #[tokio::test]
    async fn test_fetch_snapshot_requires_transactions_database() {
        let tracker = FinanceTracker::new(Config::default(), Arc::new(source()));
        let err = tracker.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, CoreError::NotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        let mut config = config(true);
        config.notion.transactions_database = Some("missing".to_string());
        let tracker = FinanceTracker::new(config, Arc::new(source()));
        let err = tracker.fetch_snapshot().await.unwrap_err();
        assert!(matches!(err, CoreError::Source(_)));
    }
}
