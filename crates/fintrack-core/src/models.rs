//! Core data models for normalised transactions

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::SkippedRecord;

/// One normalised transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    /// Page title
    pub name: String,
    /// Wall-clock date and time of the transaction
    pub date: NaiveDateTime,
    pub amount: Option<f64>,
    pub account: Option<String>,
    /// Revenue, Expense, Transfer to Savings, Reserved for Taxes, ...
    pub cash_flow_type: Option<String>,
    /// "Business-Related", "Not Business-Related" or unset
    pub business_related: Option<String>,
    pub sub_category: Option<String>,
    pub main_category: Option<String>,
}

impl TransactionRow {
    /// Amount with unset values counted as zero, the way column sums treat them
    pub fn amount_or_zero(&self) -> f64 {
        self.amount.unwrap_or(0.0)
    }

    pub fn has_cash_flow_type(&self, kind: &str) -> bool {
        self.cash_flow_type.as_deref() == Some(kind)
    }
}

/// Every row produced by one fetch, in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionTable {
    pub rows: Vec<TransactionRow>,
}

impl TransactionTable {
    pub fn new(rows: Vec<TransactionRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransactionRow> {
        self.rows.iter()
    }

    /// New table holding the rows that satisfy `predicate`
    pub fn filter<P>(&self, predicate: P) -> TransactionTable
    where
        P: Fn(&TransactionRow) -> bool,
    {
        TransactionTable {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Sum of all amounts, unset amounts counting as zero
    pub fn total(&self) -> f64 {
        self.rows.iter().map(TransactionRow::amount_or_zero).sum()
    }
}

impl FromIterator<TransactionRow> for TransactionTable {
    fn from_iter<I: IntoIterator<Item = TransactionRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Result of one fetch-and-normalise run, as held by the table cache
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub table: TransactionTable,
    pub skipped: Vec<SkippedRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(table: TransactionTable, skipped: Vec<SkippedRecord>) -> Self {
        Self {
            table,
            skipped,
            fetched_at: Utc::now(),
        }
    }
}

/// Summary of the cache slot, for status endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatus {
    pub loaded: bool,
    pub rows: usize,
    pub skipped: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    /// A fetch is running right now
    #[serde(default)]
    pub fetching: bool,
}

impl CacheStatus {
    pub fn empty() -> Self {
        Self {
            loaded: false,
            rows: 0,
            skipped: 0,
            fetched_at: None,
            fetching: false,
        }
    }

    pub fn of(snapshot: &Snapshot) -> Self {
        Self {
            loaded: true,
            rows: snapshot.table.len(),
            skipped: snapshot.skipped.len(),
            fetched_at: Some(snapshot.fetched_at),
            fetching: false,
        }
    }
}
