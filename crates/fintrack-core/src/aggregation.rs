//! Transaction aggregation for charts
//!
//! Every function takes rows and returns new, chart-ready values. Nothing
//! here touches shared state.

use chrono::NaiveDateTime;
use fintrack_utils::format_plain_amount;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{TransactionRow, TransactionTable};

pub const BUSINESS_RELATED: &str = "Business-Related";
pub const NOT_BUSINESS_RELATED: &str = "Not Business-Related";

pub const REVENUE: &str = "Revenue";
pub const EXPENSE: &str = "Expense";
pub const TRANSFER_TO_SAVINGS: &str = "Transfer to Savings";
pub const RESERVED_FOR_TAXES: &str = "Reserved for Taxes";

/// Which side of the business-relation flag a chart looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessScope {
    Business,
    Personal,
}

impl BusinessScope {
    /// Flag value a row must carry to be in scope
    pub fn flag(&self) -> &'static str {
        match self {
            BusinessScope::Business => BUSINESS_RELATED,
            BusinessScope::Personal => NOT_BUSINESS_RELATED,
        }
    }

    pub fn contains(&self, row: &TransactionRow) -> bool {
        row.business_related.as_deref() == Some(self.flag())
    }
}

/// Calendar year-month bucket, e.g. `2024-05`
pub fn month_year(date: &NaiveDateTime) -> String {
    date.format("%Y-%m").to_string()
}

/// Rows whose business-relation flag matches `scope`; unset flags never match
pub fn filter_scope(table: &TransactionTable, scope: BusinessScope) -> TransactionTable {
    table.filter(|row| scope.contains(row))
}

/// Rows whose cash-flow kind is one of `kinds`
pub fn filter_kinds(table: &TransactionTable, kinds: &[&str]) -> TransactionTable {
    table.filter(|row| {
        row.cash_flow_type
            .as_deref()
            .is_some_and(|kind| kinds.contains(&kind))
    })
}

/// Display series for a kind: kinds listed in `as_expense` are shown as Expense
pub fn display_kind<'a>(kind: &'a str, as_expense: &[&str]) -> &'a str {
    if as_expense.contains(&kind) {
        EXPENSE
    } else {
        kind
    }
}

/// Sum of amounts for one cash-flow kind
pub fn kind_total(table: &TransactionTable, kind: &str) -> f64 {
    table
        .iter()
        .filter(|row| row.has_cash_flow_type(kind))
        .map(TransactionRow::amount_or_zero)
        .sum()
}

/// One bar: the total of a display series in a month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month_year: String,
    pub series: String,
    pub amount: f64,
    /// Underlying cash-flow kind -> amount, so relabelled kinds stay visible
    pub breakdown: BTreeMap<String, f64>,
}

/// Group rows by `(month_year, series)` and sum amounts.
///
/// Rows for which `series_of` returns None are left out. Output is ordered by
/// month, then series name.
pub fn monthly_totals<F>(rows: &[TransactionRow], series_of: F) -> Vec<MonthlyTotal>
where
    F: Fn(&TransactionRow) -> Option<String>,
{
    let mut groups: BTreeMap<(String, String), BTreeMap<String, f64>> = BTreeMap::new();

    for row in rows {
        let Some(series) = series_of(row) else {
            continue;
        };
        let kind = row.cash_flow_type.clone().unwrap_or_default();
        *groups
            .entry((month_year(&row.date), series))
            .or_default()
            .entry(kind)
            .or_insert(0.0) += row.amount_or_zero();
    }

    groups
        .into_iter()
        .map(|((month_year, series), breakdown)| MonthlyTotal {
            month_year,
            series,
            amount: breakdown.values().sum(),
            breakdown,
        })
        .collect()
}

/// Chronologically sorted distinct months present in `rows`
pub fn sorted_months(rows: &[TransactionRow]) -> Vec<String> {
    rows.iter()
        .map(|row| month_year(&row.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One relative step of a waterfall: the net of everything on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallStep {
    pub date: NaiveDateTime,
    pub amount: f64,
    /// Contributing rows as `name (+amount)` / `name (-amount)`, comma separated
    pub label: String,
}

fn signed_label(name: &str, amount: f64) -> String {
    let sign = if amount > 0.0 { "+" } else { "" };
    format!("{} ({}{})", name, sign, format_plain_amount(amount))
}

fn signed_rows<'a>(
    rows: &'a [TransactionRow],
    kind: &'static str,
    sign: f64,
) -> impl Iterator<Item = (&'a TransactionRow, f64)> + 'a {
    rows.iter()
        .filter(move |row| row.has_cash_flow_type(kind))
        .filter_map(move |row| row.amount.map(|amount| (row, sign * amount)))
}

/// Net cash movement per exact date.
///
/// Expenses and savings transfers count negative, revenue positive; other
/// kinds and rows without an amount are ignored. Within a date, contributions
/// are listed expenses first, then savings, then revenue.
pub fn waterfall(rows: &[TransactionRow]) -> Vec<WaterfallStep> {
    let ordered = signed_rows(rows, EXPENSE, -1.0)
        .chain(signed_rows(rows, TRANSFER_TO_SAVINGS, -1.0))
        .chain(signed_rows(rows, REVENUE, 1.0));

    let mut by_date: BTreeMap<NaiveDateTime, (f64, Vec<String>)> = BTreeMap::new();
    for (row, amount) in ordered {
        let entry = by_date.entry(row.date).or_default();
        entry.0 += amount;
        entry.1.push(signed_label(&row.name, amount));
    }

    by_date
        .into_iter()
        .map(|(date, (amount, labels))| WaterfallStep {
            date,
            amount,
            label: labels.join(", "),
        })
        .collect()
}

/// A sub-category's share of one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub month_year: String,
    pub main_category: String,
    pub sub_category: String,
    pub amount: f64,
    /// Sum of the main category in this month
    pub main_category_sum: f64,
    /// Sum of every category in view in this month
    pub monthly_total: f64,
    /// `amount / monthly_total * 100`
    pub percentage: f64,
    /// `main_category_sum / monthly_total * 100`
    pub main_category_percentage: f64,
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Per-month sub-category totals with main-category and monthly sums.
///
/// Rows missing either category are left out. Output is ordered by main
/// category, sub-category, then month.
pub fn category_breakdown(rows: &[TransactionRow]) -> Vec<CategoryShare> {
    let mut sub_sums: BTreeMap<(String, String, String), f64> = BTreeMap::new();
    for row in rows {
        let (Some(main), Some(sub)) = (&row.main_category, &row.sub_category) else {
            continue;
        };
        *sub_sums
            .entry((main.clone(), sub.clone(), month_year(&row.date)))
            .or_insert(0.0) += row.amount_or_zero();
    }

    let mut main_sums: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    let mut month_sums: BTreeMap<&str, f64> = BTreeMap::new();
    for ((main, _, month), amount) in &sub_sums {
        *main_sums.entry((month.as_str(), main.as_str())).or_insert(0.0) += amount;
        *month_sums.entry(month.as_str()).or_insert(0.0) += amount;
    }

    sub_sums
        .iter()
        .map(|((main, sub, month), &amount)| {
            let main_category_sum = main_sums[&(month.as_str(), main.as_str())];
            let monthly_total = month_sums[month.as_str()];
            CategoryShare {
                month_year: month.clone(),
                main_category: main.clone(),
                sub_category: sub.clone(),
                amount,
                main_category_sum,
                monthly_total,
                percentage: percent(amount, monthly_total),
                main_category_percentage: percent(main_category_sum, monthly_total),
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn row(name: &str, date: &str, amount: f64, kind: &str, business: Option<&str>) -> TransactionRow {
        TransactionRow {
            name: name.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            amount: Some(amount),
            account: Some("Prestia".to_string()),
            cash_flow_type: Some(kind.to_string()),
            business_related: business.map(str::to_string),
            sub_category: None,
            main_category: None,
        }
    }

    pub fn categorised(row: TransactionRow, main: &str, sub: &str) -> TransactionRow {
        TransactionRow {
            main_category: Some(main.to_string()),
            sub_category: Some(sub.to_string()),
            ..row
        }
    }

    /// The three-record business month used across report tests
    pub fn business_may() -> TransactionTable {
        TransactionTable::new(vec![
            row("Client A", "2024-05-01", 1000.0, REVENUE, Some(BUSINESS_RELATED)),
            row("Hosting", "2024-05-15", 300.0, EXPENSE, Some(BUSINESS_RELATED)),
            row("Savings", "2024-05-20", 200.0, TRANSFER_TO_SAVINGS, Some(BUSINESS_RELATED)),
        ])
    }
}
