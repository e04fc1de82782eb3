//! Chart catalogue and report shaping
//!
//! A report is the chart-ready data for one chart: already filtered,
//! grouped and summed, but not yet styled or formatted.

use serde::{Deserialize, Serialize};

use crate::aggregation::{
    category_breakdown, display_kind, filter_kinds, filter_scope, kind_total, monthly_totals,
    sorted_months, waterfall, BusinessScope, CategoryShare, MonthlyTotal, WaterfallStep, EXPENSE,
    RESERVED_FOR_TAXES, REVENUE, TRANSFER_TO_SAVINGS,
};
use crate::models::TransactionTable;

// ==================== Catalogue ====================

/// Transaction subsets with a by-category breakdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryView {
    BusinessExpensesAndTaxes,
    BusinessExpenses,
    BusinessRevenue,
    PersonalExpensesAndSavings,
    PersonalExpenses,
    PersonalRevenue,
}

impl CategoryView {
    pub fn all() -> [CategoryView; 6] {
        [
            CategoryView::BusinessExpensesAndTaxes,
            CategoryView::BusinessExpenses,
            CategoryView::BusinessRevenue,
            CategoryView::PersonalExpensesAndSavings,
            CategoryView::PersonalExpenses,
            CategoryView::PersonalRevenue,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            CategoryView::BusinessExpensesAndTaxes => "business-expenses-and-taxes",
            CategoryView::BusinessExpenses => "business-expenses",
            CategoryView::BusinessRevenue => "business-revenue",
            CategoryView::PersonalExpensesAndSavings => "personal-expenses-and-savings",
            CategoryView::PersonalExpenses => "personal-expenses",
            CategoryView::PersonalRevenue => "personal-revenue",
        }
    }

    pub fn scope(&self) -> BusinessScope {
        match self {
            CategoryView::BusinessExpensesAndTaxes
            | CategoryView::BusinessExpenses
            | CategoryView::BusinessRevenue => BusinessScope::Business,
            _ => BusinessScope::Personal,
        }
    }

    /// Cash-flow kinds included in the view
    pub fn kinds(&self) -> &'static [&'static str] {
        match self {
            CategoryView::BusinessExpensesAndTaxes => &[EXPENSE, RESERVED_FOR_TAXES],
            CategoryView::PersonalExpensesAndSavings => &[EXPENSE, TRANSFER_TO_SAVINGS],
            CategoryView::BusinessExpenses | CategoryView::PersonalExpenses => &[EXPENSE],
            CategoryView::BusinessRevenue | CategoryView::PersonalRevenue => &[REVENUE],
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CategoryView::BusinessExpensesAndTaxes => "Business Expenses and Taxes - By Category",
            CategoryView::BusinessExpenses => "Business Expenses - By Category",
            CategoryView::BusinessRevenue => "Business Revenue - By Category",
            CategoryView::PersonalExpensesAndSavings => "Personal Expenses and Savings - By Category",
            CategoryView::PersonalExpenses => "Personal Expenses - By Category",
            CategoryView::PersonalRevenue => "Personal Revenue - By Category",
        }
    }
}

impl std::str::FromStr for CategoryView {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoryView::all()
            .into_iter()
            .find(|view| view.slug() == s)
            .ok_or_else(|| format!("Invalid category view: {}", s))
    }
}

/// Stacked totals or percent-of-month stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryMode {
    #[default]
    Stacked,
    Percent,
}

impl std::str::FromStr for CategoryMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stacked" => Ok(CategoryMode::Stacked),
            "percent" => Ok(CategoryMode::Percent),
            _ => Err(format!("Invalid chart type: {} (expected stacked or percent)", s)),
        }
    }
}

impl std::fmt::Display for CategoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryMode::Stacked => write!(f, "stacked"),
            CategoryMode::Percent => write!(f, "percent"),
        }
    }
}

const BY_CATEGORY: &str = "-by-category";
const PERCENT_SUFFIX: &str = "-percent";

/// Every chart the system can produce, addressed by slug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    BusinessExpenseVsRevenue,
    BusinessRevenueVsExpenseAndTax,
    PersonalRevenueVsExpenseAndSaving,
    BusinessSavings,
    BusinessWaterfall,
    Category { view: CategoryView, mode: CategoryMode },
}

impl ChartKind {
    pub fn all() -> Vec<ChartKind> {
        let mut kinds = vec![
            ChartKind::BusinessExpenseVsRevenue,
            ChartKind::BusinessRevenueVsExpenseAndTax,
            ChartKind::PersonalRevenueVsExpenseAndSaving,
            ChartKind::BusinessSavings,
            ChartKind::BusinessWaterfall,
        ];
        for view in CategoryView::all() {
            kinds.push(ChartKind::Category { view, mode: CategoryMode::Stacked });
            kinds.push(ChartKind::Category { view, mode: CategoryMode::Percent });
        }
        kinds
    }

    pub fn slug(&self) -> String {
        match self {
            ChartKind::BusinessExpenseVsRevenue => "business-expense-vs-revenue".to_string(),
            ChartKind::BusinessRevenueVsExpenseAndTax => "business-revenue-vs-expense-and-tax".to_string(),
            ChartKind::PersonalRevenueVsExpenseAndSaving => {
                "personal-revenue-vs-expense-and-saving".to_string()
            }
            ChartKind::BusinessSavings => "business-savings".to_string(),
            ChartKind::BusinessWaterfall => "business-waterfall".to_string(),
            ChartKind::Category { view, mode } => match mode {
                CategoryMode::Stacked => format!("{}{}", view.slug(), BY_CATEGORY),
                CategoryMode::Percent => format!("{}{}{}", view.slug(), BY_CATEGORY, PERCENT_SUFFIX),
            },
        }
    }

    pub fn title(&self) -> String {
        match self {
            ChartKind::BusinessExpenseVsRevenue => {
                "Business-Related Expense vs Revenue (Monthly Totals)".to_string()
            }
            ChartKind::BusinessRevenueVsExpenseAndTax => {
                "Business Revenue vs Expense (and Tax) - Totals".to_string()
            }
            ChartKind::PersonalRevenueVsExpenseAndSaving => {
                "Personal Revenue vs Expense (and Saving) - Totals".to_string()
            }
            ChartKind::BusinessSavings => {
                "Business-Related Transfer to Savings (Monthly Totals)".to_string()
            }
            ChartKind::BusinessWaterfall => {
                "Business-Related Expense vs Revenue (Cumulative Waterfall)".to_string()
            }
            ChartKind::Category { view, mode } => match mode {
                CategoryMode::Stacked => view.title().to_string(),
                CategoryMode::Percent => format!("{} (%)", view.title()),
            },
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slug = s.trim().to_lowercase();
        if let Some(kind) = ChartKind::all().into_iter().find(|k| k.slug() == slug) {
            return Ok(kind);
        }
        Err(format!("Unknown chart: {}", s))
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.slug())
    }
}

// ==================== Report Structures ====================

/// A labelled figure shown beside a chart, e.g. total profit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub amount: f64,
}

impl SummaryLine {
    fn new(label: &str, amount: f64) -> Self {
        Self {
            label: label.to_string(),
            amount,
        }
    }
}

/// Monthly bars, one series per (display) cash-flow kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarReport {
    pub title: String,
    /// Series in legend order
    pub series: Vec<String>,
    pub months: Vec<String>,
    pub totals: Vec<MonthlyTotal>,
    /// Print each bar's total above it
    pub label_bars: bool,
    pub summary: Vec<SummaryLine>,
}

impl BarReport {
    pub fn total_for(&self, month_year: &str, series: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|t| t.month_year == month_year && t.series == series)
            .map(|t| t.amount)
    }
}

/// Per-date relative steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterfallReport {
    pub title: String,
    pub steps: Vec<WaterfallStep>,
}

impl WaterfallReport {
    /// End value of the waterfall
    pub fn net(&self) -> f64 {
        self.steps.iter().map(|s| s.amount).sum()
    }
}

/// Sub-category stacks per month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub title: String,
    pub view: CategoryView,
    pub mode: CategoryMode,
    pub months: Vec<String>,
    pub shares: Vec<CategoryShare>,
}

impl CategoryReport {
    /// Sub-categories in stacking order, each with its main category
    pub fn sub_categories(&self) -> Vec<(&str, &str)> {
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for share in &self.shares {
            let key = (share.sub_category.as_str(), share.main_category.as_str());
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }

    /// Month -> total of everything in view, in month order
    pub fn monthly_totals(&self) -> Vec<(&str, f64)> {
        self.months
            .iter()
            .filter_map(|month| {
                self.shares
                    .iter()
                    .find(|s| &s.month_year == month)
                    .map(|s| (month.as_str(), s.monthly_total))
            })
            .collect()
    }
}

/// Chart-ready data for any catalogue entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Report {
    Bar(BarReport),
    Waterfall(WaterfallReport),
    Category(CategoryReport),
}

impl Report {
    pub fn title(&self) -> &str {
        match self {
            Report::Bar(r) => &r.title,
            Report::Waterfall(r) => &r.title,
            Report::Category(r) => &r.title,
        }
    }
}

// ==================== Builders ====================

/// Shape `table` into the report for `kind`
pub fn build_report(kind: ChartKind, table: &TransactionTable) -> Report {
    match kind {
        ChartKind::BusinessExpenseVsRevenue => Report::Bar(business_expense_vs_revenue(table)),
        ChartKind::BusinessRevenueVsExpenseAndTax => {
            Report::Bar(business_revenue_vs_expense_and_tax(table))
        }
        ChartKind::PersonalRevenueVsExpenseAndSaving => {
            Report::Bar(personal_revenue_vs_expense_and_saving(table))
        }
        ChartKind::BusinessSavings => Report::Bar(business_savings(table)),
        ChartKind::BusinessWaterfall => Report::Waterfall(business_waterfall(table)),
        ChartKind::Category { view, mode } => Report::Category(by_category(table, view, mode)),
    }
}

/// Revenue against expenses, with `outflow` shown as part of Expense
fn revenue_vs_outflow(
    table: &TransactionTable,
    scope: BusinessScope,
    outflow: &'static str,
    kind: ChartKind,
    label_bars: bool,
) -> (BarReport, [f64; 3]) {
    let scoped = filter_scope(table, scope);
    let combined = filter_kinds(&scoped, &[REVENUE, EXPENSE, outflow]);

    let totals = monthly_totals(&combined.rows, |row| {
        row.cash_flow_type
            .as_deref()
            .map(|kind| display_kind(kind, &[outflow]).to_string())
    });
    let sums = [
        kind_total(&combined, REVENUE),
        kind_total(&combined, EXPENSE),
        kind_total(&combined, outflow),
    ];

    let report = BarReport {
        title: kind.title(),
        series: vec![REVENUE.to_string(), EXPENSE.to_string()],
        months: sorted_months(&combined.rows),
        totals,
        label_bars,
        summary: Vec::new(),
    };
    (report, sums)
}

/// Business revenue vs expense, savings transfers counted as expense
pub fn business_expense_vs_revenue(table: &TransactionTable) -> BarReport {
    let (mut report, [revenue, expense, savings]) = revenue_vs_outflow(
        table,
        BusinessScope::Business,
        TRANSFER_TO_SAVINGS,
        ChartKind::BusinessExpenseVsRevenue,
        false,
    );
    report.summary.push(SummaryLine::new(
        "Total 'Profit' (after transferring to savings)",
        revenue - expense - savings,
    ));
    report
}

/// Business revenue vs expense, tax reserves counted as expense
pub fn business_revenue_vs_expense_and_tax(table: &TransactionTable) -> BarReport {
    let (mut report, [revenue, expense, taxes]) = revenue_vs_outflow(
        table,
        BusinessScope::Business,
        RESERVED_FOR_TAXES,
        ChartKind::BusinessRevenueVsExpenseAndTax,
        true,
    );
    report.summary.push(SummaryLine::new(
        "Total After-Tax Working Capital",
        revenue - expense - taxes,
    ));
    report
        .summary
        .push(SummaryLine::new("Total Reserved for Taxes", taxes));
    report
}

/// Personal revenue vs expense, savings transfers counted as expense
pub fn personal_revenue_vs_expense_and_saving(table: &TransactionTable) -> BarReport {
    let (mut report, [revenue, expense, savings]) = revenue_vs_outflow(
        table,
        BusinessScope::Personal,
        TRANSFER_TO_SAVINGS,
        ChartKind::PersonalRevenueVsExpenseAndSaving,
        true,
    );
    report.summary.push(SummaryLine::new(
        "Total Personal Wiggle Room",
        revenue - expense - savings,
    ));
    report.summary.push(SummaryLine::new("Total Savings", savings));
    report
}

/// Monthly business transfers to savings
pub fn business_savings(table: &TransactionTable) -> BarReport {
    let savings = filter_kinds(
        &filter_scope(table, BusinessScope::Business),
        &[TRANSFER_TO_SAVINGS],
    );
    let totals = monthly_totals(&savings.rows, |row| row.cash_flow_type.clone());

    BarReport {
        title: ChartKind::BusinessSavings.title(),
        series: vec![TRANSFER_TO_SAVINGS.to_string()],
        months: sorted_months(&savings.rows),
        totals,
        label_bars: false,
        summary: vec![SummaryLine::new("Total Accumulated", savings.total())],
    }
}

/// Business cash movement per date
pub fn business_waterfall(table: &TransactionTable) -> WaterfallReport {
    let scoped = filter_scope(table, BusinessScope::Business);
    WaterfallReport {
        title: ChartKind::BusinessWaterfall.title(),
        steps: waterfall(&scoped.rows),
    }
}

/// Sub-category breakdown of one view
pub fn by_category(table: &TransactionTable, view: CategoryView, mode: CategoryMode) -> CategoryReport {
    let rows = filter_kinds(&filter_scope(table, view.scope()), view.kinds());
    let shares = category_breakdown(&rows.rows);
    let mut months: Vec<String> = shares.iter().map(|s| s.month_year.clone()).collect();
    months.sort();
    months.dedup();

    CategoryReport {
        title: ChartKind::Category { view, mode }.title(),
        view,
        mode,
        months,
        shares,
    }
}
