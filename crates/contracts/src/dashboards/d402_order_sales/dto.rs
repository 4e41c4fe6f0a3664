use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::shared::indicators::IndicatorCard;
use crate::shared::table::RawRecord;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Key the orders and sales are reconciled by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    #[default]
    Product,
    Counterparty,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Product => "product",
            GroupKey::Counterparty => "counterparty",
        }
    }
}

impl FromStr for GroupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "product" | "nomenclature" => Ok(GroupKey::Product),
            "counterparty" | "client" => Ok(GroupKey::Counterparty),
            other => Err(format!("unknown group key: {}", other)),
        }
    }
}

/// What happens to keys that only appear in sales/returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Left join anchored on orders: sales-only keys are dropped
    #[default]
    OrdersAnchored,
    /// Sales-only keys are kept as rows with zero ordered fields
    FullOuter,
}

impl JoinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinMode::OrdersAnchored => "orders_anchored",
            JoinMode::FullOuter => "full_outer",
        }
    }
}

impl FromStr for JoinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "orders_anchored" | "left" => Ok(JoinMode::OrdersAnchored),
            "full_outer" | "full" => Ok(JoinMode::FullOuter),
            other => Err(format!("unknown join mode: {}", other)),
        }
    }
}

/// Parameters of one analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisParams {
    /// Start date "YYYY-MM-DD" (inclusive); None = earliest observed period
    #[serde(default)]
    pub date_from: Option<String>,
    /// End date "YYYY-MM-DD" (inclusive); None = latest observed period
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub group_key: GroupKey,
    /// None = configured default
    #[serde(default)]
    pub join_mode: Option<JoinMode>,
    /// Length of the top-by-delivered list; None = configured default
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Request for POST /api/d402/analysis
///
/// `orders` / `sales` are `None` while the corresponding file has not been uploaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSalesAnalysisRequest {
    #[serde(default)]
    pub orders: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub sales: Option<Vec<RawRecord>>,
    #[serde(flatten)]
    pub params: AnalysisParams,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Which side of the join a KPI row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrigin {
    Matched,
    OrdersOnly,
    SalesOnly,
}

/// One reconciled row per product or counterparty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupKpiRow {
    pub key: String,
    pub origin: RowOrigin,
    pub ordered_qty: f64,
    pub ordered_sum: f64,
    pub sold_qty: f64,
    pub sold_sum: f64,
    pub returned_qty: f64,
    pub returned_sum: f64,
    /// sold - returned, may be negative
    pub delivered_qty: f64,
    pub delivered_sum: f64,
    pub sold_percent: f64,
    pub return_percent: f64,
}

/// Summed quantity for one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayBucket {
    /// English day name, "Monday".."Sunday"
    pub weekday: String,
    pub quantity: f64,
}

/// Dataset-wide totals over the selected period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub ordered_qty: f64,
    pub ordered_sum: f64,
    pub sold_qty: f64,
    pub sold_sum: f64,
    pub returned_qty: f64,
    pub returned_sum: f64,
    pub delivered_qty: f64,
    pub delivered_sum: f64,
    pub sold_percent: f64,
    pub return_percent: f64,
}

/// Sales/returns whose key has no order in the selected period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedSales {
    pub keys: usize,
    pub sold_qty: f64,
    pub sold_sum: f64,
    pub returned_qty: f64,
    pub returned_sum: f64,
}

/// Per-dataset diagnostics collected while normalizing raw rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub dataset: String,
    pub rows: usize,
    pub invalid_dates: usize,
    pub invalid_numbers: usize,
    /// Declared columns missing from the upload: numbers read as zero, text and dates as absent
    pub absent_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSalesReport {
    pub analysis_id: String,
    /// Effective period "YYYY-MM-DD" (inclusive on both ends)
    pub date_from: String,
    pub date_to: String,
    pub group_key: GroupKey,
    pub join_mode: JoinMode,
    pub orders_in_range: usize,
    pub sales_in_range: usize,
    pub summary: KpiSummary,
    pub cards: Vec<IndicatorCard>,
    /// Sorted by key
    pub groups: Vec<GroupKpiRow>,
    /// Sorted by delivered_qty descending
    pub top_delivered: Vec<GroupKpiRow>,
    pub weekday_orders: Vec<WeekdayBucket>,
    pub weekday_returns: Vec<WeekdayBucket>,
    pub unmatched_sales: UnmatchedSales,
    pub coercion: Vec<CoercionReport>,
}

/// Result of POST /api/d402/analysis
///
/// A fatal schema problem is not an outcome: it is returned as an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderSalesOutcome {
    /// At least one of the two files has not been uploaded yet
    NoData { missing: Vec<String> },
    /// Data is there, but nothing falls into the selected period
    Empty {
        date_from: Option<String>,
        date_to: Option<String>,
        coercion: Vec<CoercionReport>,
    },
    Ready(Box<OrderSalesReport>),
}

// ---------------------------------------------------------------------------
// Column catalogue
// ---------------------------------------------------------------------------

/// Semantic type a raw column is coerced to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Date,
    Number,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Canonical field name (e.g. "sold_quantity")
    pub field: String,
    pub kind: ColumnKind,
    /// Accepted source headers, first match wins
    pub headers: Vec<String>,
}

/// Response for GET /api/d402/columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetColumns {
    pub dataset: String,
    pub columns: Vec<ColumnInfo>,
}
