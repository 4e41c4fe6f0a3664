use contracts::dashboards::d402_order_sales::{
    AnalysisParams, OrderSalesOutcome, OrderSalesReport,
};
use contracts::shared::table::RawRecord;
use uuid::Uuid;

use super::error::AnalysisError;
use super::indicators::summary_cards;
use super::kpi_summary::summarize;
use super::normalizer::{normalize_orders, normalize_sales};
use super::range_filter::{filter_by_range, observed_bounds, resolve_range};
use super::reconciliation::{rank_by_delivered, reconcile};
use super::schema;
use super::weekday_trend::weekday_trend;
use crate::shared::config::Config;

/// Run the whole pipeline for one request.
///
/// `None` for a dataset means the file has not been uploaded yet. Everything is
/// recomputed from the raw rows on every call.
pub fn compute_kpis(
    orders: Option<&[RawRecord]>,
    sales: Option<&[RawRecord]>,
    params: &AnalysisParams,
    config: &Config,
) -> Result<OrderSalesOutcome, AnalysisError> {
    let (orders_raw, sales_raw) = match (orders, sales) {
        (Some(orders), Some(sales)) => (orders, sales),
        (orders, sales) => {
            let mut missing = Vec::new();
            if orders.is_none() {
                missing.push("orders".to_string());
            }
            if sales.is_none() {
                missing.push("sales".to_string());
            }
            tracing::info!("D402: waiting for uploads: {:?}", missing);
            return Ok(OrderSalesOutcome::NoData { missing });
        }
    };

    let (orders_schema, sales_schema) = schema::schemas(&config.columns);
    let orders = normalize_orders(orders_raw, &orders_schema, params.group_key)?;
    let sales = normalize_sales(sales_raw, &sales_schema, params.group_key)?;
    let coercion = vec![orders.report.clone(), sales.report.clone()];

    let observed = observed_bounds(&orders.records, &sales.records);
    let range = match resolve_range(
        params.date_from.as_deref(),
        params.date_to.as_deref(),
        observed,
    )? {
        Some(range) => range,
        None => {
            tracing::info!("D402: no row has a usable period");
            return Ok(OrderSalesOutcome::Empty {
                date_from: params.date_from.clone(),
                date_to: params.date_to.clone(),
                coercion,
            });
        }
    };

    let orders_in_range = filter_by_range(&orders.records, &range);
    let sales_in_range = filter_by_range(&sales.records, &range);

    if orders_in_range.is_empty() && sales_in_range.is_empty() {
        tracing::info!("D402: nothing between {} and {}", range.start, range.end);
        return Ok(OrderSalesOutcome::Empty {
            date_from: Some(range.start.to_string()),
            date_to: Some(range.end.to_string()),
            coercion,
        });
    }

    let join_mode = params.join_mode.unwrap_or(config.analysis.join_mode);
    let top_n = params.top_n.unwrap_or(config.analysis.top_n);

    let reconciliation = reconcile(
        &orders_in_range,
        &sales_in_range,
        params.group_key,
        join_mode,
    );
    let top_delivered = rank_by_delivered(&reconciliation.rows, top_n);
    let summary = summarize(&orders_in_range, &sales_in_range);
    let cards = summary_cards(&summary, &config.analysis.currency);

    let report = OrderSalesReport {
        analysis_id: Uuid::new_v4().to_string(),
        date_from: range.start.to_string(),
        date_to: range.end.to_string(),
        group_key: params.group_key,
        join_mode,
        orders_in_range: orders_in_range.len(),
        sales_in_range: sales_in_range.len(),
        summary,
        cards,
        groups: reconciliation.rows,
        top_delivered,
        weekday_orders: weekday_trend(&orders_in_range, |o| o.quantity),
        weekday_returns: weekday_trend(&sales_in_range, |s| s.returned_quantity),
        unmatched_sales: reconciliation.unmatched,
        coercion,
    };

    tracing::info!(
        "D402: analysis {} {}..{} by {}: {} orders, {} sales rows, {} groups",
        report.analysis_id,
        report.date_from,
        report.date_to,
        report.group_key.as_str(),
        report.orders_in_range,
        report.sales_in_range,
        report.groups.len()
    );

    Ok(OrderSalesOutcome::Ready(Box::new(report)))
}
