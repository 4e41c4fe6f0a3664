use contracts::dashboards::d402_order_sales::KpiSummary;

use super::metrics::safe_percent;
use super::records::{OrderRecord, SalesRecord};

/// Dataset-wide totals. Pass filtered rows for the selected period, or the
/// unfiltered normalized rows for all-time totals.
pub fn summarize(orders: &[OrderRecord], sales: &[SalesRecord]) -> KpiSummary {
    let ordered_qty: f64 = orders.iter().map(|o| o.quantity).sum();
    let ordered_sum: f64 = orders.iter().map(|o| o.amount).sum();
    let sold_qty: f64 = sales.iter().map(|s| s.sold_quantity).sum();
    let sold_sum: f64 = sales.iter().map(|s| s.sold_amount).sum();
    let returned_qty: f64 = sales.iter().map(|s| s.returned_quantity).sum();
    let returned_sum: f64 = sales.iter().map(|s| s.returned_amount).sum();

    KpiSummary {
        ordered_qty,
        ordered_sum,
        sold_qty,
        sold_sum,
        returned_qty,
        returned_sum,
        delivered_qty: sold_qty - returned_qty,
        delivered_sum: sold_sum - returned_sum,
        sold_percent: safe_percent(sold_qty, ordered_qty),
        return_percent: safe_percent(returned_qty, ordered_qty),
    }
}
