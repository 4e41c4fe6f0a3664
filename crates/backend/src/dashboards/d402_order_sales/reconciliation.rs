use contracts::dashboards::d402_order_sales::{
    GroupKey, GroupKpiRow, JoinMode, RowOrigin, UnmatchedSales,
};
use std::collections::BTreeMap;

use super::metrics::safe_percent;
use super::records::{Keyed, OrderRecord, SalesRecord};

/// Sums collected for one key
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    pub ordered_qty: f64,
    pub ordered_sum: f64,
    pub sold_qty: f64,
    pub sold_sum: f64,
    pub returned_qty: f64,
    pub returned_sum: f64,
}

/// Output of the join: KPI rows plus what the join could not place
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub rows: Vec<GroupKpiRow>,
    pub unmatched: UnmatchedSales,
}

/// Group orders by key. Rows with an empty key are not grouped.
pub fn aggregate_orders(orders: &[OrderRecord], key: GroupKey) -> BTreeMap<&str, GroupTotals> {
    let mut groups: BTreeMap<&str, GroupTotals> = BTreeMap::new();
    for order in orders {
        let k = order.key(key);
        if k.is_empty() {
            continue;
        }
        let totals = groups.entry(k).or_default();
        totals.ordered_qty += order.quantity;
        totals.ordered_sum += order.amount;
    }
    groups
}

/// Group sales/returns by key. Rows with an empty key are not grouped.
pub fn aggregate_sales(sales: &[SalesRecord], key: GroupKey) -> BTreeMap<&str, GroupTotals> {
    let mut groups: BTreeMap<&str, GroupTotals> = BTreeMap::new();
    for sale in sales {
        let k = sale.key(key);
        if k.is_empty() {
            continue;
        }
        let totals = groups.entry(k).or_default();
        totals.sold_qty += sale.sold_quantity;
        totals.sold_sum += sale.sold_amount;
        totals.returned_qty += sale.returned_quantity;
        totals.returned_sum += sale.returned_amount;
    }
    groups
}

/// Derived columns for one key
pub fn kpi_row(key: &str, origin: RowOrigin, totals: &GroupTotals) -> GroupKpiRow {
    GroupKpiRow {
        key: key.to_string(),
        origin,
        ordered_qty: totals.ordered_qty,
        ordered_sum: totals.ordered_sum,
        sold_qty: totals.sold_qty,
        sold_sum: totals.sold_sum,
        returned_qty: totals.returned_qty,
        returned_sum: totals.returned_sum,
        delivered_qty: totals.sold_qty - totals.returned_qty,
        delivered_sum: totals.sold_sum - totals.returned_sum,
        sold_percent: safe_percent(totals.sold_qty, totals.ordered_qty),
        return_percent: safe_percent(totals.returned_qty, totals.ordered_qty),
    }
}

/// Join sales onto orders by `key`.
///
/// Every ordered key yields exactly one row. Sales-only keys are counted in
/// `unmatched` and, in `FullOuter` mode, also emitted as rows. Rows are sorted by key.
pub fn reconcile(
    orders: &[OrderRecord],
    sales: &[SalesRecord],
    key: GroupKey,
    mode: JoinMode,
) -> Reconciliation {
    let ordered = aggregate_orders(orders, key);
    let sold = aggregate_sales(sales, key);

    let mut rows = Vec::with_capacity(ordered.len());
    for (k, order_totals) in &ordered {
        let (origin, totals) = match sold.get(k) {
            Some(sale_totals) => (
                RowOrigin::Matched,
                GroupTotals {
                    ordered_qty: order_totals.ordered_qty,
                    ordered_sum: order_totals.ordered_sum,
                    ..*sale_totals
                },
            ),
            None => (RowOrigin::OrdersOnly, *order_totals),
        };
        rows.push(kpi_row(k, origin, &totals));
    }

    let mut unmatched = UnmatchedSales::default();
    for (k, sale_totals) in &sold {
        if ordered.contains_key(k) {
            continue;
        }
        unmatched.keys += 1;
        unmatched.sold_qty += sale_totals.sold_qty;
        unmatched.sold_sum += sale_totals.sold_sum;
        unmatched.returned_qty += sale_totals.returned_qty;
        unmatched.returned_sum += sale_totals.returned_sum;

        if mode == JoinMode::FullOuter {
            rows.push(kpi_row(k, RowOrigin::SalesOnly, sale_totals));
        }
    }

    if mode == JoinMode::FullOuter {
        rows.sort_by(|a, b| a.key.cmp(&b.key));
    }

    if unmatched.keys > 0 {
        tracing::warn!(
            "D402: {} {} key(s) have sales but no orders (sold={}, returned={}), mode {}",
            unmatched.keys,
            key.as_str(),
            unmatched.sold_qty,
            unmatched.returned_qty,
            mode.as_str()
        );
    }

    Reconciliation { rows, unmatched }
}

/// Top-N view: highest `delivered_qty` first, ties broken by key
pub fn rank_by_delivered(rows: &[GroupKpiRow], top_n: usize) -> Vec<GroupKpiRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        b.delivered_qty
            .total_cmp(&a.delivered_qty)
            .then_with(|| a.key.cmp(&b.key))
    });
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, 1)
    }

    fn order(product: &str, quantity: f64, amount: f64) -> OrderRecord {
        OrderRecord {
            period: day(),
            quantity,
            amount,
            product: product.to_string(),
            counterparty: format!("client-{}", product),
        }
    }

    fn sale(product: &str, sold: (f64, f64), returned: (f64, f64)) -> SalesRecord {
        SalesRecord {
            period: day(),
            sold_quantity: sold.0,
            sold_amount: sold.1,
            returned_quantity: returned.0,
            returned_amount: returned.1,
            product: product.to_string(),
            counterparty: format!("client-{}", product),
        }
    }

    fn find<'a>(rows: &'a [GroupKpiRow], key: &str) -> Option<&'a GroupKpiRow> {
        rows.iter().find(|r| r.key == key)
    }

    #[test]
    fn test_single_product_kpis() {
        let orders = vec![order("X", 10.0, 100.0)];
        let sales = vec![sale("X", (4.0, 40.0), (1.0, 10.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let x = find(&result.rows, "X").unwrap();

        assert_eq!(x.origin, RowOrigin::Matched);
        assert_eq!(x.ordered_qty, 10.0);
        assert_eq!(x.ordered_sum, 100.0);
        assert_eq!(x.sold_qty, 4.0);
        assert_eq!(x.returned_qty, 1.0);
        assert_eq!(x.delivered_qty, 3.0);
        assert_eq!(x.delivered_sum, 30.0);
        assert_eq!(x.sold_percent, 40.0);
        assert_eq!(x.return_percent, 10.0);
    }

    #[test]
    fn test_sales_only_key_is_dropped() {
        let orders = vec![order("X", 10.0, 100.0)];
        let sales = vec![
            sale("X", (4.0, 40.0), (0.0, 0.0)),
            sale("Y", (7.0, 70.0), (2.0, 20.0)),
        ];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);

        assert_eq!(result.rows.len(), 1);
        assert!(find(&result.rows, "Y").is_none());
        assert_eq!(result.unmatched.keys, 1);
        assert_eq!(result.unmatched.sold_qty, 7.0);
        assert_eq!(result.unmatched.returned_sum, 20.0);
    }

    #[test]
    fn test_full_outer_keeps_sales_only_key() {
        let orders = vec![order("X", 10.0, 100.0)];
        let sales = vec![sale("A", (7.0, 70.0), (2.0, 20.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::FullOuter);
        let keys: Vec<&str> = result.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "X"]);

        let a = find(&result.rows, "A").unwrap();
        assert_eq!(a.origin, RowOrigin::SalesOnly);
        assert_eq!(a.ordered_qty, 0.0);
        assert_eq!(a.delivered_qty, 5.0);
        assert_eq!(a.sold_percent, 0.0);
        assert_eq!(result.unmatched.keys, 1);
    }

    #[test]
    fn test_order_without_sales_gets_zeros() {
        let orders = vec![order("X", 10.0, 100.0), order("Z", 3.0, 30.0)];
        let sales = vec![sale("X", (4.0, 40.0), (0.0, 0.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let z = find(&result.rows, "Z").unwrap();

        assert_eq!(z.origin, RowOrigin::OrdersOnly);
        assert_eq!(z.sold_qty, 0.0);
        assert_eq!(z.sold_percent, 0.0);
        assert_eq!(z.return_percent, 0.0);
    }

    #[test]
    fn test_zero_ordered_qty_guards_percentages() {
        let orders = vec![order("Z", 0.0, 0.0)];
        let sales = vec![sale("Z", (5.0, 50.0), (3.0, 30.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let z = find(&result.rows, "Z").unwrap();

        assert_eq!(z.sold_percent, 0.0);
        assert_eq!(z.return_percent, 0.0);
        assert!(result
            .rows
            .iter()
            .all(|r| r.sold_percent.is_finite() && r.return_percent.is_finite()));
    }

    #[test]
    fn test_delivered_can_be_negative() {
        let orders = vec![order("X", 10.0, 100.0)];
        let sales = vec![sale("X", (2.0, 20.0), (5.0, 50.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let x = find(&result.rows, "X").unwrap();

        assert_eq!(x.delivered_qty, -3.0);
        assert_eq!(x.delivered_sum, -30.0);
        assert_eq!(x.return_percent, 50.0);
    }

    #[test]
    fn test_one_row_per_ordered_key() {
        let orders = vec![
            order("X", 1.0, 10.0),
            order("X", 2.0, 20.0),
            order("Y", 5.0, 50.0),
            order("", 9.0, 90.0),
        ];
        let sales = vec![sale("X", (1.0, 10.0), (0.0, 0.0)), sale("X", (1.0, 10.0), (0.0, 0.0))];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let keys: Vec<&str> = result.rows.iter().map(|r| r.key.as_str()).collect();

        assert_eq!(keys, vec!["X", "Y"]);
        let x = find(&result.rows, "X").unwrap();
        assert_eq!(x.ordered_qty, 3.0);
        assert_eq!(x.sold_qty, 2.0);
    }

    #[test]
    fn test_reconcile_is_repeatable() {
        let orders = vec![order("X", 10.0, 100.0), order("Y", 4.0, 40.0)];
        let sales = vec![sale("Y", (4.0, 40.0), (1.0, 10.0)), sale("Q", (1.0, 1.0), (0.0, 0.0))];

        let first = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let second = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);

        assert_eq!(first.rows, second.rows);
        assert_eq!(first.unmatched, second.unmatched);
    }

    #[test]
    fn test_group_by_counterparty() {
        let orders = vec![order("X", 10.0, 100.0)];
        let sales = vec![sale("X", (4.0, 40.0), (0.0, 0.0))];

        let result = reconcile(&orders, &sales, GroupKey::Counterparty, JoinMode::OrdersAnchored);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, "client-X");
        assert_eq!(result.rows[0].sold_qty, 4.0);
    }

    #[test]
    fn test_rank_by_delivered() {
        let orders = vec![order("A", 1.0, 1.0), order("B", 1.0, 1.0), order("C", 1.0, 1.0)];
        let sales = vec![
            sale("A", (2.0, 0.0), (0.0, 0.0)),
            sale("B", (9.0, 0.0), (1.0, 0.0)),
            sale("C", (2.0, 0.0), (0.0, 0.0)),
        ];

        let result = reconcile(&orders, &sales, GroupKey::Product, JoinMode::OrdersAnchored);
        let top = rank_by_delivered(&result.rows, 2);
        let keys: Vec<&str> = top.iter().map(|r| r.key.as_str()).collect();

        assert_eq!(keys, vec!["B", "A"]);
    }
}
