use contracts::dashboards::d402_order_sales::KpiSummary;
use contracts::shared::indicators::*;

/// Well-known indicator IDs (constants to avoid typos).
pub mod ids {
    use super::*;

    pub fn ordered_qty() -> IndicatorId {
        IndicatorId::new("d402_ordered_qty")
    }
    pub fn ordered_sum() -> IndicatorId {
        IndicatorId::new("d402_ordered_sum")
    }
    pub fn sold_qty() -> IndicatorId {
        IndicatorId::new("d402_sold_qty")
    }
    pub fn sold_sum() -> IndicatorId {
        IndicatorId::new("d402_sold_sum")
    }
    pub fn returned_qty() -> IndicatorId {
        IndicatorId::new("d402_returned_qty")
    }
    pub fn returned_sum() -> IndicatorId {
        IndicatorId::new("d402_returned_sum")
    }
    pub fn delivered_qty() -> IndicatorId {
        IndicatorId::new("d402_delivered_qty")
    }
    pub fn delivered_sum() -> IndicatorId {
        IndicatorId::new("d402_delivered_sum")
    }
    pub fn sold_percent() -> IndicatorId {
        IndicatorId::new("d402_sold_percent")
    }
    pub fn return_percent() -> IndicatorId {
        IndicatorId::new("d402_return_percent")
    }
}

fn card(
    id: IndicatorId,
    label: &str,
    icon: &str,
    format: ValueFormat,
    value: f64,
) -> IndicatorCard {
    IndicatorCard {
        id,
        label: label.to_string(),
        icon: icon.to_string(),
        format,
        value,
        status: IndicatorStatus::Neutral,
    }
}

fn count(id: IndicatorId, label: &str, icon: &str, value: f64) -> IndicatorCard {
    card(id, label, icon, ValueFormat::Integer, value)
}

fn percent(id: IndicatorId, label: &str, value: f64) -> IndicatorCard {
    card(id, label, "percent", ValueFormat::Percent { decimals: 2 }, value)
}

/// Negative delivery is a loss; over 100% of the ordered quantity points at a data anomaly.
fn status_for(card: &IndicatorCard) -> IndicatorStatus {
    let delivered = card.id == ids::delivered_qty() || card.id == ids::delivered_sum();
    match card.format {
        _ if delivered && card.value < 0.0 => IndicatorStatus::Bad,
        ValueFormat::Percent { .. } if card.value > 100.0 => IndicatorStatus::Warning,
        _ => IndicatorStatus::Neutral,
    }
}

/// The ten summary KPIs as display cards, in the order the dashboard shows them.
pub fn summary_cards(summary: &KpiSummary, currency: &str) -> Vec<IndicatorCard> {
    let money = |id: IndicatorId, label: &str, icon: &str, value: f64| {
        let format = ValueFormat::Money {
            currency: currency.to_string(),
        };
        card(id, label, icon, format, value)
    };

    let mut cards = vec![
        count(ids::ordered_qty(), "Заказано, шт", "orders", summary.ordered_qty),
        money(ids::ordered_sum(), "Сумма заказов", "dollar-sign", summary.ordered_sum),
        count(ids::sold_qty(), "Продано, шт", "package", summary.sold_qty),
        money(ids::sold_sum(), "Сумма продаж", "dollar-sign", summary.sold_sum),
        count(ids::returned_qty(), "Возвращено, шт", "package-x", summary.returned_qty),
        money(ids::returned_sum(), "Сумма возвратов", "package-x", summary.returned_sum),
        count(ids::delivered_qty(), "Доставлено, шт", "truck", summary.delivered_qty),
        money(ids::delivered_sum(), "Сумма доставленного", "truck", summary.delivered_sum),
        percent(ids::sold_percent(), "Процент продаж", summary.sold_percent),
        percent(ids::return_percent(), "Процент возвратов", summary.return_percent),
    ];
    for card in &mut cards {
        card.status = status_for(card);
    }
    cards
}
