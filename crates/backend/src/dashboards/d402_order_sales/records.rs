use chrono::NaiveDate;
use contracts::dashboards::d402_order_sales::GroupKey;

/// Normalized order line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderRecord {
    /// None when the source value could not be read as a date
    pub period: Option<NaiveDate>,
    pub quantity: f64,
    pub amount: f64,
    pub product: String,
    pub counterparty: String,
}

/// Normalized sales/returns line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesRecord {
    pub period: Option<NaiveDate>,
    pub sold_quantity: f64,
    pub returned_quantity: f64,
    pub sold_amount: f64,
    pub returned_amount: f64,
    pub product: String,
    pub counterparty: String,
}

/// Records that can be placed on the calendar
pub trait Dated {
    fn period(&self) -> Option<NaiveDate>;
}

/// Records that can be grouped by product or counterparty
pub trait Keyed {
    /// Empty string when the row has no value for this key
    fn key(&self, key: GroupKey) -> &str;
}

impl Dated for OrderRecord {
    fn period(&self) -> Option<NaiveDate> {
        self.period
    }
}

impl Dated for SalesRecord {
    fn period(&self) -> Option<NaiveDate> {
        self.period
    }
}

impl Keyed for OrderRecord {
    fn key(&self, key: GroupKey) -> &str {
        match key {
            GroupKey::Product => &self.product,
            GroupKey::Counterparty => &self.counterparty,
        }
    }
}

impl Keyed for SalesRecord {
    fn key(&self, key: GroupKey) -> &str {
        match key {
            GroupKey::Product => &self.product,
            GroupKey::Counterparty => &self.counterparty,
        }
    }
}
