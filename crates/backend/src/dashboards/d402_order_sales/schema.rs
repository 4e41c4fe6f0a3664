use contracts::dashboards::d402_order_sales::{ColumnInfo, ColumnKind, DatasetColumns, GroupKey};
use std::fmt;

use crate::shared::config::{ColumnsConfig, OrderColumns, SalesColumns};

/// Canonical field names, shared by both datasets where they overlap
pub mod fields {
    pub const PERIOD: &str = "period";
    pub const QUANTITY: &str = "quantity";
    pub const AMOUNT: &str = "amount";
    pub const SOLD_QUANTITY: &str = "sold_quantity";
    pub const RETURNED_QUANTITY: &str = "returned_quantity";
    pub const SOLD_AMOUNT: &str = "sold_amount";
    pub const RETURNED_AMOUNT: &str = "returned_amount";
    pub const PRODUCT: &str = "product";
    pub const COUNTERPARTY: &str = "counterparty";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Orders,
    Sales,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Orders => "orders",
            Dataset::Sales => "sales",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column the grouping key is read from
pub fn identity_field(key: GroupKey) -> &'static str {
    match key {
        GroupKey::Product => fields::PRODUCT,
        GroupKey::Counterparty => fields::COUNTERPARTY,
    }
}

/// One declared column of a dataset
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub field: &'static str,
    pub kind: ColumnKind,
    /// Accepted source headers, in priority order
    pub headers: Vec<String>,
}

impl ColumnSpec {
    fn new(field: &'static str, kind: ColumnKind, headers: &[String]) -> Self {
        Self {
            field,
            kind,
            headers: headers.to_vec(),
        }
    }

    /// Pick the first accepted header present in the upload.
    /// Comparison ignores surrounding whitespace and case.
    pub fn resolve<'a>(&self, available: &[&'a str]) -> Option<&'a str> {
        self.headers.iter().find_map(|wanted| {
            let wanted = wanted.trim().to_lowercase();
            available
                .iter()
                .find(|h| h.trim().to_lowercase() == wanted)
                .copied()
        })
    }
}

/// Declared columns of one dataset
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    pub dataset: Dataset,
    pub columns: Vec<ColumnSpec>,
}

impl DatasetSchema {
    pub fn orders(cfg: &OrderColumns) -> Self {
        Self {
            dataset: Dataset::Orders,
            columns: vec![
                ColumnSpec::new(fields::PERIOD, ColumnKind::Date, &cfg.period),
                ColumnSpec::new(fields::QUANTITY, ColumnKind::Number, &cfg.quantity),
                ColumnSpec::new(fields::AMOUNT, ColumnKind::Number, &cfg.amount),
                ColumnSpec::new(fields::PRODUCT, ColumnKind::Text, &cfg.product),
                ColumnSpec::new(fields::COUNTERPARTY, ColumnKind::Text, &cfg.counterparty),
            ],
        }
    }

    pub fn sales(cfg: &SalesColumns) -> Self {
        Self {
            dataset: Dataset::Sales,
            columns: vec![
                ColumnSpec::new(fields::PERIOD, ColumnKind::Date, &cfg.period),
                ColumnSpec::new(fields::SOLD_QUANTITY, ColumnKind::Number, &cfg.sold_quantity),
                ColumnSpec::new(
                    fields::RETURNED_QUANTITY,
                    ColumnKind::Number,
                    &cfg.returned_quantity,
                ),
                ColumnSpec::new(fields::SOLD_AMOUNT, ColumnKind::Number, &cfg.sold_amount),
                ColumnSpec::new(
                    fields::RETURNED_AMOUNT,
                    ColumnKind::Number,
                    &cfg.returned_amount,
                ),
                ColumnSpec::new(fields::PRODUCT, ColumnKind::Text, &cfg.product),
                ColumnSpec::new(fields::COUNTERPARTY, ColumnKind::Text, &cfg.counterparty),
            ],
        }
    }

    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn to_dto(&self) -> DatasetColumns {
        DatasetColumns {
            dataset: self.dataset.as_str().to_string(),
            columns: self
                .columns
                .iter()
                .map(|c| ColumnInfo {
                    field: c.field.to_string(),
                    kind: c.kind,
                    headers: c.headers.clone(),
                })
                .collect(),
        }
    }
}

/// Both schemas built from the configured header aliases
pub fn schemas(cfg: &ColumnsConfig) -> (DatasetSchema, DatasetSchema) {
    (DatasetSchema::orders(&cfg.orders), DatasetSchema::sales(&cfg.sales))
}
