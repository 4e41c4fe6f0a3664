use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value of a single cell in an uploaded table.
///
/// Deserialized untagged, so a JSON row like `{"Количество": 10, "Период": "2024-01-01"}`
/// maps straight onto the variants below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// True for `Null` and for text that is empty after trimming
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One row of an uploaded dataset: source header -> cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    pub values: HashMap<String, CellValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures and CSV readers
    pub fn with(mut self, header: &str, value: impl Into<CellValue>) -> Self {
        self.values.insert(header.to_string(), value.into());
        self
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.values.get(header)
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }
}
