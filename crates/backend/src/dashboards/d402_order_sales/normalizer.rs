use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};
use contracts::dashboards::d402_order_sales::{CoercionReport, GroupKey};
use contracts::shared::table::{CellValue, RawRecord};
use std::collections::{BTreeSet, HashMap};

use super::error::AnalysisError;
use super::records::{OrderRecord, SalesRecord};
use super::schema::{fields, identity_field, DatasetSchema};

/// Outcome of coercing one cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced<T> {
    Value(T),
    /// Empty cell: not a failure
    Blank,
    /// Present but unreadable
    Invalid,
}

/// Normalized dataset plus what went wrong on the way
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub report: CoercionReport,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

/// 9999-12-31 in the Excel 1900 date system
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

pub fn parse_number(cell: &CellValue) -> Coerced<f64> {
    match cell {
        CellValue::Null => Coerced::Blank,
        CellValue::Bool(b) => Coerced::Value(if *b { 1.0 } else { 0.0 }),
        CellValue::Integer(i) => Coerced::Value(*i as f64),
        CellValue::Number(n) if n.is_finite() => Coerced::Value(*n),
        CellValue::Number(_) => Coerced::Invalid,
        CellValue::Text(s) => parse_number_text(s),
    }
}

/// Accepts "1 234,50", "1.234,50", "1,234.50", "1.234.567" and plain "1234.5".
/// A lone comma is a decimal separator.
fn parse_number_text(s: &str) -> Coerced<f64> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Coerced::Blank;
    }

    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        // a repeated separator can only be grouping: "1.234.567", "1,234,567"
        (Some(_), None) if compact.matches(',').count() > 1 => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        (None, Some(_)) if compact.matches('.').count() > 1 => compact.replace('.', ""),
        _ => compact,
    };

    match normalized.parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Value(v),
        _ => Coerced::Invalid,
    }
}

/// Time of day is dropped: a period is a calendar day.
pub fn parse_date(cell: &CellValue) -> Coerced<NaiveDate> {
    match cell {
        CellValue::Null => Coerced::Blank,
        CellValue::Bool(_) => Coerced::Invalid,
        CellValue::Integer(i) => numeric_date(*i as f64),
        CellValue::Number(n) => numeric_date(*n),
        CellValue::Text(s) => parse_date_text(s),
    }
}

/// A date that arrived as a number: `20240101`, otherwise an Excel serial.
/// Four-digit values are bare years, not serials (2024 would land in 1905).
fn numeric_date(value: f64) -> Coerced<NaiveDate> {
    if !value.is_finite() {
        return Coerced::Invalid;
    }
    if value.fract() == 0.0 {
        if (1_000.0..10_000.0).contains(&value) {
            return Coerced::Invalid;
        }
        if (10_000_000.0..100_000_000.0).contains(&value) {
            return match NaiveDate::parse_from_str(&format!("{}", value as i64), "%Y%m%d") {
                Ok(d) => Coerced::Value(d),
                Err(_) => Coerced::Invalid,
            };
        }
    }
    excel_serial(value)
}

/// Plain digits with at most one decimal point
fn is_numeric_text(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars().all(|c| c.is_ascii_digit() || c == '.')
        && s.matches('.').count() <= 1
}

fn parse_date_text(s: &str) -> Coerced<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return Coerced::Blank;
    }

    if is_numeric_text(s) {
        return match s.parse::<f64>() {
            Ok(value) => numeric_date(value),
            Err(_) => Coerced::Invalid,
        };
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Coerced::Value(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Coerced::Value(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Coerced::Value(dt.date_naive());
    }

    Coerced::Invalid
}

/// Excel serial day (1900 system, epoch 1899-12-30)
fn excel_serial(serial: f64) -> Coerced<NaiveDate> {
    if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return Coerced::Invalid;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(Days::new(serial.floor() as u64)))
        .map(Coerced::Value)
        .unwrap_or(Coerced::Invalid)
}

/// Product codes often arrive as numbers: 12345.0 is rendered as "12345".
pub fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Bool(b) => b.to_string(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
            format!("{}", *n as i64)
        }
        CellValue::Number(n) => n.to_string(),
        CellValue::Text(s) => s.trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Dataset normalization
// ---------------------------------------------------------------------------

/// Canonical field -> header actually used in this upload
type ResolvedColumns = HashMap<&'static str, String>;

/// A column counts as present when at least one row carries it.
fn resolve_columns(raw: &[RawRecord], schema: &DatasetSchema) -> ResolvedColumns {
    let available: BTreeSet<&str> = raw.iter().flat_map(|r| r.headers()).collect();
    let available: Vec<&str> = available.into_iter().collect();

    schema
        .columns
        .iter()
        .filter_map(|spec| {
            spec.resolve(&available)
                .map(|header| (spec.field, header.to_string()))
        })
        .collect()
}

struct RowReader<'a> {
    columns: &'a ResolvedColumns,
    report: &'a mut CoercionReport,
}

impl RowReader<'_> {
    fn cell<'r>(&self, row: &'r RawRecord, field: &str) -> Option<&'r CellValue> {
        self.columns.get(field).and_then(|header| row.get(header))
    }

    fn number(&mut self, row: &RawRecord, field: &str) -> f64 {
        match self.cell(row, field).map(parse_number) {
            Some(Coerced::Value(v)) => v,
            Some(Coerced::Invalid) => {
                self.report.invalid_numbers += 1;
                0.0
            }
            Some(Coerced::Blank) | None => 0.0,
        }
    }

    fn date(&mut self, row: &RawRecord, field: &str) -> Option<NaiveDate> {
        if !self.columns.contains_key(field) {
            return None;
        }
        match self.cell(row, field).map(parse_date) {
            Some(Coerced::Value(d)) => Some(d),
            _ => {
                self.report.invalid_dates += 1;
                None
            }
        }
    }

    fn text(&self, row: &RawRecord, field: &str) -> String {
        self.cell(row, field).map(cell_text).unwrap_or_default()
    }
}

/// Resolve headers, enforce the identity column and start the report.
/// An empty dataset has nothing to group, so the identity check is skipped.
fn prepare(
    raw: &[RawRecord],
    schema: &DatasetSchema,
    key: GroupKey,
) -> Result<(ResolvedColumns, CoercionReport), AnalysisError> {
    let columns = resolve_columns(raw, schema);
    let identity = identity_field(key);

    if !raw.is_empty() && !columns.contains_key(identity) {
        return Err(AnalysisError::MissingIdentityColumn {
            dataset: schema.dataset,
            column: identity,
        });
    }

    let absent_columns = if raw.is_empty() {
        Vec::new()
    } else {
        schema
            .columns
            .iter()
            .filter(|c| !columns.contains_key(c.field))
            .map(|c| c.field.to_string())
            .collect()
    };

    let report = CoercionReport {
        dataset: schema.dataset.as_str().to_string(),
        rows: raw.len(),
        invalid_dates: 0,
        invalid_numbers: 0,
        absent_columns,
    };

    Ok((columns, report))
}

fn log_report(report: &CoercionReport) {
    if report.invalid_dates > 0 || report.invalid_numbers > 0 {
        tracing::warn!(
            "D402: {} dataset: {} rows, {} unreadable dates, {} unreadable numbers",
            report.dataset,
            report.rows,
            report.invalid_dates,
            report.invalid_numbers
        );
    }
    if !report.absent_columns.is_empty() {
        tracing::info!(
            "D402: {} dataset has no columns {:?}, using defaults",
            report.dataset,
            report.absent_columns
        );
    }
}

pub fn normalize_orders(
    raw: &[RawRecord],
    schema: &DatasetSchema,
    key: GroupKey,
) -> Result<Normalized<OrderRecord>, AnalysisError> {
    let (columns, mut report) = prepare(raw, schema, key)?;

    let records = {
        let mut reader = RowReader {
            columns: &columns,
            report: &mut report,
        };
        raw.iter()
            .map(|row| OrderRecord {
                period: reader.date(row, fields::PERIOD),
                quantity: reader.number(row, fields::QUANTITY),
                amount: reader.number(row, fields::AMOUNT),
                product: reader.text(row, fields::PRODUCT),
                counterparty: reader.text(row, fields::COUNTERPARTY),
            })
            .collect()
    };

    log_report(&report);
    Ok(Normalized { records, report })
}

pub fn normalize_sales(
    raw: &[RawRecord],
    schema: &DatasetSchema,
    key: GroupKey,
) -> Result<Normalized<SalesRecord>, AnalysisError> {
    let (columns, mut report) = prepare(raw, schema, key)?;

    let records = {
        let mut reader = RowReader {
            columns: &columns,
            report: &mut report,
        };
        raw.iter()
            .map(|row| SalesRecord {
                period: reader.date(row, fields::PERIOD),
                sold_quantity: reader.number(row, fields::SOLD_QUANTITY),
                returned_quantity: reader.number(row, fields::RETURNED_QUANTITY),
                sold_amount: reader.number(row, fields::SOLD_AMOUNT),
                returned_amount: reader.number(row, fields::RETURNED_AMOUNT),
                product: reader.text(row, fields::PRODUCT),
                counterparty: reader.text(row, fields::COUNTERPARTY),
            })
            .collect()
    };

    log_report(&report);
    Ok(Normalized { records, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::d402_order_sales::schema::Dataset;
    use crate::shared::config::{OrderColumns, SalesColumns};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&CellValue::Integer(7)), Coerced::Value(7.0));
        assert_eq!(parse_number(&"5309,00".into()), Coerced::Value(5309.0));
        assert_eq!(parse_number(&"1 234,5".into()), Coerced::Value(1234.5));
        assert_eq!(parse_number(&"1\u{a0}234".into()), Coerced::Value(1234.0));
        assert_eq!(parse_number(&"1.234,50".into()), Coerced::Value(1234.5));
        assert_eq!(parse_number(&"1,234.50".into()), Coerced::Value(1234.5));
        assert_eq!(parse_number(&"-3".into()), Coerced::Value(-3.0));
        assert_eq!(parse_number(&"  ".into()), Coerced::Blank);
        assert_eq!(parse_number(&CellValue::Null), Coerced::Blank);
        assert_eq!(parse_number(&"abc".into()), Coerced::Invalid);
        assert_eq!(parse_number(&"NaN".into()), Coerced::Invalid);
        assert_eq!(parse_number(&CellValue::Number(f64::INFINITY)), Coerced::Invalid);
    }

    #[test]
    fn test_repeated_separator_is_grouping() {
        assert_eq!(parse_number(&"1.234.567".into()), Coerced::Value(1234567.0));
        assert_eq!(parse_number(&"1,234,567".into()), Coerced::Value(1234567.0));
        assert_eq!(parse_number(&"1.234.567,25".into()), Coerced::Value(1234567.25));
        assert_eq!(parse_number(&"1,234,567.25".into()), Coerced::Value(1234567.25));
        assert_eq!(parse_number(&"1.234,5,6".into()), Coerced::Invalid);
    }

    #[test]
    fn test_parse_date() {
        let jan1 = Coerced::Value(ymd(2024, 1, 1));
        assert_eq!(parse_date(&"2024-01-01".into()), jan1);
        assert_eq!(parse_date(&"01.01.2024".into()), jan1);
        assert_eq!(parse_date(&"01.01.2024 14:30".into()), jan1);
        assert_eq!(parse_date(&"2024-01-01 23:59:59".into()), jan1);
        assert_eq!(parse_date(&"2024-01-01T10:00:00.250".into()), jan1);
        assert_eq!(parse_date(&"2024-01-01T10:00:00+03:00".into()), jan1);
        assert_eq!(parse_date(&"20240101".into()), jan1);
        assert_eq!(parse_date(&CellValue::Integer(45292)), jan1);
        assert_eq!(parse_date(&CellValue::Number(45292.75)), jan1);
        assert_eq!(parse_date(&"45292".into()), jan1);
        assert_eq!(parse_date(&CellValue::Integer(20240101)), jan1);
        assert_eq!(parse_date(&CellValue::Number(20240101.0)), jan1);
    }

    #[test]
    fn test_serials_agree_across_cell_types() {
        // fractional serial = date plus time of day
        let jan1 = Coerced::Value(ymd(2024, 1, 1));
        assert_eq!(parse_date(&"45292.5".into()), jan1);
        assert_eq!(parse_date(&" 45292.5 ".into()), jan1);
        assert_eq!(parse_date(&CellValue::Number(45292.5)), jan1);

        assert_eq!(parse_date(&"20240230".into()), Coerced::Invalid);
        assert_eq!(parse_date(&CellValue::Integer(20240230)), Coerced::Invalid);
        assert_eq!(parse_date(&"45292.5.1".into()), Coerced::Invalid);
    }

    #[test]
    fn test_bare_year_is_not_a_serial() {
        assert_eq!(parse_date(&"2024".into()), Coerced::Invalid);
        assert_eq!(parse_date(&CellValue::Integer(2024)), Coerced::Invalid);
        assert_eq!(parse_date(&CellValue::Number(2024.0)), Coerced::Invalid);

        let schema = DatasetSchema::orders(&OrderColumns::default());
        let raw = vec![RawRecord::new()
            .with("Период", "2024")
            .with("Номенклатура", "X")];
        let normalized = normalize_orders(&raw, &schema, GroupKey::Product).unwrap();
        assert_eq!(normalized.records[0].period, None);
        assert_eq!(normalized.report.invalid_dates, 1);
    }

    #[test]
    fn test_parse_date_failures() {
        assert_eq!(parse_date(&CellValue::Null), Coerced::Blank);
        assert_eq!(parse_date(&"".into()), Coerced::Blank);
        assert_eq!(parse_date(&"not a date".into()), Coerced::Invalid);
        assert_eq!(parse_date(&"2024-13-45".into()), Coerced::Invalid);
        assert_eq!(parse_date(&CellValue::Integer(0)), Coerced::Invalid);
        assert_eq!(parse_date(&CellValue::Bool(true)), Coerced::Invalid);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&" Чай зелёный ".into()), "Чай зелёный");
        assert_eq!(cell_text(&CellValue::Number(12345.0)), "12345");
        assert_eq!(cell_text(&CellValue::Number(1.5)), "1.5");
        assert_eq!(cell_text(&CellValue::Null), "");
    }

    #[test]
    fn test_normalize_orders() {
        let schema = DatasetSchema::orders(&OrderColumns::default());
        let raw = vec![
            RawRecord::new()
                .with("Период", "01.01.2024")
                .with("Количество", 10i64)
                .with("Сумма", "100,5")
                .with("Номенклатура", "X")
                .with("Контрагент", "ООО Ромашка"),
            RawRecord::new()
                .with("Период", "мусор")
                .with("Количество", "много")
                .with("Сумма", 20.0)
                .with("Номенклатура", "Y"),
        ];

        let normalized = normalize_orders(&raw, &schema, GroupKey::Product).unwrap();
        let records = &normalized.records;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period, Some(ymd(2024, 1, 1)));
        assert_eq!(records[0].amount, 100.5);
        assert_eq!(records[0].counterparty, "ООО Ромашка");
        assert_eq!(records[1].period, None);
        assert_eq!(records[1].quantity, 0.0);
        assert_eq!(records[1].amount, 20.0);
        assert_eq!(records[1].counterparty, "");

        assert_eq!(normalized.report.rows, 2);
        assert_eq!(normalized.report.invalid_dates, 1);
        assert_eq!(normalized.report.invalid_numbers, 1);
        assert!(normalized.report.absent_columns.is_empty());
    }

    #[test]
    fn test_absent_sales_columns_are_zero() {
        let schema = DatasetSchema::sales(&SalesColumns::default());
        let raw = vec![RawRecord::new()
            .with("Период", "2024-01-02")
            .with("Количество", 4i64)
            .with("Продажная сумма", 40i64)
            .with("Номенклатура", "X")];

        let normalized = normalize_sales(&raw, &schema, GroupKey::Product).unwrap();
        let row = &normalized.records[0];

        assert_eq!(row.sold_quantity, 4.0);
        assert_eq!(row.returned_quantity, 0.0);
        assert_eq!(row.returned_amount, 0.0);
        assert_eq!(
            normalized.report.absent_columns,
            vec!["returned_quantity", "returned_amount", "counterparty"]
        );
        assert_eq!(normalized.report.invalid_numbers, 0);
    }

    #[test]
    fn test_missing_identity_column() {
        let schema = DatasetSchema::sales(&SalesColumns::default());
        let raw = vec![RawRecord::new()
            .with("Период", "2024-01-02")
            .with("Номенклатура", "X")];

        // product present: fine
        assert!(normalize_sales(&raw, &schema, GroupKey::Product).is_ok());

        match normalize_sales(&raw, &schema, GroupKey::Counterparty) {
            Err(AnalysisError::MissingIdentityColumn { dataset, column }) => {
                assert_eq!(dataset, Dataset::Sales);
                assert_eq!(column, "counterparty");
            }
            other => panic!("expected MissingIdentityColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_dataset() {
        let schema = DatasetSchema::orders(&OrderColumns::default());
        let normalized = normalize_orders(&[], &schema, GroupKey::Counterparty).unwrap();
        assert!(normalized.records.is_empty());
        assert_eq!(normalized.report.rows, 0);
    }

    #[test]
    fn test_absent_period_column_is_not_a_failure() {
        let schema = DatasetSchema::orders(&OrderColumns::default());
        let raw = vec![
            RawRecord::new()
                .with("Количество", 3i64)
                .with("Номенклатура", "X"),
            RawRecord::new()
                .with("Количество", 2i64)
                .with("Номенклатура", "Y"),
        ];

        let normalized = normalize_orders(&raw, &schema, GroupKey::Product).unwrap();
        assert!(normalized.records.iter().all(|r| r.period.is_none()));
        assert_eq!(normalized.records[0].quantity, 3.0);
        assert_eq!(normalized.report.invalid_dates, 0);
        assert!(normalized.report.absent_columns.contains(&"period".to_string()));
    }

    #[test]
    fn test_absent_order_numbers_are_zero() {
        let schema = DatasetSchema::orders(&OrderColumns::default());
        let raw = vec![RawRecord::new()
            .with("Период", "2024-01-01")
            .with("Номенклатура", "X")
            .with("Контрагент", "ООО Ромашка")];

        let normalized = normalize_orders(&raw, &schema, GroupKey::Counterparty).unwrap();
        let row = &normalized.records[0];

        assert_eq!(row.quantity, 0.0);
        assert_eq!(row.amount, 0.0);
        assert_eq!(row.period, Some(ymd(2024, 1, 1)));
        assert_eq!(normalized.report.absent_columns, vec!["quantity", "amount"]);
        assert_eq!(normalized.report.invalid_numbers, 0);
        assert_eq!(normalized.report.invalid_dates, 0);
    }
}
