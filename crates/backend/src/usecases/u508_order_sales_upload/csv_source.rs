use contracts::shared::table::{CellValue, RawRecord};

use crate::dashboards::d402_order_sales::schema::Dataset;
use crate::dashboards::d402_order_sales::AnalysisError;

/// 1C exports use `;`, everything else usually `,`
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Parse an uploaded CSV file into raw rows keyed by header.
///
/// Every cell arrives as text; typing happens later in the normalizer. Empty
/// cells become `Null`, fully empty lines are dropped and malformed lines are
/// skipped with a warning. Only a missing header row is an error.
pub fn read_csv_records(dataset: Dataset, csv_text: &str) -> Result<Vec<RawRecord>, AnalysisError> {
    // Strip UTF-8 BOM if present
    let text = csv_text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(detect_delimiter(text))
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| AnalysisError::Csv { dataset, source })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    tracing::info!("D402: {} CSV headers: {:?}", dataset, headers);

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("D402: skipping malformed {} CSV record: {}", dataset, e);
                skipped += 1;
                continue;
            }
        };

        let mut record = RawRecord::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            let value = value.trim();
            let cell = if value.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(value.to_string())
            };
            record.values.insert(header.clone(), cell);
        }
        if record.values.values().all(CellValue::is_blank) {
            continue;
        }
        records.push(record);
    }

    tracing::info!(
        "D402: read {} {} rows ({} skipped)",
        records.len(),
        dataset,
        skipped
    );

    Ok(records)
}
