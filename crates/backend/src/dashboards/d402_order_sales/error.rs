use thiserror::Error;

use super::schema::Dataset;

/// Ошибки анализа заказов и продаж
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The grouping key column is not present in the dataset at all
    #[error("{dataset} dataset has no '{column}' column")]
    MissingIdentityColumn {
        dataset: Dataset,
        column: &'static str,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read {dataset} CSV: {source}")]
    Csv {
        dataset: Dataset,
        #[source]
        source: csv::Error,
    },
}
