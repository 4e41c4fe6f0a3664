use axum::{
    extract::{multipart::MultipartError, Multipart},
    http::StatusCode,
    Json,
};
use contracts::dashboards::d402_order_sales::{
    AnalysisParams, DatasetColumns, OrderSalesAnalysisRequest, OrderSalesOutcome,
};
use contracts::shared::table::RawRecord;
use serde_json::json;

use crate::dashboards::d402_order_sales::schema::{self, Dataset};
use crate::dashboards::d402_order_sales::{service, AnalysisError};
use crate::shared::config::get_config;
use crate::usecases::u508_order_sales_upload::read_csv_records;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(error: AnalysisError) -> ApiError {
    tracing::error!("D402 Dashboard: {}", error);
    match &error {
        AnalysisError::MissingIdentityColumn { dataset, column } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": error.to_string(),
                "dataset": dataset.as_str(),
                "column": column,
            })),
        ),
        AnalysisError::InvalidRequest(_) | AnalysisError::Csv { .. } => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": error.to_string() })),
        ),
    }
}

/// Body over `max_upload_mb` keeps its 413, anything else is a bad request
fn multipart_error(error: MultipartError, context: &str) -> ApiError {
    let message = format!("{}: {}", context, error.body_text());
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::error!("D402 Dashboard: {}", message);
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": message })),
        );
    }
    error_response(AnalysisError::InvalidRequest(message))
}

fn run(
    orders: Option<&[RawRecord]>,
    sales: Option<&[RawRecord]>,
    params: &AnalysisParams,
) -> Result<Json<OrderSalesOutcome>, ApiError> {
    tracing::info!(
        "D402 Dashboard: analysis by {} for {:?}..{:?} ({} orders, {} sales rows)",
        params.group_key.as_str(),
        params.date_from,
        params.date_to,
        orders.map_or(0, |r| r.len()),
        sales.map_or(0, |r| r.len())
    );

    service::compute_kpis(orders, sales, params, get_config())
        .map(Json)
        .map_err(error_response)
}

/// POST /api/d402/analysis
pub async fn post_analysis(
    Json(request): Json<OrderSalesAnalysisRequest>,
) -> Result<Json<OrderSalesOutcome>, ApiError> {
    run(
        request.orders.as_deref(),
        request.sales.as_deref(),
        &request.params,
    )
}

/// Multipart form collected before the pipeline runs
#[derive(Debug, Default)]
struct UploadForm {
    orders: Option<Vec<RawRecord>>,
    sales: Option<Vec<RawRecord>>,
    params: AnalysisParams,
}

impl UploadForm {
    fn apply(&mut self, name: &str, value: String) -> Result<(), AnalysisError> {
        let text = value.trim();
        let optional = || (!text.is_empty()).then(|| text.to_string());

        match name {
            "orders" => self.orders = Some(read_csv_records(Dataset::Orders, &value)?),
            "sales" => self.sales = Some(read_csv_records(Dataset::Sales, &value)?),
            "date_from" => self.params.date_from = optional(),
            "date_to" => self.params.date_to = optional(),
            "group_key" if !text.is_empty() => {
                self.params.group_key = text.parse().map_err(AnalysisError::InvalidRequest)?
            }
            "join_mode" if !text.is_empty() => {
                self.params.join_mode = Some(text.parse().map_err(AnalysisError::InvalidRequest)?)
            }
            "top_n" if !text.is_empty() => {
                let n = text.parse::<usize>().map_err(|e| {
                    AnalysisError::InvalidRequest(format!("top_n '{}': {}", text, e))
                })?;
                self.params.top_n = Some(n);
            }
            "group_key" | "join_mode" | "top_n" => {}
            other => tracing::warn!("D402 Dashboard: ignoring form field '{}'", other),
        }
        Ok(())
    }
}

/// POST /api/d402/analysis/upload
pub async fn upload_analysis(
    mut multipart: Multipart,
) -> Result<Json<OrderSalesOutcome>, ApiError> {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e, "malformed multipart body")),
        };

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| multipart_error(e, &format!("cannot read field '{}'", name)))?;

        form.apply(&name, value).map_err(error_response)?;
    }

    run(form.orders.as_deref(), form.sales.as_deref(), &form.params)
}

/// GET /api/d402/columns
pub async fn get_columns() -> Json<Vec<DatasetColumns>> {
    let (orders, sales) = schema::schemas(&get_config().columns);
    Json(vec![orders.to_dto(), sales.to_dto()])
}
