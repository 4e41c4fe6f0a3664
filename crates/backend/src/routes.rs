use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::api::handlers;
use crate::shared::config::get_config;

/// D402 Order/Sales reconciliation. Uploads carry whole datasets, so the body
/// limit comes from `[server].max_upload_mb` instead of axum's 2 MB default.
pub fn d402_routes(body_limit: usize) -> Router {
    Router::new()
        .route(
            "/api/d402/analysis",
            post(handlers::d402_order_sales::post_analysis),
        )
        .route(
            "/api/d402/analysis/upload",
            post(handlers::d402_order_sales::upload_analysis),
        )
        .route(
            "/api/d402/columns",
            get(handlers::d402_order_sales::get_columns),
        )
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(d402_routes(get_config().server.max_upload_bytes()))
}
