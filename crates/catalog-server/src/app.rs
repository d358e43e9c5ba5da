//! Router and handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use shopcart_core::ProductId;

use crate::catalog::Catalog;

pub fn build_app(catalog: Arc<Catalog>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/stock", get(list_stock))
        .route("/stock/:id", get(get_stock))
        .layer(Extension(catalog))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn list_products(Extension(catalog): Extension<Arc<Catalog>>) -> axum::response::Response {
    Json(catalog.products().cloned().collect::<Vec<_>>()).into_response()
}

pub async fn get_product(
    Extension(catalog): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match catalog.product(id) {
        Some(product) => Json(product.clone()).into_response(),
        None => {
            tracing::debug!(product_id = %id, "product not found");
            json_error(StatusCode::NOT_FOUND, "not_found", format!("product {id} not found"))
        }
    }
}

pub async fn list_stock(Extension(catalog): Extension<Arc<Catalog>>) -> axum::response::Response {
    Json(catalog.stock_levels().copied().collect::<Vec<_>>()).into_response()
}

pub async fn get_stock(
    Extension(catalog): Extension<Arc<Catalog>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match catalog.stock(id) {
        Some(level) => Json(*level).into_response(),
        None => {
            tracing::debug!(product_id = %id, "stock level not found");
            json_error(StatusCode::NOT_FOUND, "not_found", format!("stock for product {id} not found"))
        }
    }
}

fn parse_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse::<ProductId>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
