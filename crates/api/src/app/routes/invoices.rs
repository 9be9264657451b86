use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use fantasy_infra::store::Repository;
use fantasy_invoicing::{Invoice, NewInvoice};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/totals", patch(recompute_totals))
        .route("/totals-by-condition", get(totals_by_condition))
}

pub async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match Repository::<Invoice>::find_all(services.store()).await {
        Ok(invoices) => {
            let data = invoices.iter().map(dto::invoice_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateInvoiceRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let draft = NewInvoice::from(body);
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match Repository::<Invoice>::save(services.store(), draft).await {
        Ok(invoice) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "invoice created",
                "data": dto::invoice_to_json(&invoice),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn recompute_totals(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reports().recompute_invoice_totals().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "invoices total updated" })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn totals_by_condition(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reports().invoice_totals_by_condition().await {
        Ok(rows) => {
            let data = rows.iter().map(dto::condition_total_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
