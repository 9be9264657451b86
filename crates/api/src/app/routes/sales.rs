use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use fantasy_infra::store::Repository;
use fantasy_sales::{NewSale, Sale};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", get(list_sales).post(create_sale))
}

pub async fn list_sales(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match Repository::<Sale>::find_all(services.store()).await {
        Ok(sales) => {
            let data = sales.iter().map(dto::sale_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Record one invoice line.
///
/// Invoice totals are not touched here; they catch up on the next
/// `PATCH /invoices/totals`.
pub async fn create_sale(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateSaleRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let draft = NewSale::from(body);
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match Repository::<Sale>::save(services.store(), draft).await {
        Ok(sale) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "sale created",
                "data": dto::sale_to_json(&sale),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
