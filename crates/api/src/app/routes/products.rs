use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use fantasy_infra::store::Repository;
use fantasy_products::{NewProduct, Product};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/top", get(top_products))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match Repository::<Product>::find_all(services.store()).await {
        Ok(products) => {
            let data = products.iter().map(dto::product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let draft = NewProduct::from(body);
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match Repository::<Product>::save(services.store(), draft).await {
        Ok(product) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "product created",
                "data": dto::product_to_json(&product),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Best sellers by units sold.
pub async fn top_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::TopQuery>, QueryRejection>,
) -> axum::response::Response {
    let limit = match query
        .map_err(errors::query_rejection_to_response)
        .and_then(|Query(q)| q.limit())
    {
        Ok(limit) => limit,
        Err(response) => return response,
    };

    match services.reports().top_products(limit).await {
        Ok(rows) => {
            let data = rows.iter().map(dto::top_product_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
