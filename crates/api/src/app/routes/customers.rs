use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::JsonRejection, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use fantasy_infra::store::Repository;
use fantasy_parties::{Customer, NewCustomer};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/top", get(top_customers))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match Repository::<Customer>::find_all(services.store()).await {
        Ok(customers) => {
            let data = customers.iter().map(dto::customer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateCustomerRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };

    let draft = NewCustomer::from(body);
    if let Err(e) = draft.validate() {
        return errors::domain_error_to_response(e);
    }

    match Repository::<Customer>::save(services.store(), draft).await {
        Ok(customer) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "customer created",
                "data": dto::customer_to_json(&customer),
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn top_customers(
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

    match services.reports().top_customers(limit).await {
        Ok(rows) => {
            let data = rows.iter().map(dto::top_customer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
