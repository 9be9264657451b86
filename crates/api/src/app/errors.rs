use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use fantasy_core::DomainError;
use fantasy_infra::store::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::ReferentialViolation { entity, detail } => json_error(
            StatusCode::CONFLICT,
            "referential_violation",
            format!("{entity}: {detail}"),
        ),
        StoreError::ConstraintViolation { entity, detail } => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "constraint_violation",
            format!("{entity}: {detail}"),
        ),
        other => {
            tracing::error!(error = %other, "store operation failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal store error",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = match err {
        DomainError::Validation(msg) | DomainError::InvalidId(msg) => msg,
    };
    json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
}

pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_json", rejection.body_text())
}

pub fn query_rejection_to_response(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_query", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
