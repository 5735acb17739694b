use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use joblease_core::DomainError;
use joblease_infra::LeaseStoreError;

pub fn domain_error_to_response(code: &'static str, err: DomainError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, code, err.to_string())
}

pub fn store_error_to_response(err: LeaseStoreError) -> axum::response::Response {
    tracing::error!(error = %err, "lease store request failed");
    match err {
        LeaseStoreError::Connection(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        LeaseStoreError::Command(msg) | LeaseStoreError::Script(msg) => {
            json_error(StatusCode::BAD_GATEWAY, "store_error", msg)
        }
    }
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
