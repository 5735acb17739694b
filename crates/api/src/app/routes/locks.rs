use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use joblease_core::JobName;

use crate::app::dto::{ForceReleaseResponse, LockListResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locks))
        .route("/:job_name", get(lock_status))
        .route("/:job_name/force-release", post(force_release))
}

async fn list_locks(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.console.list_lock_status().await {
        Ok(locks) => Json(LockListResponse {
            count: locks.len(),
            locks,
        })
        .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn lock_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_name): Path<String>,
) -> axum::response::Response {
    let job_name = match job_name.parse::<JobName>() {
        Ok(name) => name,
        Err(e) => return errors::domain_error_to_response("invalid_job_name", e),
    };

    match services.console.lock_status(&job_name).await {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

async fn force_release(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_name): Path<String>,
) -> axum::response::Response {
    let job_name = match job_name.parse::<JobName>() {
        Ok(name) => name,
        Err(e) => return errors::domain_error_to_response("invalid_job_name", e),
    };

    match services.console.force_release(&job_name).await {
        Ok(released) => Json(ForceReleaseResponse { job_name, released }).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
