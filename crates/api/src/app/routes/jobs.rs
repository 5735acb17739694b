use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use joblease_core::JobName;

use crate::app::dto::{RegisteredJobResponse, RunJobRequest};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_jobs))
        .route("/:job_name/run", post(run_job))
}

async fn list_jobs(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let defaults = services.defaults();
    let jobs: Vec<RegisteredJobResponse> = services
        .registry
        .names()
        .filter_map(|name| {
            let job = services.registry.get(name)?;
            Some(RegisteredJobResponse::new(
                name.clone(),
                job.config().unwrap_or(defaults),
            ))
        })
        .collect();

    Json(jobs)
}

async fn run_job(
    Extension(services): Extension<Arc<AppServices>>,
    Path(job_name): Path<String>,
    body: Bytes,
) -> axum::response::Response {
    let job_name = match job_name.parse::<JobName>() {
        Ok(name) => name,
        Err(e) => return errors::domain_error_to_response("invalid_job_name", e),
    };

    let Some(job) = services.registry.get(&job_name).cloned() else {
        return errors::json_error(
            StatusCode::NOT_FOUND,
            "unknown_job",
            format!("no job registered as '{job_name}'"),
        );
    };

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RunJobRequest::default()
    } else {
        match serde_json::from_slice::<RunJobRequest>(&body) {
            Ok(req) => req,
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", e.to_string());
            }
        }
    };

    let config = match job.config().unwrap_or(services.defaults()).with_overrides(
        request.lease_duration_seconds,
        request.renewal_interval_seconds,
    ) {
        Ok(config) => config,
        Err(e) => return errors::domain_error_to_response("invalid_lease_config", e),
    };

    match services
        .supervisor
        .run(&job_name, Some(config), || job.start())
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(message) => errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "job_failed", message),
    }
}
