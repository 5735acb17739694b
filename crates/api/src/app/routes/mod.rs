use axum::Router;

pub mod jobs;
pub mod locks;
pub mod system;

/// Router for all endpoints guarded by the cron secret.
pub fn router() -> Router {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/locks", locks::router())
}
