//! HTTP API: job triggers and the lock console behind a cron secret.

pub mod app;
pub mod middleware;
