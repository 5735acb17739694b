use std::sync::Arc;

use anyhow::Context;

use joblease_api::app::{build_app, builtin, services};
use joblease_infra::LockConsole;
use joblease_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    joblease_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;

    let cron_secret = settings.cron_secret.clone().unwrap_or_else(|| {
        tracing::warn!("JOBLEASE_CRON_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let store = services::build_store(&settings)
        .await
        .context("failed to connect lease store")?;
    let registry = builtin::builtin_registry(LockConsole::new(store.clone()))?;
    let services = Arc::new(services::AppServices::new(store, settings.lease, registry));

    let app = build_app(services, cron_secret);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        lease_seconds = settings.lease.lease_seconds(),
        renewal_seconds = settings.lease.renewal_seconds(),
        "listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
