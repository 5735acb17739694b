//! Named job bodies that an external trigger can invoke.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use joblease_core::{JobName, LeaseConfig};

/// Boxed future returned by a registered job body.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, String>> + Send>>;

/// Job body: a zero-argument unit of work producing a JSON result or an error message.
pub type JobHandler = Arc<dyn Fn() -> JobFuture + Send + Sync>;

/// A job body plus its optional lease settings.
#[derive(Clone)]
pub struct RegisteredJob {
    handler: JobHandler,
    config: Option<LeaseConfig>,
}

impl RegisteredJob {
    /// Start one execution of the job body.
    pub fn start(&self) -> JobFuture {
        (self.handler)()
    }

    /// Per-job lease settings; `None` means use the supervisor defaults.
    pub fn config(&self) -> Option<LeaseConfig> {
        self.config
    }
}

/// Registry of job bodies keyed by job name.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<JobName, RegisteredJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job that uses the supervisor's default lease settings.
    pub fn register<F, Fut>(&mut self, name: JobName, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, String>> + Send + 'static,
    {
        self.insert(name, None, handler);
    }

    /// Register a job with its own lease duration and renewal interval.
    pub fn register_with_config<F, Fut>(&mut self, name: JobName, config: LeaseConfig, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, String>> + Send + 'static,
    {
        self.insert(name, Some(config), handler);
    }

    fn insert<F, Fut>(&mut self, name: JobName, config: Option<LeaseConfig>, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, String>> + Send + 'static,
    {
        let handler: JobHandler = Arc::new(move || Box::pin(handler()) as JobFuture);
        self.jobs.insert(name, RegisteredJob { handler, config });
    }

    pub fn get(&self, name: &JobName) -> Option<&RegisteredJob> {
        self.jobs.get(name)
    }

    /// Registered job names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &JobName> {
        self.jobs.keys()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl std::fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.jobs.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    #[tokio::test]
    async fn registered_handler_runs() {
        let mut registry = JobRegistry::new();
        registry.register(job("ping"), || async { Ok(serde_json::json!("pong")) });

        let entry = registry.get(&job("ping")).unwrap();
        assert_eq!(entry.config(), None);
        assert_eq!(entry.start().await.unwrap(), serde_json::json!("pong"));
    }

    #[tokio::test]
    async fn handler_errors_pass_through() {
        let mut registry = JobRegistry::new();
        registry.register(job("broken"), || async { Err("boom".to_string()) });

        let err = registry.get(&job("broken")).unwrap().start().await.unwrap_err();
        assert_eq!(err, "boom");
    }

    #[test]
    fn per_job_config_is_kept_and_names_are_sorted() {
        let mut registry = JobRegistry::new();
        let config = LeaseConfig::new(120, 20).unwrap();
        registry.register_with_config(job("b-job"), config, || async { Ok(serde_json::Value::Null) });
        registry.register(job("a-job"), || async { Ok(serde_json::Value::Null) });

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(&job("b-job")).unwrap().config(), Some(config));
        assert!(registry.get(&job("missing")).is_none());

        let names: Vec<_> = registry.names().map(|n| n.as_str().to_string()).collect();
        assert_eq!(names, vec!["a-job", "b-job"]);
    }
}
