//! Logical identity of a recurring job.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Upper bound on a job name, in bytes.
pub const MAX_JOB_NAME_LEN: usize = 128;

/// Name of a recurring job (e.g. `nightly-export`).
///
/// One lease key exists per distinct job name. Names are restricted so that
/// the lease namespace stays enumerable with a glob pattern: no whitespace and
/// none of `*`, `?`, `[`, `]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();

        if name.is_empty() {
            return Err(DomainError::validation("job name must not be empty"));
        }
        if name.len() > MAX_JOB_NAME_LEN {
            return Err(DomainError::validation(format!(
                "job name exceeds {MAX_JOB_NAME_LEN} bytes"
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '*' | '?' | '[' | ']'))
        {
            return Err(DomainError::validation(format!(
                "job name contains forbidden character {c:?}"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for JobName {}

impl core::fmt::Display for JobName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for JobName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobName> for String {
    fn from(value: JobName) -> Self {
        value.0
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
