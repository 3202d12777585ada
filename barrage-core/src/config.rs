use crate::{ConfigError, RequestDescriptor};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Everything a run needs besides the transport and the reporter.
///
/// Counts are unsigned, so a negative value in a configuration file surfaces as
/// [`ConfigError::Parse`] rather than reaching the dispatcher.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub concurrency: usize,
    pub requests: u64,
    /// Per-request timeout handed to the transport.
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    pub targets: Vec<RequestDescriptor>,
}

impl RunConfig {
    pub fn new(concurrency: usize, requests: u64, targets: Vec<RequestDescriptor>) -> Self {
        Self {
            concurrency,
            requests,
            timeout: None,
            output: None,
            targets,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading run configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.targets.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(())
    }
}
