use thiserror::Error;

/// Fatal, pre-run errors. A run never starts when one of these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No request descriptors provided; the catalog cannot be empty")]
    EmptyCatalog,

    #[error("Concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("Unable to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
