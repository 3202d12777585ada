//! Top-level run configuration
use crate::catalog::RequestCatalog;
use crate::dispatcher::{Dispatcher, RunResults};
use crate::reporter::Reporter;
use crate::transport::Transport;
use barrage_core::{ConfigError, RunConfig, DEFAULT_CONCURRENCY, DEFAULT_REQUESTS};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// A configured load run, started by `.await`ing it.
///
/// # Example
/// ```ignore
/// use barrage::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), ConfigError> {
///     let catalog = RequestCatalog::new(vec![RequestDescriptor::new("http://localhost:3000/")])?;
///     let results = Barrage::new(catalog, HttpTransport::new())
///         .concurrency(16)
///         .requests(10_000)
///         .reporter(TextReporter::stdout())
///         .await?;
///
///     println!("{} failures", results.failures.len());
///     Ok(())
/// }
/// ```
pub struct Barrage<T> {
    catalog: RequestCatalog,
    transport: T,
    concurrency: usize,
    requests: u64,
    reporter: Option<Box<dyn Reporter + Send>>,
}

impl<T> Barrage<T>
where
    T: Transport + Sync + 'static,
{
    pub fn new(catalog: RequestCatalog, transport: T) -> Self {
        Self {
            catalog,
            transport,
            concurrency: DEFAULT_CONCURRENCY,
            requests: DEFAULT_REQUESTS,
            reporter: None,
        }
    }

    /// Build the catalog, concurrency and request count from a [`RunConfig`].
    pub fn from_config(config: &RunConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = RequestCatalog::new(config.targets.clone())?;
        Ok(Self::new(catalog, transport)
            .concurrency(config.concurrency)
            .requests(config.requests))
    }

    /// Maximum number of requests in flight at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Total number of requests to send.
    pub fn requests(mut self, requests: u64) -> Self {
        self.requests = requests;
        self
    }

    pub fn reporter<R>(mut self, reporter: R) -> Self
    where
        R: Reporter + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Run to completion and hand the results to the reporter, if any.
    ///
    /// A reporter failure is logged; the computed results are returned regardless.
    pub async fn run(self) -> Result<RunResults, ConfigError> {
        let dispatcher =
            Dispatcher::new(self.concurrency, self.requests, self.catalog, self.transport)?;
        let results = dispatcher.run().await;

        if let Some(mut reporter) = self.reporter {
            if let Err(err) = results.report(reporter.as_mut()) {
                error!("Failed to deliver report: {err}");
            }
        }

        Ok(results)
    }
}

impl<T> IntoFuture for Barrage<T>
where
    T: Transport + Sync + 'static,
{
    type Output = Result<RunResults, ConfigError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}
