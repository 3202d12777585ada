#![cfg_attr(docsrs, feature(doc_cfg))]
//! Bounded-concurrency load generation with exact latency statistics.
//!
//! A run sends a fixed number of requests, drawn at random from a [`RequestCatalog`], in waves of
//! at most `concurrency` requests. Every attempt is classified into an
//! [`Outcome`](barrage_core::Outcome) and the final success and failure sets are summarized into
//! mean, min/max and a percentile table before being handed to a [`Reporter`].
pub mod catalog;
pub mod classifier;
pub mod dispatcher;
pub mod reporter;
pub mod run;
pub mod transport;

mod telemetry;

pub use catalog::RequestCatalog;
pub use dispatcher::{BatchInfo, Dispatcher, RunResults, RunState};
pub use reporter::{Report, ReportError, Reporter, TextReporter};
pub use run::Barrage;
pub use transport::{LocalTransport, Transport};

pub mod prelude {
    pub use crate::catalog::RequestCatalog;
    pub use crate::dispatcher::RunResults;
    pub use crate::reporter::{Reporter, TextReporter};
    pub use crate::run::Barrage;
    pub use crate::transport::Transport;
    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;

    pub use barrage_core::{
        ConfigError, FailureReason, Outcome, OutcomeKind, RequestDescriptor, RunConfig,
        StatisticsSnapshot,
    };
}
