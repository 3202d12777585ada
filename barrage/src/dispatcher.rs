use crate::catalog::RequestCatalog;
use crate::classifier::{aborted, classify, SettledAttempt};
use crate::reporter::{Report, ReportError, Reporter};
use crate::telemetry::{record_in_flight, record_outcome};
use crate::transport::Transport;
use barrage_core::{summarize, ConfigError, Outcome, RequestDescriptor, StatisticsSnapshot};
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use humantime::format_duration;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

type BatchObserver = Box<dyn FnMut(&BatchInfo) + Send>;

/// Bookkeeping for a single run. Only the [`Dispatcher`] mutates it.
///
/// `sent == in_flight + successes.len() + failures.len()` holds between every step, and the run
/// is complete once `sent == total_requested && in_flight == 0`.
#[derive(Debug, Default)]
pub struct RunState {
    total_requested: u64,
    sent: u64,
    in_flight: usize,
    successes: Vec<Outcome>,
    failures: Vec<Outcome>,
}

impl RunState {
    fn new(total_requested: u64) -> Self {
        Self {
            total_requested,
            ..Default::default()
        }
    }

    pub fn total_requested(&self) -> u64 {
        self.total_requested
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn successes(&self) -> &[Outcome] {
        &self.successes
    }

    pub fn failures(&self) -> &[Outcome] {
        &self.failures
    }

    pub fn is_complete(&self) -> bool {
        self.sent == self.total_requested && self.in_flight == 0
    }

    fn next_batch_size(&self, concurrency: NonZeroUsize) -> usize {
        let remaining = self.total_requested - self.sent;
        remaining.min(concurrency.get() as u64) as usize
    }

    /// Reserve the next sequence number for an attempt about to be issued.
    fn admit(&mut self) -> u64 {
        let sequence = self.sent;
        self.sent += 1;
        self.in_flight += 1;
        sequence
    }

    fn settle(&mut self, outcome: Outcome) {
        self.in_flight -= 1;
        if outcome.is_success() {
            self.successes.push(outcome);
        } else {
            self.failures.push(outcome);
        }
        debug_assert_eq!(
            self.sent,
            (self.in_flight + self.successes.len() + self.failures.len()) as u64
        );
    }
}

/// A wave of attempts as it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchInfo {
    pub index: usize,
    pub size: usize,
    pub first_sequence: u64,
    pub in_flight: usize,
}

/// Admission controller for a run.
///
/// Requests go out in batches of at most `concurrency`. Each batch is a barrier: the next one is
/// not issued until every attempt of the current one has produced an [`Outcome`]. Per-request
/// failures (including a panicking transport) become failure outcomes and never stop the run.
///
/// Must be run inside a tokio runtime; each attempt is its own task.
pub struct Dispatcher<T> {
    concurrency: NonZeroUsize,
    catalog: RequestCatalog,
    transport: Arc<T>,
    state: RunState,
    observer: Option<BatchObserver>,
}

impl<T> Dispatcher<T>
where
    T: Transport + Sync + 'static,
{
    pub fn new(
        concurrency: usize,
        total_requested: u64,
        catalog: RequestCatalog,
        transport: T,
    ) -> Result<Self, ConfigError> {
        let concurrency = NonZeroUsize::new(concurrency).ok_or(ConfigError::ZeroConcurrency)?;

        Ok(Self {
            concurrency,
            catalog,
            transport: Arc::new(transport),
            state: RunState::new(total_requested),
            observer: None,
        })
    }

    /// Called once per batch, after all of its attempts have been issued.
    pub fn on_batch<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&BatchInfo) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[instrument(name = "dispatcher", skip_all, fields(concurrency = self.concurrency.get(), total = self.state.total_requested))]
    pub async fn run(mut self) -> RunResults {
        info!("Starting run");
        let start = Instant::now();

        #[cfg(feature = "metrics")]
        crate::telemetry::describe_metrics();

        let mut batches = 0;
        while !self.state.is_complete() {
            let size = self.state.next_batch_size(self.concurrency);
            self.run_batch(batches, size).await;
            batches += 1;
        }

        let elapsed = start.elapsed();
        info!(
            "Run complete: {} succeeded, {} failed, {batches} batches in {}",
            self.state.successes.len(),
            self.state.failures.len(),
            format_duration(elapsed),
        );

        let RunState {
            successes,
            failures,
            ..
        } = self.state;
        RunResults::new(successes, failures, batches, elapsed)
    }

    async fn run_batch(&mut self, index: usize, size: usize) {
        let first_sequence = self.state.sent;
        let mut pending = FuturesUnordered::new();
        for _ in 0..size {
            let descriptor = self.catalog.next();
            let sequence = self.state.admit();
            pending.push(self.spawn_attempt(sequence, descriptor));
        }

        let info = BatchInfo {
            index,
            size,
            first_sequence,
            in_flight: self.state.in_flight,
        };
        debug!("Issued batch {index}: {size} requests from #{first_sequence}");
        if let Some(observer) = &mut self.observer {
            observer(&info);
        }
        record_in_flight(self.state.in_flight);

        // NOTE: Outcomes are appended in settlement order, not sequence order.
        while let Some(outcome) = pending.next().await {
            trace!(
                "#{} settled as {:?} in {}",
                outcome.sequence(),
                outcome.kind(),
                format_duration(outcome.elapsed())
            );
            record_outcome(&outcome);
            self.state.settle(outcome);
        }
        record_in_flight(self.state.in_flight);
    }

    fn spawn_attempt(
        &self,
        sequence: u64,
        descriptor: Arc<RequestDescriptor>,
    ) -> impl Future<Output = Outcome> {
        let transport = self.transport.clone();
        let task_descriptor = descriptor.clone();
        let issued_at = Instant::now();

        let handle = tokio::spawn(async move {
            let started_at = Instant::now();
            let raw = transport.send(&task_descriptor).await;
            (started_at, raw, Instant::now())
        });

        handle.map(move |joined| match joined {
            Ok((started_at, raw, ended_at)) => classify(SettledAttempt {
                sequence,
                descriptor,
                started_at,
                ended_at,
                raw,
            }),
            Err(err) => {
                warn!("Request #{sequence} did not complete: {err}");
                aborted(sequence, descriptor, issued_at, err.to_string())
            }
        })
    }
}

/// Everything a finished run produced, fully computed before any reporter sees it.
#[derive(Debug, Clone)]
pub struct RunResults {
    pub successes: Vec<Outcome>,
    pub failures: Vec<Outcome>,
    pub stats_successes: StatisticsSnapshot,
    pub stats_failures: StatisticsSnapshot,
    pub stats_all: StatisticsSnapshot,
    pub batches: usize,
    pub elapsed: Duration,
}

impl RunResults {
    fn new(
        successes: Vec<Outcome>,
        failures: Vec<Outcome>,
        batches: usize,
        elapsed: Duration,
    ) -> Self {
        let all: Vec<Outcome> = successes.iter().chain(&failures).cloned().collect();

        Self {
            stats_successes: summarize(&successes),
            stats_failures: summarize(&failures),
            stats_all: summarize(&all),
            successes,
            failures,
            batches,
            elapsed,
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn report<R>(&self, reporter: &mut R) -> Result<(), ReportError>
    where
        R: Reporter + ?Sized,
    {
        reporter.report(&Report {
            successes: &self.successes,
            failures: &self.failures,
            stats_successes: &self.stats_successes,
            stats_failures: &self.stats_failures,
            stats_all: &self.stats_all,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use barrage_core::{FailureReason, RawResult, Response, TransportError};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    fn catalog() -> RequestCatalog {
        RequestCatalog::with_rng(
            vec![
                RequestDescriptor::new("http://localhost:3000/a"),
                RequestDescriptor::new("http://localhost:3000/b"),
            ],
            SmallRng::seed_from_u64(0),
        )
        .unwrap()
    }

    fn recording_dispatcher(
        concurrency: usize,
        total: u64,
        transport: MockTransport,
    ) -> (Dispatcher<MockTransport>, Arc<Mutex<Vec<BatchInfo>>>) {
        let batches = Arc::new(Mutex::new(vec![]));
        let recorded = batches.clone();
        let dispatcher = Dispatcher::new(concurrency, total, catalog(), transport)
            .unwrap()
            .on_batch(move |info| recorded.lock().unwrap().push(*info));
        (dispatcher, batches)
    }

    #[test]
    fn test_zero_concurrency() {
        let res = Dispatcher::new(0, 10, catalog(), MockTransport::ok(Duration::ZERO));
        assert!(matches!(res, Err(ConfigError::ZeroConcurrency)));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn test_batches_of_three() {
        let transport = MockTransport::ok(Duration::from_millis(2));
        let max_in_flight = transport.max_in_flight();
        let (dispatcher, batches) = recording_dispatcher(3, 10, transport);

        let results = dispatcher.run().await;

        assert_eq!(results.successes.len(), 10);
        assert_eq!(results.failures.len(), 0);
        assert_eq!(results.batches, 4);

        let sizes: Vec<usize> = batches.lock().unwrap().iter().map(|b| b.size).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert!(max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn test_unexpected_status() {
        // The first two calls to arrive get a 500.
        let transport = MockTransport::new(Duration::from_millis(1), |_, call| {
            let status = if call < 2 { 500 } else { 200 };
            Ok(Some(Response::new(status)))
        });
        let (dispatcher, _) = recording_dispatcher(5, 5, transport);

        let results = dispatcher.run().await;

        assert_eq!(results.successes.len(), 3);
        assert_eq!(results.failures.len(), 2);
        for failure in &results.failures {
            assert_eq!(
                failure.failure_reason(),
                Some(FailureReason::UnexpectedStatus)
            );
            assert_eq!(failure.observed_status(), Some(500));
        }
        assert_eq!(results.stats_successes.count, 3);
        assert_eq!(results.stats_failures.count, 2);
        assert_eq!(results.stats_all.count, 5);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn test_transport_error_is_isolated() {
        let transport = MockTransport::new(Duration::from_millis(1), |_, call| {
            if call == 1 {
                Err(TransportError::Connect("connection refused".to_string()))
            } else {
                Ok(Some(Response::new(200)))
            }
        });
        let (dispatcher, batches) = recording_dispatcher(3, 9, transport);

        let results = dispatcher.run().await;

        assert_eq!(results.total(), 9);
        assert_eq!(results.successes.len(), 8);
        assert_eq!(results.failures.len(), 1);
        assert_eq!(
            results.failures[0].failure_reason(),
            Some(FailureReason::TransportError)
        );
        assert!(matches!(
            results.failures[0].error(),
            Some(TransportError::Connect(_))
        ));
        assert_eq!(batches.lock().unwrap().len(), 3);
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn test_panicking_transport_is_isolated() {
        let transport = MockTransport::new(Duration::ZERO, |_, call| -> RawResult {
            if call == 2 {
                panic!("transport blew up");
            }
            Ok(Some(Response::new(200)))
        });
        let (dispatcher, _) = recording_dispatcher(2, 6, transport);

        let results = dispatcher.run().await;

        assert_eq!(results.total(), 6);
        assert_eq!(results.failures.len(), 1);
        assert!(matches!(
            results.failures[0].error(),
            Some(TransportError::Aborted(_))
        ));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_empty_response() {
        let transport = MockTransport::new(Duration::ZERO, |_, _| Ok(None));
        let (dispatcher, _) = recording_dispatcher(4, 4, transport);

        let results = dispatcher.run().await;

        assert_eq!(results.failures.len(), 4);
        assert!(results
            .failures
            .iter()
            .all(|o| o.failure_reason() == Some(FailureReason::EmptyResponse)));
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn test_zero_requests() {
        let (dispatcher, batches) = recording_dispatcher(4, 0, MockTransport::ok(Duration::ZERO));
        assert!(dispatcher.state().is_complete());

        let results = dispatcher.run().await;

        assert_eq!(results.total(), 0);
        assert_eq!(results.batches, 0);
        assert!(batches.lock().unwrap().is_empty());
        assert!(results.stats_all.is_empty());
        assert!(results.stats_all.percentiles.is_empty());
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn test_admission_bounds() {
        let concurrency = 7;
        let total = 100;
        let transport = MockTransport::ok(Duration::from_millis(1));
        let max_in_flight = transport.max_in_flight();
        let (dispatcher, batches) = recording_dispatcher(concurrency, total, transport);

        let results = dispatcher.run().await;
        assert_eq!(results.total() as u64, total);
        assert!(max_in_flight.load(Ordering::SeqCst) <= concurrency);

        // Sequence numbers are handed out contiguously and never exceed the total.
        let batches = batches.lock().unwrap();
        let mut sent = 0;
        for (i, batch) in batches.iter().enumerate() {
            assert_eq!(batch.index, i);
            assert_eq!(batch.first_sequence, sent);
            assert!(batch.in_flight <= concurrency);
            assert_eq!(batch.in_flight, batch.size);
            sent += batch.size as u64;
            assert!(sent <= total);
        }
        assert_eq!(sent, total);

        let mut sequences: Vec<u64> = results
            .successes
            .iter()
            .chain(&results.failures)
            .map(Outcome::sequence)
            .collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (0..total).collect::<Vec<_>>());
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(10_000)]
    async fn test_batches_do_not_overlap() {
        let transport = MockTransport::new(Duration::ZERO, |_, call| {
            // Uneven latencies so that completion order differs from issue order.
            std::thread::sleep(Duration::from_millis((call * 7) % 5));
            Ok(Some(Response::new(200)))
        });
        let (dispatcher, batches) = recording_dispatcher(4, 14, transport);

        let results = dispatcher.run().await;
        let batches = batches.lock().unwrap();

        let batch_of = |sequence: u64| {
            batches
                .iter()
                .find(|b| sequence >= b.first_sequence && sequence < b.first_sequence + b.size as u64)
                .map(|b| b.index)
                .unwrap()
        };

        for later in &results.successes {
            for earlier in &results.successes {
                if batch_of(earlier.sequence()) < batch_of(later.sequence()) {
                    assert!(later.started_at() >= earlier.ended_at());
                }
            }
        }
    }
}
