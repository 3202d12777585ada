//! Run-level metrics, recorded through the `metrics` facade when the `metrics` feature is on.
use barrage_core::Outcome;

#[cfg(feature = "metrics")]
const SUCCESS_METRIC: &str = "barrage_success";
#[cfg(feature = "metrics")]
const FAILURE_METRIC: &str = "barrage_failure";
#[cfg(feature = "metrics")]
const LATENCY_METRIC: &str = "barrage_latency";
#[cfg(feature = "metrics")]
const IN_FLIGHT_METRIC: &str = "barrage_in_flight";

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    metrics::describe_counter!(SUCCESS_METRIC, "Attempts classified as success");
    metrics::describe_counter!(FAILURE_METRIC, "Attempts classified as failure");
    metrics::describe_histogram!(LATENCY_METRIC, metrics::Unit::Nanoseconds, "Attempt latency");
    metrics::describe_gauge!(IN_FLIGHT_METRIC, "Attempts issued but not yet settled");
}

#[cfg(feature = "metrics")]
pub(crate) fn record_outcome(outcome: &Outcome) {
    metrics::histogram!(LATENCY_METRIC).record(outcome.elapsed().as_nanos() as f64);
    if outcome.is_success() {
        metrics::counter!(SUCCESS_METRIC).increment(1);
    } else {
        metrics::counter!(FAILURE_METRIC).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_outcome(_outcome: &Outcome) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_in_flight(in_flight: usize) {
    metrics::gauge!(IN_FLIGHT_METRIC).set(in_flight as f64);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_in_flight(_in_flight: usize) {}
