/// Status code a request is expected to terminate with when its descriptor does not name one.
pub const DEFAULT_EXPECTED_STATUS: u16 = 200;

/// Percentile thresholds computed for every outcome set, in report order.
pub const PERCENTILES: [f64; 11] = [
    0.99, 0.98, 0.97, 0.96, 0.95, 0.90, 0.80, 0.75, 0.50, 0.25, 0.10,
];

/// Requests in flight at once when a run does not say otherwise.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Total requests sent when a run does not say otherwise.
pub const DEFAULT_REQUESTS: u64 = 100;
