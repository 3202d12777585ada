use crate::{Outcome, PERCENTILES};
use humantime::format_duration;
use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Summary statistics over a sequence of outcomes.
///
/// A snapshot is derived data: it is recomputed from the outcomes with [`summarize`] and holds no
/// state of its own.
#[derive(Clone, Debug, Default)]
pub struct StatisticsSnapshot {
    pub count: usize,
    pub mean: Duration,
    pub min: Option<Outcome>,
    pub max: Option<Outcome>,
    /// One entry per threshold in [`PERCENTILES`], in the same order. Empty when `count == 0`.
    pub percentiles: Vec<Percentile>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Percentile {
    pub quantile: f64,
    pub elapsed: Duration,
}

impl StatisticsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn percentile(&self, quantile: f64) -> Option<Duration> {
        self.percentiles
            .iter()
            .find(|p| (p.quantile - quantile).abs() < 1e-9)
            .map(|p| p.elapsed)
    }
}

/// Compute count, mean, min/max and the percentile table for `outcomes`.
///
/// The input is never reordered; percentiles are read from a sorted copy of the elapsed times.
pub fn summarize(outcomes: &[Outcome]) -> StatisticsSnapshot {
    if outcomes.is_empty() {
        return StatisticsSnapshot::default();
    }

    let count = outcomes.len();
    let total_nanos: u128 = outcomes.iter().map(|o| o.elapsed().as_nanos()).sum();
    let mean = duration_from_nanos(total_nanos / count as u128);

    // NOTE: Strict comparisons so the first occurrence wins ties.
    let mut min = &outcomes[0];
    let mut max = &outcomes[0];
    for outcome in &outcomes[1..] {
        if outcome.elapsed() < min.elapsed() {
            min = outcome;
        }
        if outcome.elapsed() > max.elapsed() {
            max = outcome;
        }
    }

    let mut sorted: Vec<Duration> = outcomes.iter().map(Outcome::elapsed).collect();
    sorted.sort_unstable();

    let percentiles = PERCENTILES
        .iter()
        .map(|&quantile| Percentile {
            quantile,
            elapsed: sorted[percentile_index(quantile, count)],
        })
        .collect();

    StatisticsSnapshot {
        count,
        mean,
        min: Some(min.clone()),
        max: Some(max.clone()),
        percentiles,
    }
}

/// `round(quantile * n) - 1`, clamped into `[0, n - 1]`. `n` must be non-zero.
fn percentile_index(quantile: f64, n: usize) -> usize {
    let rank = (quantile * n as f64).round() as i64 - 1;
    rank.clamp(0, n as i64 - 1) as usize
}

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "count=0, no data");
        }

        write!(
            f,
            "count={}, mean={}",
            self.count,
            format_duration(self.mean)
        )?;
        if let Some(min) = &self.min {
            write!(
                f,
                ", min={} (#{})",
                format_duration(min.elapsed()),
                min.sequence()
            )?;
        }
        if let Some(max) = &self.max {
            write!(
                f,
                ", max={} (#{})",
                format_duration(max.elapsed()),
                max.sequence()
            )?;
        }
        writeln!(f)?;

        for p in &self.percentiles {
            writeln!(
                f,
                "  p{:<3} {}",
                (p.quantile * 100.).round() as u32,
                format_duration(p.elapsed)
            )?;
        }
        Ok(())
    }
}
