use barrage_core::{Outcome, StatisticsSnapshot};
use humantime::format_duration;
use std::io::{self, Stdout, Write};
use thiserror::Error;

/// The full result set of a finished run, as handed to a [`Reporter`].
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub successes: &'a [Outcome],
    pub failures: &'a [Outcome],
    pub stats_successes: &'a StatisticsSnapshot,
    pub stats_failures: &'a StatisticsSnapshot,
    pub stats_all: &'a StatisticsSnapshot,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unable to write report: {0}")]
    Io(#[from] io::Error),
}

/// Renders a finished run somewhere. Called only after every statistic has been computed, so a
/// failing reporter cannot lose results.
pub trait Reporter {
    fn report(&mut self, report: &Report<'_>) -> Result<(), ReportError>;
}

/// Plain-text report for a console or file.
///
/// Writes the three summaries, then every failed attempt. Successful attempts are listed only
/// when `verbose` is set.
pub struct TextReporter<W> {
    writer: W,
    verbose: bool,
}

impl TextReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TextReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_section(&mut self, title: &str, stats: &StatisticsSnapshot) -> io::Result<()> {
        writeln!(self.writer, "== {title} ==")?;
        write!(self.writer, "{stats}")?;
        writeln!(self.writer)
    }

    fn write_outcomes(&mut self, title: &str, outcomes: &[Outcome]) -> io::Result<()> {
        writeln!(self.writer, "-- {title} ({}) --", outcomes.len())?;
        for outcome in outcomes {
            let status = outcome
                .observed_status()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let reason = match (outcome.failure_reason(), outcome.error()) {
                (_, Some(error)) => format!(" {error}"),
                (Some(reason), None) => format!(" {reason}"),
                (None, None) => String::new(),
            };

            writeln!(
                self.writer,
                "#{} {} status={status} elapsed={}{reason}",
                outcome.sequence(),
                outcome.descriptor().target,
                format_duration(outcome.elapsed()),
            )?;
        }
        writeln!(self.writer)
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, report: &Report<'_>) -> Result<(), ReportError> {
        self.write_section("Successes", report.stats_successes)?;
        self.write_section("Failures", report.stats_failures)?;
        self.write_section("All", report.stats_all)?;

        if !report.failures.is_empty() {
            self.write_outcomes("Failed requests", report.failures)?;
        }
        if self.verbose {
            self.write_outcomes("Successful requests", report.successes)?;
        }

        self.writer.flush()?;
        Ok(())
    }
}
