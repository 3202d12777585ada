use barrage_core::{
    FailureReason, Outcome, OutcomeKind, RawResult, RequestDescriptor, TransportError,
};
use std::sync::Arc;
use std::time::Instant;

/// An attempt whose transport call has finished, waiting to be classified.
#[derive(Debug)]
pub struct SettledAttempt {
    pub sequence: u64,
    pub descriptor: Arc<RequestDescriptor>,
    pub started_at: Instant,
    pub ended_at: Instant,
    pub raw: RawResult,
}

/// Turn a settled attempt into an [`Outcome`]. Never fails: a missing or malformed result is
/// recorded as a failure.
///
/// Rules, first match wins:
/// 1. transport error => `TransportError`
/// 2. nothing obtained => `EmptyResponse`
/// 3. status differs from the descriptor's expected status => `UnexpectedStatus`
/// 4. otherwise success
pub fn classify(attempt: SettledAttempt) -> Outcome {
    let SettledAttempt {
        sequence,
        descriptor,
        started_at,
        ended_at,
        raw,
    } = attempt;
    let expected = descriptor.expected_status;
    let outcome = |kind| Outcome::new(sequence, descriptor, started_at, ended_at, kind);

    match raw {
        Err(error) => outcome(failure(FailureReason::TransportError)).with_error(error),
        Ok(None) => outcome(failure(FailureReason::EmptyResponse)),
        Ok(Some(response)) if response.status != expected => {
            outcome(failure(FailureReason::UnexpectedStatus)).with_status(response.status)
        }
        Ok(Some(response)) => outcome(OutcomeKind::Success).with_status(response.status),
    }
}

/// Classification for a request task that never handed back a result.
pub(crate) fn aborted(
    sequence: u64,
    descriptor: Arc<RequestDescriptor>,
    started_at: Instant,
    reason: String,
) -> Outcome {
    classify(SettledAttempt {
        sequence,
        descriptor,
        started_at,
        ended_at: Instant::now(),
        raw: Err(TransportError::Aborted(reason)),
    })
}

fn failure(reason: FailureReason) -> OutcomeKind {
    OutcomeKind::Failure(reason)
}
