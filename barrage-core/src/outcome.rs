use crate::RequestDescriptor;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// What a transport hands back for a single attempt.
///
/// `Err` is a transport-level failure, `Ok(None)` means nothing at all could be obtained from
/// the target, and `Ok(Some(_))` is a terminal response.
pub type RawResult = Result<Option<Response>, TransportError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            body: vec![],
        }
    }

    pub fn with_body(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request task did not complete: {0}")]
    Aborted(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureReason {
    TransportError,
    EmptyResponse,
    UnexpectedStatus,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::TransportError => "transport error",
            FailureReason::EmptyResponse => "empty response",
            FailureReason::UnexpectedStatus => "unexpected status",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure(FailureReason),
}

/// The classified record of one settled attempt.
#[derive(Clone, Debug)]
pub struct Outcome {
    sequence: u64,
    started_at: Instant,
    ended_at: Instant,
    kind: OutcomeKind,
    observed_status: Option<u16>,
    error: Option<TransportError>,
    descriptor: Arc<RequestDescriptor>,
}

impl Outcome {
    /// `ended_at` is clamped to `started_at` so that `elapsed` is never negative.
    pub fn new(
        sequence: u64,
        descriptor: Arc<RequestDescriptor>,
        started_at: Instant,
        ended_at: Instant,
        kind: OutcomeKind,
    ) -> Self {
        Self {
            sequence,
            started_at,
            ended_at: ended_at.max(started_at),
            kind,
            observed_status: None,
            error: None,
            descriptor,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.observed_status = Some(status);
        self
    }

    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn ended_at(&self) -> Instant {
        self.ended_at
    }

    pub fn elapsed(&self) -> Duration {
        self.ended_at.duration_since(self.started_at)
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.kind {
            OutcomeKind::Success => None,
            OutcomeKind::Failure(reason) => Some(reason),
        }
    }

    pub fn observed_status(&self) -> Option<u16> {
        self.observed_status
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }
}
