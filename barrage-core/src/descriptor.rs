use crate::DEFAULT_EXPECTED_STATUS;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single request that can be sent against the target.
///
/// Descriptors are shared read-only once they enter a catalog; every [`Outcome`](crate::Outcome)
/// keeps a reference to the descriptor it was produced from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

impl RequestDescriptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            payload: None,
            expected_status: DEFAULT_EXPECTED_STATUS,
        }
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }
}

fn default_expected_status() -> u16 {
    DEFAULT_EXPECTED_STATUS
}
