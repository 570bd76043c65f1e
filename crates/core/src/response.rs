//! Cleanup outcome and the callback body that reports it.

use serde::{Deserialize, Serialize};

use crate::event::{CustomResourceEvent, InvocationContext};

/// Status value understood by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one cleanup run: a status plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    pub status: ResponseStatus,
    pub reason: String,
}

impl CleanupOutcome {
    pub fn success(reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Failed,
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}

/// Body of the `PUT` sent to the event's response URL.
///
/// Echoes the stack, request and logical resource ids from the request so
/// the orchestrator can correlate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
}

impl CallbackResponse {
    /// Build the callback body for `outcome`.
    ///
    /// The physical resource id is the invocation's log stream name.
    pub fn new(
        event: &CustomResourceEvent,
        ctx: &InvocationContext,
        outcome: &CleanupOutcome,
    ) -> Self {
        Self {
            status: outcome.status,
            reason: outcome.reason.clone(),
            physical_resource_id: ctx.log_stream_name.clone(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
        }
    }
}
