//! Shared data model for the `nodesweep` cleanup handler.
//!
//! - [`event`] -- the custom resource request delivered on each invocation.
//! - [`response`] -- the outcome of a cleanup run and the callback body
//!   reporting it.
//! - [`messages`] -- the fixed reason strings sent back to the orchestrator.

pub mod error;
pub mod event;
pub mod messages;
pub mod response;

pub use error::CoreError;
pub use event::{CustomResourceEvent, InvocationContext, RequestType, ResourceProperties};
pub use response::{CallbackResponse, CleanupOutcome, ResponseStatus};
