//! Outbound integrations for the `nodesweep` cleanup handler.
//!
//! - [`ecs`] -- the [`ClusterApi`] seam over the cluster service, with an
//!   ECS implementation backed by `aws-sdk-ecs`.
//! - [`callback`] -- the [`ResponseSender`] seam that reports an outcome to
//!   the orchestrator's pre-signed URL, with a `reqwest` implementation.

pub mod callback;
pub mod ecs;

pub use callback::{CallbackError, HttpResponseSender, ResponseSender};
pub use ecs::{
    ClusterApi, ClusterError, ClusterLookup, EcsClusterApi, LaunchReport, PlacementTarget,
    WorkerNode,
};
