//! Reason strings reported back to the orchestrator.
//!
//! The orchestrator surfaces these verbatim in its event log, so they are
//! kept in one place rather than inlined at each exit point.

/// Reason for any request type other than `Delete`.
pub const NON_DELETE_REASON: &str = "Non Delete event type received, no cleanup required.";

/// Reason when the target cluster no longer exists.
pub const CLUSTER_NOT_FOUND_REASON: &str = "Cluster not found. No cleanup required.";

/// Reason when the cluster has no registered container instances.
pub const NO_CONTAINER_INSTANCES_REASON: &str =
    "No container instances found. No cleanup necessary.";

/// Reason when instances are registered but none of them is active.
pub const NO_ACTIVE_INSTANCES_REASON: &str = "No active instances found. No cleanup required.";

/// Reason after cleanup jobs were launched on `count` instances.
pub fn cleanup_triggered_reason(count: usize) -> String {
    format!("Cleanup tasks triggered on {count} instances.")
}
