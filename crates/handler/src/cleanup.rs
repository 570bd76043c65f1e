//! Node cleanup workflow.
//!
//! On deletion of the owning resource, every active node of the cluster is
//! tagged with its own instance id and receives one cleanup job pinned to
//! it through that tag. The outcome is reported once to the request's
//! callback URL.
//!
//! Errors are handled in two tiers. Looking up the cluster and enumerating
//! its nodes decide whether any cleanup is needed, so a failure there is
//! reported as `FAILED`. Tagging and launching are per node and only
//! logged, so one bad node does not block the rest.

use nodesweep_cloud::callback::{CallbackError, ResponseSender};
use nodesweep_cloud::ecs::{ClusterApi, ClusterError, ClusterLookup, PlacementTarget};
use nodesweep_core::event::{CustomResourceEvent, InvocationContext};
use nodesweep_core::messages;
use nodesweep_core::response::{CallbackResponse, CleanupOutcome};

/// Error type for a handler invocation.
///
/// Cluster failures never surface here; they become a `FAILED` outcome.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Failed to deliver callback: {0}")]
    Callback(#[from] CallbackError),
}

/// Runs the cleanup workflow and reports its outcome.
pub struct CleanupHandler<C, R> {
    cluster_api: C,
    sender: R,
    placement_attribute: String,
}

impl<C, R> CleanupHandler<C, R>
where
    C: ClusterApi,
    R: ResponseSender,
{
    pub fn new(cluster_api: C, sender: R, placement_attribute: impl Into<String>) -> Self {
        Self {
            cluster_api,
            sender,
            placement_attribute: placement_attribute.into(),
        }
    }

    pub fn cluster_api(&self) -> &C {
        &self.cluster_api
    }

    pub fn sender(&self) -> &R {
        &self.sender
    }

    /// Handle one request: run the workflow, then send exactly one
    /// callback carrying its outcome.
    ///
    /// Returns the outcome that was reported. Fails only if the callback
    /// itself could not be delivered.
    pub async fn handle(
        &self,
        event: &CustomResourceEvent,
        ctx: &InvocationContext,
    ) -> Result<CleanupOutcome, HandlerError> {
        let outcome = self.run_cleanup(event).await;
        let response = CallbackResponse::new(event, ctx, &outcome);

        if let Err(e) = self.sender.send(&event.response_url, &response).await {
            tracing::error!(
                request_id = %event.request_id,
                outcome = %outcome.status,
                error = %e,
                "Callback delivery failed",
            );
            return Err(e.into());
        }

        Ok(outcome)
    }

    /// Decide and perform the cleanup for `event` without reporting it.
    pub async fn run_cleanup(&self, event: &CustomResourceEvent) -> CleanupOutcome {
        if !event.request_type.is_delete() {
            tracing::info!(request_type = %event.request_type, "Ignoring non-delete event");
            return CleanupOutcome::success(messages::NON_DELETE_REASON);
        }

        tracing::info!("Cleanup triggered after service deletion");

        let (cluster, task_definition) = match event.required_properties() {
            Ok(props) => props,
            Err(e) => {
                tracing::error!(error = %e, "Invalid resource properties");
                return CleanupOutcome::failed(e.to_string());
            }
        };

        match self.cleanup_cluster(cluster, task_definition).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(cluster, error = %e, "Cleanup failed");
                CleanupOutcome::failed(e.to_string())
            }
        }
    }

    async fn cleanup_cluster(
        &self,
        cluster: &str,
        task_definition: &str,
    ) -> Result<CleanupOutcome, ClusterError> {
        if self.cluster_api.describe_cluster(cluster).await? == ClusterLookup::NotFound {
            tracing::info!(cluster, "Cluster not found");
            return Ok(CleanupOutcome::success(messages::CLUSTER_NOT_FOUND_REASON));
        }

        let arns = self.cluster_api.list_nodes(cluster).await?;
        if arns.is_empty() {
            tracing::info!(cluster, "No container instances found in cluster");
            return Ok(CleanupOutcome::success(
                messages::NO_CONTAINER_INSTANCES_REASON,
            ));
        }

        let nodes = self.cluster_api.describe_nodes(cluster, &arns).await?;

        let mut targets = Vec::new();
        for node in &nodes {
            let Some(instance_id) = node.active_instance_id() else {
                tracing::debug!(arn = %node.arn, status = ?node.status, "Skipping inactive node");
                continue;
            };

            let target = PlacementTarget::new(&self.placement_attribute, instance_id);
            tracing::info!(instance_id, "Registering placement attribute");
            match self.cluster_api.tag_node(cluster, node, &target).await {
                Ok(()) => tracing::info!(instance_id, "Placement attribute registered"),
                Err(e) => tracing::warn!(
                    instance_id,
                    error = %e,
                    "Failed to register placement attribute",
                ),
            }
            targets.push(target);
        }

        let instance_ids: Vec<&str> = targets.iter().map(|t| t.value.as_str()).collect();
        tracing::info!(cluster, active = ?instance_ids, "Active instances in cluster");

        if targets.is_empty() {
            tracing::info!(cluster, "No active instances, no cleanup tasks to run");
            return Ok(CleanupOutcome::success(messages::NO_ACTIVE_INSTANCES_REASON));
        }

        for target in &targets {
            match self
                .cluster_api
                .launch_job(cluster, task_definition, target)
                .await
            {
                Ok(report) if report.is_clean() => tracing::info!(
                    instance_id = %target.value,
                    tasks = ?report.task_arns,
                    "Cleanup task triggered",
                ),
                Ok(report) => tracing::warn!(
                    instance_id = %target.value,
                    failures = ?report.failures,
                    "Cleanup task not placed",
                ),
                Err(e) => tracing::warn!(
                    instance_id = %target.value,
                    error = %e,
                    "Failed to run cleanup task",
                ),
            }
        }

        tracing::info!(cluster, count = targets.len(), "Cleanup tasks triggered");
        Ok(CleanupOutcome::success(messages::cleanup_triggered_reason(
            targets.len(),
        )))
    }
}
