//! Cluster service access.
//!
//! [`ClusterApi`] is the narrow set of cluster operations the cleanup
//! workflow needs. [`EcsClusterApi`] implements it against Amazon ECS, where
//! worker nodes are EC2 container instances and cleanup jobs are one-off
//! tasks pinned to a node through a `memberOf` placement constraint.

use async_trait::async_trait;
use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ecs::types::{
    Attribute, LaunchType, PlacementConstraint, PlacementConstraintType, TargetType,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Status of a cluster or container instance that accepts work.
const STATUS_ACTIVE: &str = "ACTIVE";

/// Status ECS keeps reporting for a deleted cluster.
const STATUS_INACTIVE: &str = "INACTIVE";

/// In-band failure reason for a cluster that does not exist.
const FAILURE_REASON_MISSING: &str = "MISSING";

const CLUSTER_NOT_FOUND_CODE: &str = "ClusterNotFoundException";

/// `DescribeContainerInstances` accepts at most this many ARNs per call.
pub const DESCRIBE_BATCH_SIZE: usize = 100;

const OP_DESCRIBE_CLUSTERS: &str = "DescribeClusters";
const OP_LIST_CONTAINER_INSTANCES: &str = "ListContainerInstances";
const OP_DESCRIBE_CONTAINER_INSTANCES: &str = "DescribeContainerInstances";
const OP_PUT_ATTRIBUTES: &str = "PutAttributes";
const OP_RUN_TASK: &str = "RunTask";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a cluster exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterLookup {
    Found,
    NotFound,
}

/// A worker node registered with a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerNode {
    /// Container instance ARN.
    pub arn: String,
    /// EC2 instance id backing the node, if reported.
    pub instance_id: Option<String>,
    /// Registration status (`ACTIVE`, `DRAINING`, ...).
    pub status: Option<String>,
}

impl WorkerNode {
    /// Instance id of a node that is `ACTIVE`, `None` otherwise.
    pub fn active_instance_id(&self) -> Option<&str> {
        match self.status.as_deref() {
            Some(STATUS_ACTIVE) => self.instance_id.as_deref().filter(|id| !id.is_empty()),
            _ => None,
        }
    }
}

/// A node attribute used both to tag a node and to pin a job to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTarget {
    pub attribute: String,
    pub value: String,
}

impl PlacementTarget {
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Cluster query language expression matching nodes that carry this
    /// attribute value.
    pub fn expression(&self) -> String {
        format!("attribute:{} == {}", self.attribute, self.value)
    }
}

/// What a job launch returned.
///
/// ECS reports placement failures in-band, so a launch call can succeed
/// while starting nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchReport {
    pub task_arns: Vec<String>,
    pub failures: Vec<String>,
}

impl LaunchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for cluster service calls.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// The service rejected the call.
    #[error("{operation} failed: {code}: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    /// The call never got a service response (credentials, network,
    /// timeout, response parsing).
    #[error("{operation} request failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    /// The request could not be built locally.
    #[error("Invalid {operation} request: {message}")]
    InvalidRequest {
        operation: &'static str,
        message: String,
    },
}

impl ClusterError {
    /// Service error code, if the service answered.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn is_cluster_not_found(&self) -> bool {
        self.code() == Some(CLUSTER_NOT_FOUND_CODE)
    }

    fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        match err.as_service_error() {
            Some(service) => Self::Service {
                operation,
                code: service.code().unwrap_or("Unknown").to_string(),
                message: service.message().unwrap_or_default().to_string(),
            },
            None => Self::Request {
                operation,
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// ClusterApi
// ---------------------------------------------------------------------------

/// Cluster operations used by the cleanup workflow.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Check whether `cluster` exists. A missing or deleted cluster is
    /// `Ok(ClusterLookup::NotFound)`, not an error.
    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterLookup, ClusterError>;

    /// List the ARNs of every node registered with `cluster`.
    async fn list_nodes(&self, cluster: &str) -> Result<Vec<String>, ClusterError>;

    /// Describe the nodes identified by `arns`.
    async fn describe_nodes(
        &self,
        cluster: &str,
        arns: &[String],
    ) -> Result<Vec<WorkerNode>, ClusterError>;

    /// Set `target.attribute = target.value` on `node`.
    async fn tag_node(
        &self,
        cluster: &str,
        node: &WorkerNode,
        target: &PlacementTarget,
    ) -> Result<(), ClusterError>;

    /// Launch one job from `task_definition` on the node matching
    /// `placement`.
    async fn launch_job(
        &self,
        cluster: &str,
        task_definition: &str,
        placement: &PlacementTarget,
    ) -> Result<LaunchReport, ClusterError>;
}

// ---------------------------------------------------------------------------
// EcsClusterApi
// ---------------------------------------------------------------------------

/// [`ClusterApi`] backed by the Amazon ECS API.
#[derive(Debug, Clone)]
pub struct EcsClusterApi {
    client: aws_sdk_ecs::Client,
}

impl EcsClusterApi {
    pub fn new(client: aws_sdk_ecs::Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration (environment,
    /// profile, or the execution role's credentials).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_ecs::Client::new(&config))
    }
}

#[async_trait]
impl ClusterApi for EcsClusterApi {
    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterLookup, ClusterError> {
        let output = match self.client.describe_clusters().clusters(cluster).send().await {
            Ok(output) => output,
            Err(err) => {
                let err = ClusterError::from_sdk(OP_DESCRIBE_CLUSTERS, err);
                if err.is_cluster_not_found() {
                    return Ok(ClusterLookup::NotFound);
                }
                return Err(err);
            }
        };

        let statuses: Vec<Option<&str>> = output.clusters().iter().map(|c| c.status()).collect();
        let failure_reasons: Vec<Option<&str>> =
            output.failures().iter().map(|f| f.reason()).collect();

        lookup_from_response(&statuses, &failure_reasons)
    }

    async fn list_nodes(&self, cluster: &str) -> Result<Vec<String>, ClusterError> {
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_container_instances()
                .cluster(cluster)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| ClusterError::from_sdk(OP_LIST_CONTAINER_INSTANCES, e))?;

            arns.extend(output.container_instance_arns().iter().cloned());

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        tracing::debug!(cluster, count = arns.len(), "Listed container instances");
        Ok(arns)
    }

    async fn describe_nodes(
        &self,
        cluster: &str,
        arns: &[String],
    ) -> Result<Vec<WorkerNode>, ClusterError> {
        let mut nodes = Vec::with_capacity(arns.len());

        for batch in arns.chunks(DESCRIBE_BATCH_SIZE) {
            let output = self
                .client
                .describe_container_instances()
                .cluster(cluster)
                .set_container_instances(Some(batch.to_vec()))
                .send()
                .await
                .map_err(|e| ClusterError::from_sdk(OP_DESCRIBE_CONTAINER_INSTANCES, e))?;

            for failure in output.failures() {
                tracing::warn!(
                    cluster,
                    arn = failure.arn().unwrap_or("-"),
                    reason = failure.reason().unwrap_or("unknown"),
                    "Container instance could not be described",
                );
            }

            nodes.extend(output.container_instances().iter().map(|ci| WorkerNode {
                arn: ci.container_instance_arn().unwrap_or_default().to_string(),
                instance_id: ci.ec2_instance_id().map(str::to_string),
                status: ci.status().map(str::to_string),
            }));
        }

        Ok(nodes)
    }

    async fn tag_node(
        &self,
        cluster: &str,
        node: &WorkerNode,
        target: &PlacementTarget,
    ) -> Result<(), ClusterError> {
        let attribute = Attribute::builder()
            .name(&target.attribute)
            .value(&target.value)
            .target_type(TargetType::ContainerInstance)
            .target_id(&node.arn)
            .build()
            .map_err(|e| ClusterError::InvalidRequest {
                operation: OP_PUT_ATTRIBUTES,
                message: e.to_string(),
            })?;

        self.client
            .put_attributes()
            .cluster(cluster)
            .attributes(attribute)
            .send()
            .await
            .map_err(|e| ClusterError::from_sdk(OP_PUT_ATTRIBUTES, e))?;

        Ok(())
    }

    async fn launch_job(
        &self,
        cluster: &str,
        task_definition: &str,
        placement: &PlacementTarget,
    ) -> Result<LaunchReport, ClusterError> {
        let constraint = PlacementConstraint::builder()
            .r#type(PlacementConstraintType::MemberOf)
            .expression(placement.expression())
            .build();

        let output = self
            .client
            .run_task()
            .cluster(cluster)
            .task_definition(task_definition)
            .count(1)
            .launch_type(LaunchType::Ec2)
            .placement_constraints(constraint)
            .send()
            .await
            .map_err(|e| ClusterError::from_sdk(OP_RUN_TASK, e))?;

        Ok(LaunchReport {
            task_arns: output
                .tasks()
                .iter()
                .filter_map(|t| t.task_arn().map(str::to_string))
                .collect(),
            failures: output
                .failures()
                .iter()
                .map(|f| {
                    format!(
                        "{}: {}",
                        f.arn().unwrap_or("-"),
                        f.reason().unwrap_or("unknown")
                    )
                })
                .collect(),
        })
    }
}

/// Interpret a `DescribeClusters` response for a single cluster name.
///
/// A cluster that is reported but `INACTIVE` has been deleted. With no
/// cluster reported, a `MISSING` failure (or no failure at all) means it
/// never existed; any other failure reason is an error.
fn lookup_from_response(
    cluster_statuses: &[Option<&str>],
    failure_reasons: &[Option<&str>],
) -> Result<ClusterLookup, ClusterError> {
    if cluster_statuses
        .iter()
        .any(|status| *status != Some(STATUS_INACTIVE))
    {
        return Ok(ClusterLookup::Found);
    }
    if !cluster_statuses.is_empty() {
        return Ok(ClusterLookup::NotFound);
    }

    match failure_reasons.first().copied().flatten() {
        None | Some(FAILURE_REASON_MISSING) => Ok(ClusterLookup::NotFound),
        Some(reason) => Err(ClusterError::Service {
            operation: OP_DESCRIBE_CLUSTERS,
            code: "Failure".to_string(),
            message: reason.to_string(),
        }),
    }
}
