//! Shared fakes for the cleanup workflow tests.
//!
//! [`FakeClusterApi`] and [`RecordingSender`] stand in for ECS and the
//! callback endpoint, recording every call so tests can assert on exactly
//! what the workflow did.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use nodesweep_cloud::callback::{CallbackError, ResponseSender};
use nodesweep_cloud::ecs::{
    ClusterApi, ClusterError, ClusterLookup, LaunchReport, PlacementTarget, WorkerNode,
};
use nodesweep_core::event::{CustomResourceEvent, InvocationContext};
use nodesweep_core::response::CallbackResponse;
use nodesweep_handler::cleanup::CleanupHandler;

pub const CLUSTER: &str = "gpu-cluster";
pub const TASK_DEFINITION: &str = "node-cleanup:3";
pub const RESPONSE_URL: &str = "https://cfn-responses.example.com/stack?X-Amz-Signature=sig";
pub const LOG_STREAM: &str = "2026/10/18/[$LATEST]0123456789abcdef";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Build a request of the given type targeting [`CLUSTER`].
pub fn event(request_type: &str) -> CustomResourceEvent {
    serde_json::from_value(serde_json::json!({
        "RequestType": request_type,
        "ResponseURL": RESPONSE_URL,
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/app/guid",
        "RequestId": "req-42",
        "LogicalResourceId": "NodeCleanup",
        "ResourceType": "Custom::NodeCleanup",
        "ResourceProperties": {
            "ServiceToken": "arn:aws:lambda:us-east-1:123456789012:function:cleanup",
            "ClusterName": CLUSTER,
            "TaskDefinition": TASK_DEFINITION
        }
    }))
    .expect("test event should deserialize")
}

pub fn ctx() -> InvocationContext {
    InvocationContext::new(LOG_STREAM)
}

pub fn active_node(instance_id: &str) -> WorkerNode {
    node(instance_id, "ACTIVE")
}

pub fn node(instance_id: &str, status: &str) -> WorkerNode {
    WorkerNode {
        arn: arn_for(instance_id),
        instance_id: Some(instance_id.to_string()),
        status: Some(status.to_string()),
    }
}

pub fn arn_for(instance_id: &str) -> String {
    format!("arn:aws:ecs:us-east-1:123456789012:container-instance/{CLUSTER}/{instance_id}")
}

pub fn service_error(operation: &'static str, code: &str) -> ClusterError {
    ClusterError::Service {
        operation,
        code: code.to_string(),
        message: "injected".to_string(),
    }
}

// ---------------------------------------------------------------------------
// FakeClusterApi
// ---------------------------------------------------------------------------

/// A call observed by [`FakeClusterApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeCluster(String),
    ListNodes(String),
    DescribeNodes(Vec<String>),
    TagNode { arn: String, target: PlacementTarget },
    LaunchJob {
        task_definition: String,
        placement: PlacementTarget,
    },
}

/// In-memory cluster with scriptable failures.
pub struct FakeClusterApi {
    pub lookup: ClusterLookup,
    pub nodes: Vec<WorkerNode>,
    /// Error code returned by `describe_cluster`, if set.
    pub describe_cluster_error: Option<String>,
    /// Error code returned by `list_nodes`, if set.
    pub list_error: Option<String>,
    /// Error code returned by `describe_nodes`, if set.
    pub describe_nodes_error: Option<String>,
    /// Instance ids whose tagging fails.
    pub failing_tags: HashSet<String>,
    /// Instance ids whose launch fails.
    pub failing_launches: HashSet<String>,
    /// Instance ids whose launch returns in-band placement failures.
    pub unplaced_launches: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeClusterApi {
    pub fn with_nodes(nodes: Vec<WorkerNode>) -> Self {
        Self {
            lookup: ClusterLookup::Found,
            nodes,
            describe_cluster_error: None,
            list_error: None,
            describe_nodes_error: None,
            failing_tags: HashSet::new(),
            failing_launches: HashSet::new(),
            unplaced_launches: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            lookup: ClusterLookup::NotFound,
            ..Self::with_nodes(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Instance ids of every launch attempt, in order.
    pub fn launched(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::LaunchJob { placement, .. } => Some(placement.value),
                _ => None,
            })
            .collect()
    }

    /// Instance ids of every tag attempt, in order.
    pub fn tagged(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::TagNode { target, .. } => Some(target.value),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterLookup, ClusterError> {
        self.record(Call::DescribeCluster(cluster.to_string()));
        match &self.describe_cluster_error {
            Some(code) => Err(service_error("DescribeClusters", code)),
            None => Ok(self.lookup),
        }
    }

    async fn list_nodes(&self, cluster: &str) -> Result<Vec<String>, ClusterError> {
        self.record(Call::ListNodes(cluster.to_string()));
        match &self.list_error {
            Some(code) => Err(service_error("ListContainerInstances", code)),
            None => Ok(self.nodes.iter().map(|n| n.arn.clone()).collect()),
        }
    }

    async fn describe_nodes(
        &self,
        _cluster: &str,
        arns: &[String],
    ) -> Result<Vec<WorkerNode>, ClusterError> {
        self.record(Call::DescribeNodes(arns.to_vec()));
        match &self.describe_nodes_error {
            Some(code) => Err(service_error("DescribeContainerInstances", code)),
            None => Ok(self
                .nodes
                .iter()
                .filter(|n| arns.contains(&n.arn))
                .cloned()
                .collect()),
        }
    }

    async fn tag_node(
        &self,
        _cluster: &str,
        node: &WorkerNode,
        target: &PlacementTarget,
    ) -> Result<(), ClusterError> {
        self.record(Call::TagNode {
            arn: node.arn.clone(),
            target: target.clone(),
        });
        if self.failing_tags.contains(&target.value) {
            return Err(service_error("PutAttributes", "AccessDeniedException"));
        }
        Ok(())
    }

    async fn launch_job(
        &self,
        _cluster: &str,
        task_definition: &str,
        placement: &PlacementTarget,
    ) -> Result<LaunchReport, ClusterError> {
        self.record(Call::LaunchJob {
            task_definition: task_definition.to_string(),
            placement: placement.clone(),
        });
        if self.failing_launches.contains(&placement.value) {
            return Err(service_error("RunTask", "InvalidParameterException"));
        }
        if self.unplaced_launches.contains(&placement.value) {
            return Ok(LaunchReport {
                task_arns: Vec::new(),
                failures: vec![format!("{}: RESOURCE:MEMORY", arn_for(&placement.value))],
            });
        }
        Ok(LaunchReport {
            task_arns: vec![format!("arn:aws:ecs:task/{}", placement.value)],
            failures: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// RecordingSender
// ---------------------------------------------------------------------------

/// Callback endpoint that records every response it receives.
#[derive(Default)]
pub struct RecordingSender {
    /// HTTP status to fail with, if set.
    pub fail_with: Option<u16>,
    sent: Mutex<Vec<(String, CallbackResponse)>>,
}

impl RecordingSender {
    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, CallbackResponse)> {
        self.sent.lock().unwrap().clone()
    }

    /// The single response sent, panicking if there was not exactly one.
    pub fn only_response(&self) -> CallbackResponse {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one callback, got {sent:?}");
        sent.into_iter().next().unwrap().1
    }
}

#[async_trait]
impl ResponseSender for RecordingSender {
    async fn send(&self, url: &str, response: &CallbackResponse) -> Result<u16, CallbackError> {
        self.sent
            .lock()
            .unwrap()
            .push((url.to_string(), response.clone()));
        match self.fail_with {
            Some(status) => Err(CallbackError::HttpStatus(status)),
            None => Ok(200),
        }
    }
}

pub fn handler(api: FakeClusterApi) -> CleanupHandler<FakeClusterApi, RecordingSender> {
    CleanupHandler::new(api, RecordingSender::default(), "instanceId")
}
