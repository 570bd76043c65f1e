//! Custom resource request model.
//!
//! [`CustomResourceEvent`] mirrors the JSON document the orchestrator sends
//! when a custom resource is created, updated, or deleted. Keys are
//! PascalCase on the wire.

use serde::Deserialize;

use crate::error::CoreError;

/// Wire key of the cluster name property.
pub const PROPERTY_CLUSTER_NAME: &str = "ClusterName";

/// Wire key of the cleanup task definition property.
pub const PROPERTY_TASK_DEFINITION: &str = "TaskDefinition";

// ---------------------------------------------------------------------------
// RequestType
// ---------------------------------------------------------------------------

/// Lifecycle operation the orchestrator is performing on the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    /// Any request type this handler does not recognise.
    #[serde(other)]
    Unknown,
}

impl RequestType {
    /// Only deletions trigger a cleanup run.
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResourceProperties
// ---------------------------------------------------------------------------

/// User-supplied properties of the custom resource.
///
/// Keys other than the two below (e.g. `ServiceToken`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceProperties {
    /// Name of the cluster whose nodes should be cleaned up.
    pub cluster_name: Option<String>,
    /// Task definition (family, `family:revision`, or ARN) of the cleanup job.
    pub task_definition: Option<String>,
}

// ---------------------------------------------------------------------------
// CustomResourceEvent
// ---------------------------------------------------------------------------

/// A custom resource lifecycle request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,

    /// Pre-signed URL the outcome must be `PUT` to.
    #[serde(rename = "ResponseURL")]
    pub response_url: String,

    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,

    #[serde(default)]
    pub resource_type: Option<String>,

    /// Absent on `Create` requests.
    #[serde(default)]
    pub physical_resource_id: Option<String>,

    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

impl CustomResourceEvent {
    /// The `ClusterName` property, or an error if it is absent or blank.
    pub fn cluster_name(&self) -> Result<&str, CoreError> {
        non_blank(self.resource_properties.cluster_name.as_deref())
            .ok_or(CoreError::MissingProperty(PROPERTY_CLUSTER_NAME))
    }

    /// The `TaskDefinition` property, or an error if it is absent or blank.
    pub fn task_definition(&self) -> Result<&str, CoreError> {
        non_blank(self.resource_properties.task_definition.as_deref())
            .ok_or(CoreError::MissingProperty(PROPERTY_TASK_DEFINITION))
    }

    /// Cluster name and task definition, checked in that order.
    pub fn required_properties(&self) -> Result<(&str, &str), CoreError> {
        Ok((self.cluster_name()?, self.task_definition()?))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// InvocationContext
// ---------------------------------------------------------------------------

/// Per-invocation values supplied by the runtime rather than the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Log stream of the current invocation; reported as the physical
    /// resource id.
    pub log_stream_name: String,
}

impl InvocationContext {
    pub fn new(log_stream_name: impl Into<String>) -> Self {
        Self {
            log_stream_name: log_stream_name.into(),
        }
    }
}
