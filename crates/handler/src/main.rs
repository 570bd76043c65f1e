//! `nodesweep-handler` -- custom resource cleanup function.
//!
//! Runs as a Lambda function behind a custom resource. When the owning
//! service is deleted it launches one cleanup task on every active
//! container instance of the cluster, then reports the outcome to the
//! request's pre-signed response URL.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default      | Description                               |
//! |-------------------------|----------|--------------|-------------------------------------------|
//! | `PLACEMENT_ATTRIBUTE`   | no       | `instanceId` | Node attribute used to pin cleanup tasks  |
//! | `CALLBACK_TIMEOUT_SECS` | no       | `30`         | Timeout of the response `PUT`             |
//! | `LOG_FORMAT`            | no       | `text`       | `text` or `json`                          |
//! | `RUST_LOG`              | no       | see [`logging::DEFAULT_FILTER`] | Tracing filter     |

use lambda_runtime::{service_fn, Error, LambdaEvent};

use nodesweep_cloud::callback::HttpResponseSender;
use nodesweep_cloud::ecs::EcsClusterApi;
use nodesweep_core::event::{CustomResourceEvent, InvocationContext};
use nodesweep_core::response::CleanupOutcome;
use nodesweep_handler::cleanup::CleanupHandler;
use nodesweep_handler::config::HandlerConfig;
use nodesweep_handler::logging;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    let config = HandlerConfig::from_env()?;
    logging::init(config.log_format);

    tracing::info!(
        placement_attribute = %config.placement_attribute,
        callback_timeout_secs = config.callback_timeout.as_secs(),
        "Starting nodesweep-handler",
    );

    let cluster_api = EcsClusterApi::from_env().await;
    let sender = HttpResponseSender::new(config.callback_timeout)?;
    let handler = CleanupHandler::new(cluster_api, sender, config.placement_attribute);
    let handler = &handler;

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<CustomResourceEvent>| async move {
            invoke(handler, event).await
        },
    ))
    .await
}

async fn invoke(
    handler: &CleanupHandler<EcsClusterApi, HttpResponseSender>,
    event: LambdaEvent<CustomResourceEvent>,
) -> Result<CleanupOutcome, Error> {
    let LambdaEvent { payload, context } = event;
    let ctx = InvocationContext::new(context.env_config.log_stream.clone());

    tracing::info!(
        request_id = %payload.request_id,
        request_type = %payload.request_type,
        logical_resource_id = %payload.logical_resource_id,
        "Received custom resource request",
    );
    tracing::debug!(event = ?payload, "Request payload");

    let outcome = handler.handle(&payload, &ctx).await?;
    tracing::info!(status = %outcome.status, reason = %outcome.reason, "Request handled");
    Ok(outcome)
}
