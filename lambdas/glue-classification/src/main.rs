mod deadline;
mod glue;
mod responder;
mod settings;

use aws_config::BehaviorVersion;
use domain::{
    catalog::Catalog,
    classification::{parse_event, Reconciler, Response},
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

use deadline::DeadlineCatalog;
use glue::GlueCatalog;
use responder::{HttpResponseSender, ResponseSender};
use settings::{ResponseDelivery, Settings};

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let settings = Settings::from_env()?;
    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
    let catalog = GlueCatalog::new(aws_sdk_glue::Client::new(&config));
    let sender = HttpResponseSender::new(settings.delivery_timeout)?;

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| async {
        handle(event.payload, &catalog, &sender, &settings).await
    }))
    .await
}

async fn handle(
    payload: Value,
    catalog: &dyn Catalog,
    sender: &dyn ResponseSender,
    settings: &Settings,
) -> Result<Response, Error> {
    let event = parse_event(payload)?;

    tracing::info!(
        "Processing {:?} for {} ({})",
        event.request_type,
        event.logical_resource_id,
        event.request_id
    );

    let catalog = DeadlineCatalog::new(catalog, settings.catalog_budget);
    let response = Reconciler::new(&catalog).handle(&event).await;

    if settings.delivery == ResponseDelivery::Callback {
        sender.send(&event.response_url, &response).await?;
    }

    Ok(response)
}
