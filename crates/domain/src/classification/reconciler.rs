use std::collections::HashMap;

use serde_json::Value;

use crate::{
    catalog::{Catalog, CatalogError},
    errors::Error,
};

use super::{ClassificationProperties, LifecycleEvent, RequestType, Response};

/// Decode an orchestrator payload. Anything that is not a well-formed
/// Create, Update or Delete event is a protocol error.
pub fn parse_event(payload: Value) -> Result<LifecycleEvent, Error> {
    match payload.get("RequestType") {
        Some(Value::String(request_type))
            if !matches!(request_type.as_str(), "Create" | "Update" | "Delete") =>
        {
            return Err(Error::Protocol {
                message: format!("Invalid request type: {}", request_type),
            });
        }
        None => {
            return Err(Error::Protocol {
                message: "Missing RequestType".to_string(),
            });
        }
        _ => {}
    }

    serde_json::from_value(payload).map_err(|e| Error::Protocol {
        message: format!("Malformed lifecycle event: {}", e),
    })
}

/// Applies table classification on Create and acknowledges everything else.
pub struct Reconciler<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, event: &LifecycleEvent) -> Response {
        let props = &event.resource_properties;

        match event.request_type {
            RequestType::Create => self.on_create(event).await,
            RequestType::Update | RequestType::Delete => {
                let physical_id = event
                    .physical_resource_id
                    .clone()
                    .unwrap_or_else(|| props.physical_id());
                Response::success(event, physical_id)
            }
        }
    }

    async fn on_create(&self, event: &LifecycleEvent) -> Response {
        let props = &event.resource_properties;
        let response = Response::success(event, props.physical_id());

        // Classification is cosmetic; a catalog failure must not block the deployment.
        match self.classify(props).await {
            Ok(()) => {
                tracing::info!(
                    "Updated classification of {}.{} to {}",
                    props.database_name,
                    props.table_name,
                    props.data_format
                );
                response.with_data(HashMap::from([(
                    "Classification".to_string(),
                    props.data_format.clone(),
                )]))
            }
            Err(CatalogError::NotFound { database, table }) => {
                tracing::warn!("Table {}.{} not found, skipping classification", database, table);
                response.with_reason(format!("Table {}.{} not found", database, table))
            }
            Err(e) => {
                tracing::error!(
                    "Failed to classify {}.{}: {}",
                    props.database_name,
                    props.table_name,
                    e
                );
                response.with_reason(e.to_string())
            }
        }
    }

    async fn classify(&self, props: &ClassificationProperties) -> Result<(), CatalogError> {
        let table = self
            .catalog
            .get_table(&props.database_name, &props.table_name)
            .await?;

        self.catalog
            .update_table(&props.database_name, table.with_classification(&props.data_format))
            .await
    }
}
