use std::collections::HashMap;

use derive_new::new;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

/// Properties of the classification custom resource.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ClassificationProperties {
    pub table_name: String,
    pub database_name: String,
    pub data_format: String,
}

impl ClassificationProperties {
    /// Stable identifier of the classified table, `database-table`.
    pub fn physical_id(&self) -> String {
        format!("{}-{}", self.database_name, self.table_name)
    }
}

/// Lifecycle notification sent by the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    pub request_type: RequestType,
    pub request_id: String,
    pub stack_id: String,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub resource_properties: ClassificationProperties,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failed,
}

/// Terminal answer to a [`LifecycleEvent`].
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
#[serde(rename_all = "PascalCase")]
pub struct Response {
    pub status: Status,
    pub physical_resource_id: String,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

impl Response {
    pub fn success(event: &LifecycleEvent, physical_resource_id: String) -> Self {
        Self::new(
            Status::Success,
            physical_resource_id,
            event.stack_id.clone(),
            event.request_id.clone(),
            event.logical_resource_id.clone(),
        )
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_data(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(data);
        self
    }
}
