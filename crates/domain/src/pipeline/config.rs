use serde::{Deserialize, Serialize};

use crate::catalog::ColumnType;

use super::resources::RemovalPolicy;

/// Declarative description of a JSON to Parquet delivery pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub delivery_stream_name: String,
    pub target_table_config: TableConfig,
    #[serde(default)]
    pub source_backup_config: Option<TableConfig>,
    #[serde(default)]
    pub processing_config: Option<ProcessingConfig>,
    #[serde(default)]
    pub logs_config: Option<LogsConfig>,
    #[serde(default)]
    pub enable_cloudwatch_logging: bool,
    #[serde(default)]
    pub create_encryption_key: bool,
    #[serde(default)]
    pub use_access_control: bool,
    #[serde(default)]
    pub classifier_code: Option<CodeLocation>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    pub database_arn: String,
    #[serde(default)]
    pub s3_bucket_arn: Option<String>,
    #[serde(default, alias = "s3prefix")]
    pub s3_prefix: Option<String>,
}

impl TableConfig {
    pub fn prefix(&self) -> String {
        self.s3_prefix
            .clone()
            .unwrap_or_else(|| format!("{}/processed/", self.table_name))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            comment: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogsConfig {
    pub logs_group_name: String,
    #[serde(default)]
    pub logs_retention_days: Option<u32>,
    #[serde(default)]
    pub logs_removal_policy: Option<RemovalPolicy>,
}

/// Record transformation applied by the stream before conversion.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingConfig {
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub processors: Vec<Processor>,
}

fn enabled() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Processor {
    #[serde(rename = "type")]
    pub processor_type: String,
    #[serde(default)]
    pub parameters: Vec<ProcessorParameter>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorParameter {
    pub parameter_name: String,
    pub parameter_value: String,
}

/// Where the classification handler's deployment package lives.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum CodeLocation {
    /// Local build output, uploaded by the packaging step.
    Asset { path: String },
    S3 { bucket: String, key: String },
}

impl Default for CodeLocation {
    fn default() -> Self {
        CodeLocation::Asset {
            path: "target/lambda/glue-classification".to_string(),
        }
    }
}
