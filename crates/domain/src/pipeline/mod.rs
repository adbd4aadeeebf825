/// ARN parsing
pub mod arn;

/// Declarative pipeline configuration
pub mod config;

/// Resource graph container
pub mod plan;

/// Configuration to resource graph
pub mod planner;

/// Typed resource model
pub mod resources;

pub use config::{ColumnDefinition, LogsConfig, PipelineConfig, ProcessingConfig, TableConfig};
pub use plan::{PlannedResource, ResourcePlan};
pub use planner::{partition_keys, plan, PipelinePlan};
pub use resources::{BackupMode, DataFormat, Reference, RemovalPolicy, Resource};
