use std::collections::BTreeMap;

use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use crate::classification::ClassificationProperties;

use super::config::{CodeLocation, ColumnDefinition, ProcessingConfig};

/// A value that is either known at plan time or resolved by the orchestrator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reference {
    Literal(String),
    /// Logical id or pseudo parameter
    Ref(String),
    Attribute(String, String),
    Join(Vec<Reference>),
}

impl Reference {
    pub fn literal(value: impl Into<String>) -> Self {
        Reference::Literal(value.into())
    }

    pub fn id(logical_id: &str) -> Self {
        Reference::Ref(logical_id.to_string())
    }

    pub fn arn_of(logical_id: &str) -> Self {
        Reference::Attribute(logical_id.to_string(), "Arn".to_string())
    }

    pub fn partition() -> Self {
        Reference::Ref("AWS::Partition".to_string())
    }

    pub fn region() -> Self {
        Reference::Ref("AWS::Region".to_string())
    }

    pub fn account_id() -> Self {
        Reference::Ref("AWS::AccountId".to_string())
    }

    /// Concatenation of `parts`, with adjacent literals merged.
    pub fn join(parts: impl IntoIterator<Item = Reference>) -> Self {
        let mut joined: Vec<Reference> = Vec::new();
        for part in parts {
            let flattened = match part {
                Reference::Join(inner) => inner,
                other => vec![other],
            };
            for part in flattened {
                if let (Some(Reference::Literal(previous)), Reference::Literal(next)) =
                    (joined.last_mut(), &part)
                {
                    previous.push_str(next);
                    continue;
                }
                joined.push(part);
            }
        }

        if joined.len() == 1 {
            joined.remove(0)
        } else {
            Reference::Join(joined)
        }
    }

    pub fn suffixed(&self, suffix: &str) -> Self {
        Reference::join([self.clone(), Reference::literal(suffix)])
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reference::Literal(value) => serializer.serialize_str(value),
            Reference::Ref(id) => json!({ "Ref": id }).serialize(serializer),
            Reference::Attribute(id, attribute) => {
                json!({ "Fn::GetAtt": [id, attribute] }).serialize(serializer)
            }
            Reference::Join(parts) => json!({ "Fn::Join": ["", parts] }).serialize(serializer),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    Retain,
    Destroy,
}

impl RemovalPolicy {
    pub fn deletion_policy(&self) -> &'static str {
        match self {
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Destroy => "Delete",
        }
    }
}

/// An `Allow` statement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<Reference>,
}

impl PolicyStatement {
    pub fn new(actions: &[&str], resources: Vec<Reference>) -> Self {
        Self {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    pub fn allows(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

impl Serialize for PolicyStatement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PolicyStatement", 3)?;
        state.serialize_field("Effect", "Allow")?;
        state.serialize_field("Action", &self.actions)?;
        state.serialize_field("Resource", &self.resources)?;
        state.end()
    }
}

fn policy_document(statements: &[PolicyStatement]) -> Value {
    json!({ "Version": "2012-10-17", "Statement": statements })
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Role {
    pub role_name: Option<String>,
    pub assumed_by: String,
    pub managed_policy_arns: Vec<Reference>,
    pub inline_policies: BTreeMap<String, Vec<PolicyStatement>>,
    /// Grants accumulated while planning, rendered as the default policy.
    pub statements: Vec<PolicyStatement>,
}

impl Role {
    pub fn new(assumed_by: &str) -> Self {
        Self {
            role_name: None,
            assumed_by: assumed_by.to_string(),
            managed_policy_arns: Vec::new(),
            inline_policies: BTreeMap::new(),
            statements: Vec::new(),
        }
    }

    pub fn with_managed_policy(mut self, name: &str) -> Self {
        self.managed_policy_arns.push(Reference::join([
            Reference::literal("arn:"),
            Reference::partition(),
            Reference::literal(format!(":iam::aws:policy/{}", name)),
        ]));
        self
    }

    pub fn with_inline_policy(mut self, name: &str, statements: Vec<PolicyStatement>) -> Self {
        self.inline_policies.insert(name.to_string(), statements);
        self
    }

    pub fn grant(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    pub fn all_statements(&self) -> impl Iterator<Item = &PolicyStatement> {
        self.inline_policies
            .values()
            .flatten()
            .chain(self.statements.iter())
    }

    pub fn allows(&self, action: &str) -> bool {
        self.all_statements().any(|s| s.allows(action))
    }

    fn properties(&self) -> Value {
        let mut policies: Vec<Value> = self
            .inline_policies
            .iter()
            .map(|(name, statements)| {
                json!({ "PolicyName": name, "PolicyDocument": policy_document(statements) })
            })
            .collect();
        if !self.statements.is_empty() {
            policies.push(json!({
                "PolicyName": "DefaultPolicy",
                "PolicyDocument": policy_document(&self.statements),
            }));
        }

        let mut properties = json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": self.assumed_by },
                    "Action": "sts:AssumeRole"
                }]
            },
            "ManagedPolicyArns": self.managed_policy_arns,
            "Policies": policies,
        });
        if let Some(name) = &self.role_name {
            properties["RoleName"] = json!(name);
        }
        properties
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    Parquet,
}

impl DataFormat {
    pub fn classification(&self) -> &'static str {
        match self {
            DataFormat::Json => "json",
            DataFormat::Parquet => "parquet",
        }
    }

    pub fn input_format(&self) -> &'static str {
        match self {
            DataFormat::Json => "org.apache.hadoop.mapred.TextInputFormat",
            DataFormat::Parquet => "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat",
        }
    }

    pub fn output_format(&self) -> &'static str {
        match self {
            DataFormat::Json => "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat",
            DataFormat::Parquet => "org.apache.hadoop.hive.ql.io.parquet.MapredParquetOutputFormat",
        }
    }

    pub fn serialization_library(&self) -> &'static str {
        match self {
            DataFormat::Json => "org.openx.data.jsonserde.JsonSerDe",
            DataFormat::Parquet => "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Table {
    pub database_name: String,
    pub table_name: String,
    pub description: String,
    pub columns: Vec<ColumnDefinition>,
    pub partition_keys: Vec<ColumnDefinition>,
    pub data_format: DataFormat,
    pub compressed: bool,
    pub location: Reference,
    pub encrypted: bool,
}

fn columns_value(columns: &[ColumnDefinition]) -> Value {
    columns
        .iter()
        .map(|c| {
            let mut column = json!({ "Name": c.name, "Type": c.column_type.to_string() });
            if let Some(comment) = &c.comment {
                column["Comment"] = json!(comment);
            }
            column
        })
        .collect()
}

impl Table {
    fn properties(&self) -> Value {
        json!({
            "CatalogId": Reference::account_id(),
            "DatabaseName": self.database_name,
            "TableInput": {
                "Name": self.table_name,
                "Description": self.description,
                "TableType": "EXTERNAL_TABLE",
                "Parameters": {
                    "classification": self.data_format.classification(),
                    "has_encrypted_data": self.encrypted,
                },
                "PartitionKeys": columns_value(&self.partition_keys),
                "StorageDescriptor": {
                    "Columns": columns_value(&self.columns),
                    "Compressed": self.compressed,
                    "Location": self.location,
                    "InputFormat": self.data_format.input_format(),
                    "OutputFormat": self.data_format.output_format(),
                    "SerdeInfo": {
                        "SerializationLibrary": self.data_format.serialization_library(),
                    },
                    "StoredAsSubDirectories": false,
                },
            },
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Function {
    pub description: String,
    pub code: CodeLocation,
    pub handler: String,
    pub runtime: String,
    pub timeout_secs: u32,
    pub memory_mb: u32,
    pub role: Reference,
}

impl Function {
    fn properties(&self) -> Value {
        let code = match &self.code {
            CodeLocation::Asset { path } => json!({ "Asset": path }),
            CodeLocation::S3 { bucket, key } => json!({ "S3Bucket": bucket, "S3Key": key }),
        };
        json!({
            "Description": self.description,
            "Code": code,
            "Handler": self.handler,
            "Runtime": self.runtime,
            "Timeout": self.timeout_secs,
            "MemorySize": self.memory_mb,
            "Role": self.role,
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataLakePermissionKind {
    DataLocationAccess,
    Alter,
    CreateTable,
    Drop,
    Delete,
    Insert,
    Select,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataLakeTarget {
    DataLocation(Reference),
    Database { name: String },
    Table { database_name: String, name: String },
}

impl DataLakeTarget {
    fn value(&self) -> Value {
        match self {
            DataLakeTarget::DataLocation(arn) => {
                json!({ "DataLocationResource": { "S3Resource": arn } })
            }
            DataLakeTarget::Database { name } => json!({ "DatabaseResource": { "Name": name } }),
            DataLakeTarget::Table {
                database_name,
                name,
            } => json!({ "TableResource": { "DatabaseName": database_name, "Name": name } }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataLakePermission {
    pub principal: Reference,
    pub target: DataLakeTarget,
    pub permissions: Vec<DataLakePermissionKind>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct BufferingHints {
    pub interval_secs: u32,
    pub size_mb: u32,
}

impl BufferingHints {
    fn value(&self) -> Value {
        json!({ "IntervalInSeconds": self.interval_secs, "SizeInMBs": self.size_mb })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoggingOptions {
    pub enabled: bool,
    pub log_group_name: String,
    pub log_stream_name: Reference,
}

impl LoggingOptions {
    fn value(&self) -> Value {
        json!({
            "Enabled": self.enabled,
            "LogGroupName": self.log_group_name,
            "LogStreamName": self.log_stream_name,
        })
    }
}

/// Without a key the destination carries no encryption configuration at all.
fn attach_encryption(destination: &mut Value, key: &Option<Reference>) {
    if let Some(arn) = key {
        destination["EncryptionConfiguration"] =
            json!({ "KMSEncryptionConfig": { "AWSKMSKeyARN": arn } });
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub enum BackupMode {
    Enabled,
    Disabled,
}

/// Raw-record backup destination.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct S3Destination {
    pub bucket_arn: Reference,
    pub role_arn: Reference,
    pub buffering: BufferingHints,
    pub logging: LoggingOptions,
    pub encryption_key: Option<Reference>,
    pub prefix: String,
    pub error_output_prefix: String,
}

impl S3Destination {
    fn value(&self) -> Value {
        let mut destination = json!({
            "BucketARN": self.bucket_arn,
            "RoleARN": self.role_arn,
            "BufferingHints": self.buffering.value(),
            "CloudWatchLoggingOptions": self.logging.value(),
            "CompressionFormat": "UNCOMPRESSED",
            "Prefix": self.prefix,
            "ErrorOutputPrefix": self.error_output_prefix,
        });
        attach_encryption(&mut destination, &self.encryption_key);
        destination
    }
}

/// Inline JSON to Parquet conversion against a catalog table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormatConversion {
    pub role_arn: Reference,
    pub database_name: String,
    pub table_name: String,
    pub output_format: DataFormat,
}

impl FormatConversion {
    fn value(&self) -> Value {
        let serializer = match self.output_format {
            DataFormat::Parquet => json!({ "ParquetSerDe": {} }),
            DataFormat::Json => json!({}),
        };
        json!({
            "Enabled": true,
            "InputFormatConfiguration": { "Deserializer": { "OpenXJsonSerDe": {} } },
            "OutputFormatConfiguration": { "Serializer": serializer },
            "SchemaConfiguration": {
                "RoleARN": self.role_arn,
                "CatalogId": Reference::account_id(),
                "DatabaseName": self.database_name,
                "TableName": self.table_name,
                "Region": Reference::region(),
                "VersionId": "LATEST",
            },
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeliveryStream {
    pub name: String,
    pub bucket_arn: Reference,
    pub role_arn: Reference,
    pub buffering: BufferingHints,
    pub logging: LoggingOptions,
    pub conversion: FormatConversion,
    pub encryption_key: Option<Reference>,
    pub prefix: String,
    pub error_output_prefix: String,
    pub processing: Option<ProcessingConfig>,
    pub backup_mode: BackupMode,
    pub backup: Option<S3Destination>,
}

impl DeliveryStream {
    fn properties(&self) -> Value {
        let mut destination = json!({
            "BucketARN": self.bucket_arn,
            "RoleARN": self.role_arn,
            "BufferingHints": self.buffering.value(),
            "CloudWatchLoggingOptions": self.logging.value(),
            "CompressionFormat": "UNCOMPRESSED",
            "DataFormatConversionConfiguration": self.conversion.value(),
            "Prefix": self.prefix,
            "ErrorOutputPrefix": self.error_output_prefix,
            "S3BackupMode": self.backup_mode,
        });
        attach_encryption(&mut destination, &self.encryption_key);
        if let Some(backup) = &self.backup {
            destination["S3BackupConfiguration"] = backup.value();
        }
        if let Some(processing) = &self.processing {
            destination["ProcessingConfiguration"] = json!({
                "Enabled": processing.enabled,
                "Processors": processing.processors.iter().map(|p| json!({
                    "Type": p.processor_type,
                    "Parameters": p.parameters.iter().map(|param| json!({
                        "ParameterName": param.parameter_name,
                        "ParameterValue": param.parameter_value,
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            });
        }

        json!({
            "DeliveryStreamName": self.name,
            "DeliveryStreamType": "DirectPut",
            "ExtendedS3DestinationConfiguration": destination,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerDefinition {
    pub name: String,
    pub image: String,
    pub cpu: u32,
    pub memory_mib: u32,
    pub log_group: Reference,
    pub stream_prefix: String,
    pub docker_labels: BTreeMap<String, String>,
    pub essential: bool,
}

impl ContainerDefinition {
    fn value(&self) -> Value {
        json!({
            "Name": self.name,
            "Image": self.image,
            "Cpu": self.cpu,
            "Memory": self.memory_mib,
            "Essential": self.essential,
            "DockerLabels": self.docker_labels,
            "LogConfiguration": {
                "LogDriver": "awslogs",
                "Options": {
                    "awslogs-group": self.log_group,
                    "awslogs-stream-prefix": self.stream_prefix,
                    "awslogs-region": Reference::region(),
                },
            },
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskDefinition {
    pub cpu: u32,
    pub memory_mib: u32,
    pub task_role: Reference,
    pub execution_role: Reference,
    pub container: ContainerDefinition,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Service {
    pub service_name: String,
    pub cluster: Reference,
    pub task_definition: Reference,
    pub desired_count: u32,
    pub assign_public_ip: bool,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
}

/// Every resource kind a plan can contain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Resource {
    LogGroup {
        name: String,
        retention_days: Option<u32>,
    },
    LogStream {
        log_group: Reference,
    },
    Role(Role),
    Key {
        description: String,
        enable_key_rotation: bool,
    },
    KeyAlias {
        alias_name: String,
        target_key: Reference,
    },
    Bucket,
    Table(Table),
    Function(Function),
    Classification {
        service_token: Reference,
        properties: ClassificationProperties,
    },
    DataLakeResource {
        resource_arn: Reference,
        role_arn: Reference,
    },
    DataLakePermission(DataLakePermission),
    DeliveryStream(DeliveryStream),
    Secret {
        name: String,
        description: String,
        secret_string: String,
    },
    Cluster {
        cluster_name: String,
    },
    TaskDefinition(TaskDefinition),
    Service(Service),
}

impl Resource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::LogGroup { .. } => "AWS::Logs::LogGroup",
            Resource::LogStream { .. } => "AWS::Logs::LogStream",
            Resource::Role(_) => "AWS::IAM::Role",
            Resource::Key { .. } => "AWS::KMS::Key",
            Resource::KeyAlias { .. } => "AWS::KMS::Alias",
            Resource::Bucket => "AWS::S3::Bucket",
            Resource::Table(_) => "AWS::Glue::Table",
            Resource::Function(_) => "AWS::Lambda::Function",
            Resource::Classification { .. } => "Custom::GlueClassification",
            Resource::DataLakeResource { .. } => "AWS::LakeFormation::Resource",
            Resource::DataLakePermission(_) => "AWS::LakeFormation::Permissions",
            Resource::DeliveryStream(_) => "AWS::KinesisFirehose::DeliveryStream",
            Resource::Secret { .. } => "AWS::SecretsManager::Secret",
            Resource::Cluster { .. } => "AWS::ECS::Cluster",
            Resource::TaskDefinition(_) => "AWS::ECS::TaskDefinition",
            Resource::Service(_) => "AWS::ECS::Service",
        }
    }

    pub fn properties(&self) -> Value {
        match self {
            Resource::LogGroup {
                name,
                retention_days,
            } => {
                let mut properties = json!({ "LogGroupName": name });
                if let Some(days) = retention_days {
                    properties["RetentionInDays"] = json!(days);
                }
                properties
            }
            Resource::LogStream { log_group } => json!({ "LogGroupName": log_group }),
            Resource::Role(role) => role.properties(),
            Resource::Key {
                description,
                enable_key_rotation,
            } => {
                let account_root = Reference::join([
                    Reference::literal("arn:"),
                    Reference::partition(),
                    Reference::literal(":iam::"),
                    Reference::account_id(),
                    Reference::literal(":root"),
                ]);
                json!({
                    "Description": description,
                    "Enabled": true,
                    "EnableKeyRotation": enable_key_rotation,
                    "KeyPolicy": {
                        "Version": "2012-10-17",
                        "Statement": [{
                            "Effect": "Allow",
                            "Principal": { "AWS": account_root },
                            "Action": "kms:*",
                            "Resource": "*"
                        }]
                    },
                })
            }
            Resource::KeyAlias {
                alias_name,
                target_key,
            } => json!({ "AliasName": alias_name, "TargetKeyId": target_key }),
            Resource::Bucket => json!({}),
            Resource::Table(table) => table.properties(),
            Resource::Function(function) => function.properties(),
            Resource::Classification {
                service_token,
                properties,
            } => json!({
                "ServiceToken": service_token,
                "TableName": properties.table_name,
                "DatabaseName": properties.database_name,
                "DataFormat": properties.data_format,
            }),
            Resource::DataLakeResource {
                resource_arn,
                role_arn,
            } => json!({
                "ResourceArn": resource_arn,
                "RoleArn": role_arn,
                "UseServiceLinkedRole": false,
            }),
            Resource::DataLakePermission(permission) => json!({
                "DataLakePrincipal": { "DataLakePrincipalIdentifier": permission.principal },
                "Resource": permission.target.value(),
                "Permissions": permission.permissions,
            }),
            Resource::DeliveryStream(stream) => stream.properties(),
            Resource::Secret {
                name,
                description,
                secret_string,
            } => json!({
                "Name": name,
                "Description": description,
                "SecretString": secret_string,
            }),
            Resource::Cluster { cluster_name } => json!({ "ClusterName": cluster_name }),
            Resource::TaskDefinition(task) => json!({
                "RequiresCompatibilities": ["FARGATE"],
                "NetworkMode": "awsvpc",
                "Cpu": task.cpu.to_string(),
                "Memory": task.memory_mib.to_string(),
                "TaskRoleArn": task.task_role,
                "ExecutionRoleArn": task.execution_role,
                "ContainerDefinitions": [task.container.value()],
            }),
            Resource::Service(service) => {
                let assign_public_ip = if service.assign_public_ip {
                    "ENABLED"
                } else {
                    "DISABLED"
                };
                json!({
                "ServiceName": service.service_name,
                "Cluster": service.cluster,
                "TaskDefinition": service.task_definition,
                "DesiredCount": service.desired_count,
                "LaunchType": "FARGATE",
                "NetworkConfiguration": {
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": assign_public_ip,
                        "Subnets": service.subnets,
                        "SecurityGroups": service.security_groups,
                    },
                },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_merges_literals_and_flattens() {
        let bucket = Reference::arn_of("TargetBucket");
        let joined = Reference::join([
            Reference::literal("a"),
            Reference::literal("b"),
            Reference::join([bucket.clone(), Reference::literal("/")]),
            Reference::literal("*"),
        ]);

        assert_eq!(
            joined,
            Reference::Join(vec![
                Reference::literal("ab"),
                bucket,
                Reference::literal("/*"),
            ])
        );
        assert_eq!(
            Reference::literal("arn:aws:s3:::b").suffixed("/*"),
            Reference::literal("arn:aws:s3:::b/*")
        );
    }

    #[test]
    fn references_render_as_intrinsics() {
        let value = serde_json::to_value(Reference::join([
            Reference::arn_of("Bucket"),
            Reference::literal("/*"),
        ]))
        .unwrap();

        assert_eq!(
            value,
            json!({ "Fn::Join": ["", [{ "Fn::GetAtt": ["Bucket", "Arn"] }, "/*"]] })
        );
        assert_eq!(
            serde_json::to_value(Reference::id("LogGroup")).unwrap(),
            json!({ "Ref": "LogGroup" })
        );
    }

    #[test]
    fn role_renders_default_policy_after_inline_policies() {
        let mut role = Role::new("firehose.amazonaws.com").with_inline_policy(
            "CloudWatchPermissions",
            vec![PolicyStatement::new(&["cloudwatch:PutMetricData"], vec![Reference::literal("*")])],
        );
        role.grant(PolicyStatement::new(&["kms:Decrypt"], vec![Reference::arn_of("Key")]));

        let properties = Resource::Role(role.clone()).properties();
        let policies = properties["Policies"].as_array().unwrap();

        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1]["PolicyName"], "DefaultPolicy");
        assert_eq!(policies[1]["PolicyDocument"]["Statement"][0]["Action"][0], "kms:Decrypt");
        assert!(role.allows("cloudwatch:PutMetricData"));
        assert!(!role.allows("s3:PutObject"));
    }
}
