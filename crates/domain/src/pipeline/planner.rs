use std::collections::HashSet;

use crate::{catalog::ColumnType, classification::ClassificationProperties, errors::Error};

use super::{
    arn,
    config::{ColumnDefinition, PipelineConfig, TableConfig},
    plan::ResourcePlan,
    resources::{
        BackupMode, BufferingHints, DataFormat, DataLakePermission, DataLakePermissionKind,
        DataLakeTarget, DeliveryStream, FormatConversion, Function, LoggingOptions,
        PolicyStatement, Reference, RemovalPolicy, Resource, Role, S3Destination, Table,
    },
};

pub const LOG_GROUP: &str = "FirehoseLogGroup";
pub const LOG_STREAM: &str = "FirehoseLogStream";
pub const FIREHOSE_ROLE: &str = "FirehoseRole";
pub const ENCRYPTION_KEY: &str = "TransformerKey";
pub const ENCRYPTION_KEY_ALIAS: &str = "TransformerKeyAlias";
pub const CLASSIFICATION_ROLE: &str = "ClassificationRole";
pub const CLASSIFICATION_FUNCTION: &str = "ClassificationFunction";
pub const DELIVERY_STREAM: &str = "TransformerDeliveryStream";

const SOURCE: &str = "Source";
const TARGET: &str = "Target";

pub const BUFFERING: BufferingHints = BufferingHints {
    interval_secs: 60,
    size_mb: 128,
};

const DEFAULT_LOG_RETENTION_DAYS: u32 = 7;
const CLASSIFICATION_TIMEOUT_SECS: u32 = 30;

const PARTITION_PATH: &str =
    "year=!{timestamp:yyyy}/month=!{timestamp:MM}/day=!{timestamp:dd}/hour=!{timestamp:HH}/";

const BUCKET_DELIVERY_ACTIONS: &[&str] = &[
    "s3:AbortMultipartUpload",
    "s3:GetBucketLocation",
    "s3:GetObject",
    "s3:ListBucket",
    "s3:ListBucketMultipartUploads",
    "s3:PutObject",
];

const BUCKET_READ_WRITE_ACTIONS: &[&str] = &[
    "s3:GetObject*",
    "s3:GetBucket*",
    "s3:List*",
    "s3:DeleteObject*",
    "s3:PutObject",
    "s3:PutObjectLegalHold",
    "s3:PutObjectRetention",
    "s3:PutObjectTagging",
    "s3:PutObjectVersionTagging",
    "s3:Abort*",
];

const KEY_ENCRYPT_DECRYPT_ACTIONS: &[&str] = &[
    "kms:Decrypt",
    "kms:Encrypt",
    "kms:ReEncrypt*",
    "kms:GenerateDataKey*",
];

const DATABASE_PERMISSIONS: &[DataLakePermissionKind] = &[
    DataLakePermissionKind::Alter,
    DataLakePermissionKind::CreateTable,
    DataLakePermissionKind::Drop,
];

const TABLE_PERMISSIONS: &[DataLakePermissionKind] = &[
    DataLakePermissionKind::Alter,
    DataLakePermissionKind::Drop,
    DataLakePermissionKind::Delete,
    DataLakePermissionKind::Insert,
    DataLakePermissionKind::Select,
];

/// Hourly partition columns appended to every table.
pub fn partition_keys() -> Vec<ColumnDefinition> {
    ["year", "month", "day", "hour"]
        .into_iter()
        .map(|name| ColumnDefinition::new(name, ColumnType::SmallInt))
        .collect()
}

/// Result of planning one pipeline.
#[derive(Clone, Debug)]
pub struct PipelinePlan {
    pub plan: ResourcePlan,
    pub stream_name: String,
    pub target_table: String,
    pub backup_table: Option<String>,
    pub encryption_key: Option<String>,
}

impl PipelinePlan {
    pub fn delivery_stream(&self) -> Option<&DeliveryStream> {
        match self.plan.get(DELIVERY_STREAM).map(|r| &r.resource) {
            Some(Resource::DeliveryStream(stream)) => Some(stream),
            _ => None,
        }
    }

    pub fn backup_mode(&self) -> Option<BackupMode> {
        self.delivery_stream().map(|stream| stream.backup_mode)
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        match self.plan.get(id).map(|r| &r.resource) {
            Some(Resource::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        match self.plan.get(id).map(|r| &r.resource) {
            Some(Resource::Role(role)) => Some(role),
            _ => None,
        }
    }
}

/// Catalog-side identity of a configured table, resolved up front.
struct ResolvedTable<'a> {
    config: &'a TableConfig,
    database_name: String,
    bucket_name: Option<String>,
}

impl<'a> ResolvedTable<'a> {
    fn resolve(config: &'a TableConfig, role: &str) -> Result<Self, Error> {
        if config.table_name.trim().is_empty() {
            return Err(Error::configuration(format!("{} table name is required", role)));
        }

        let mut seen = HashSet::new();
        for column in &config.columns {
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(Error::configuration(format!(
                    "column {} of {} is declared twice",
                    column.name, config.table_name
                )));
            }
        }

        Ok(Self {
            config,
            database_name: arn::database_name(&config.database_arn)?,
            bucket_name: config
                .s3_bucket_arn
                .as_deref()
                .map(arn::bucket_name)
                .transpose()?,
        })
    }
}

/// Bucket as seen by the rest of the plan.
struct BucketRef {
    arn: Reference,
    name: Reference,
}

struct Planner<'a> {
    config: &'a PipelineConfig,
    plan: ResourcePlan,
    firehose_role: Role,
    classification_role: Role,
    encryption_key: Option<Reference>,
    log_group_name: String,
}

/// Derive the resource plan of a pipeline. Every reference is resolved
/// here, so an invalid configuration fails before any resource is emitted.
pub fn plan(config: &PipelineConfig) -> Result<PipelinePlan, Error> {
    if config.delivery_stream_name.trim().is_empty() {
        return Err(Error::configuration("delivery stream name is required"));
    }

    let target = ResolvedTable::resolve(&config.target_table_config, "target")?;
    let backup = config
        .source_backup_config
        .as_ref()
        .map(|backup| ResolvedTable::resolve(backup, "source backup"))
        .transpose()?;

    if let Some(backup) = &backup {
        if backup.database_name == target.database_name
            && backup.config.table_name == target.config.table_name
        {
            return Err(Error::configuration(format!(
                "source backup table {}.{} must differ from the target table",
                backup.database_name, backup.config.table_name
            )));
        }
    }

    let mut planner = Planner::new(config)?;

    let backup_destination = match &backup {
        Some(backup) => Some(planner.backup(backup)?),
        None => None,
    };
    planner.target(&target, backup_destination)?;

    let encryption_key = planner.encryption_key.as_ref().map(|_| ENCRYPTION_KEY.to_string());
    let plan = planner.finish()?;

    tracing::info!(
        "Planned {} resources for delivery stream {}",
        plan.resources().count(),
        config.delivery_stream_name
    );

    Ok(PipelinePlan {
        plan,
        stream_name: config.delivery_stream_name.clone(),
        target_table: table_id(TARGET),
        backup_table: backup.map(|_| table_id(SOURCE)),
        encryption_key,
    })
}

fn table_id(prefix: &str) -> String {
    format!("{}Table", prefix)
}

impl<'a> Planner<'a> {
    fn new(config: &'a PipelineConfig) -> Result<Self, Error> {
        let mut plan = ResourcePlan::new();
        let logs = config.logs_config.as_ref();
        let removal = logs
            .and_then(|l| l.logs_removal_policy)
            .unwrap_or(RemovalPolicy::Retain);
        let log_group_name = logs
            .map(|l| l.logs_group_name.clone())
            .unwrap_or_else(|| format!("/aws/kinesis-firehose/{}", config.delivery_stream_name));

        plan.add(
            LOG_GROUP,
            Resource::LogGroup {
                name: log_group_name.clone(),
                retention_days: Some(
                    logs.and_then(|l| l.logs_retention_days)
                        .unwrap_or(DEFAULT_LOG_RETENTION_DAYS),
                ),
            },
        )?
        .removal(removal);
        plan.add(
            LOG_STREAM,
            Resource::LogStream {
                log_group: Reference::id(LOG_GROUP),
            },
        )?
        .removal(removal);

        let mut planner = Self {
            config,
            plan,
            firehose_role: firehose_role(),
            classification_role: Role::new("lambda.amazonaws.com")
                .with_managed_policy("service-role/AWSLambdaBasicExecutionRole"),
            encryption_key: None,
            log_group_name,
        };

        if config.create_encryption_key {
            planner.encryption_key()?;
        }
        if config.use_access_control {
            let statement =
                PolicyStatement::new(&["lakeformation:GetDataAccess"], vec![Reference::literal("*")]);
            planner.firehose_role.grant(statement.clone());
            planner.classification_role.grant(statement);
        }

        planner.plan.add(
            CLASSIFICATION_FUNCTION,
            Resource::Function(Function {
                description: "Sets the classification of catalog tables".to_string(),
                code: config.classifier_code.clone().unwrap_or_default(),
                handler: "bootstrap".to_string(),
                runtime: "provided.al2023".to_string(),
                timeout_secs: CLASSIFICATION_TIMEOUT_SECS,
                memory_mb: 128,
                role: Reference::arn_of(CLASSIFICATION_ROLE),
            }),
        )?
        .depends_on(CLASSIFICATION_ROLE);

        Ok(planner)
    }

    fn encryption_key(&mut self) -> Result<(), Error> {
        let stream = &self.config.delivery_stream_name;

        self.plan
            .add(
                ENCRYPTION_KEY,
                Resource::Key {
                    description: format!("Encryption key for all data using {}", stream),
                    enable_key_rotation: true,
                },
            )?
            .removal(RemovalPolicy::Retain);
        self.plan.add(
            ENCRYPTION_KEY_ALIAS,
            Resource::KeyAlias {
                alias_name: format!("alias/{}TransformerKey", stream),
                target_key: Reference::id(ENCRYPTION_KEY),
            },
        )?;

        let key_arn = Reference::arn_of(ENCRYPTION_KEY);
        self.firehose_role.grant(PolicyStatement::new(
            KEY_ENCRYPT_DECRYPT_ACTIONS,
            vec![key_arn.clone()],
        ));
        self.plan.output("KmsKeyId", Reference::id(ENCRYPTION_KEY));
        self.encryption_key = Some(key_arn);
        Ok(())
    }

    /// Import the configured bucket or create one, and let the stream write to it.
    fn bucket(&mut self, prefix: &str, table: &ResolvedTable) -> Result<BucketRef, Error> {
        let bucket = match (&table.config.s3_bucket_arn, &table.bucket_name) {
            (Some(arn), Some(name)) => BucketRef {
                arn: Reference::literal(arn.clone()),
                name: Reference::literal(name.clone()),
            },
            _ => {
                let id = format!("{}Bucket", prefix);
                self.plan.add(&id, Resource::Bucket)?.removal(RemovalPolicy::Retain);
                BucketRef {
                    arn: Reference::arn_of(&id),
                    name: Reference::id(&id),
                }
            }
        };

        let resources = vec![bucket.arn.clone(), bucket.arn.suffixed("/*")];
        self.firehose_role
            .grant(PolicyStatement::new(BUCKET_READ_WRITE_ACTIONS, resources.clone()));
        self.firehose_role
            .grant(PolicyStatement::new(BUCKET_DELIVERY_ACTIONS, resources));

        if self.config.use_access_control {
            self.register_data_location(prefix, &bucket)?;
        }

        Ok(bucket)
    }

    fn register_data_location(&mut self, prefix: &str, bucket: &BucketRef) -> Result<(), Error> {
        let registration = format!("{}BucketDataLakeResource", prefix);
        self.plan.add(
            &registration,
            Resource::DataLakeResource {
                resource_arn: bucket.arn.clone(),
                role_arn: Reference::arn_of(FIREHOSE_ROLE),
            },
        )?;

        for role_id in [FIREHOSE_ROLE, CLASSIFICATION_ROLE] {
            self.plan
                .add(
                    &format!("{}Bucket{}LocationPermission", prefix, role_id),
                    Resource::DataLakePermission(DataLakePermission {
                        principal: Reference::arn_of(role_id),
                        target: DataLakeTarget::DataLocation(bucket.arn.clone()),
                        permissions: vec![DataLakePermissionKind::DataLocationAccess],
                    }),
                )?
                .depends_on(&registration);
        }
        Ok(())
    }

    /// Catalog table, its classification and, with access control, its grants.
    fn table(
        &mut self,
        prefix: &str,
        table: &ResolvedTable,
        bucket: &BucketRef,
        data_format: DataFormat,
        description: String,
    ) -> Result<(), Error> {
        let table_id = table_id(prefix);
        let table_name = &table.config.table_name;

        self.plan.add(
            &table_id,
            Resource::Table(Table {
                database_name: table.database_name.clone(),
                table_name: table_name.clone(),
                description,
                columns: table.config.columns.clone(),
                partition_keys: partition_keys(),
                data_format,
                compressed: false,
                location: Reference::join([
                    Reference::literal("s3://"),
                    bucket.name.clone(),
                    Reference::literal(format!("/{}", table.config.prefix())),
                ]),
                encrypted: self.encryption_key.is_some(),
            }),
        )?;

        self.classification_role.grant(PolicyStatement::new(
            &["glue:GetTable", "glue:UpdateTable"],
            catalog_arns(&table.database_name, table_name),
        ));

        let classification_id = format!("{}Classification", table_id);
        self.plan
            .add(
                &classification_id,
                Resource::Classification {
                    service_token: Reference::arn_of(CLASSIFICATION_FUNCTION),
                    properties: ClassificationProperties {
                        table_name: table_name.clone(),
                        database_name: table.database_name.clone(),
                        data_format: data_format.classification().to_string(),
                    },
                },
            )?
            .depends_on(&table_id)
            .depends_on(CLASSIFICATION_ROLE);

        if self.config.use_access_control {
            for role_id in [FIREHOSE_ROLE, CLASSIFICATION_ROLE] {
                self.plan.add(
                    &format!("{}{}DatabasePermission", table_id, role_id),
                    Resource::DataLakePermission(DataLakePermission {
                        principal: Reference::arn_of(role_id),
                        target: DataLakeTarget::Database {
                            name: table.database_name.clone(),
                        },
                        permissions: DATABASE_PERMISSIONS.to_vec(),
                    }),
                )?;

                // Granting before the schema is final races the classification update.
                self.plan
                    .add(
                        &format!("{}{}TablePermission", table_id, role_id),
                        Resource::DataLakePermission(DataLakePermission {
                            principal: Reference::arn_of(role_id),
                            target: DataLakeTarget::Table {
                                database_name: table.database_name.clone(),
                                name: table_name.clone(),
                            },
                            permissions: TABLE_PERMISSIONS.to_vec(),
                        }),
                    )?
                    .depends_on(&table_id)
                    .depends_on(&classification_id);
            }
        }

        Ok(())
    }

    fn backup(&mut self, backup: &ResolvedTable) -> Result<S3Destination, Error> {
        let bucket = self.bucket(SOURCE, backup)?;
        self.table(
            SOURCE,
            backup,
            &bucket,
            DataFormat::Json,
            format!(
                "Backup original data table for {}",
                backup.config.table_name
            ),
        )?;

        Ok(S3Destination {
            bucket_arn: bucket.arn,
            role_arn: Reference::arn_of(FIREHOSE_ROLE),
            buffering: BUFFERING,
            logging: LoggingOptions {
                enabled: self.config.enable_cloudwatch_logging,
                log_group_name: self.log_group_name.clone(),
                log_stream_name: Reference::literal("raw"),
            },
            encryption_key: self.encryption_key.clone(),
            prefix: format!("raw/{}", PARTITION_PATH),
            error_output_prefix: error_output_prefix(),
        })
    }

    fn target(
        &mut self,
        target: &ResolvedTable,
        backup: Option<S3Destination>,
    ) -> Result<(), Error> {
        let bucket = self.bucket(TARGET, target)?;
        self.table(
            TARGET,
            target,
            &bucket,
            DataFormat::Parquet,
            format!("Target Parquet Table for {}", target.config.table_name),
        )?;

        let role_arn = Reference::arn_of(FIREHOSE_ROLE);
        let backup_mode = if backup.is_some() {
            BackupMode::Enabled
        } else {
            BackupMode::Disabled
        };

        let stream = self.plan.add(
            DELIVERY_STREAM,
            Resource::DeliveryStream(DeliveryStream {
                name: self.config.delivery_stream_name.clone(),
                bucket_arn: bucket.arn,
                role_arn: role_arn.clone(),
                buffering: BUFFERING,
                logging: LoggingOptions {
                    enabled: self.config.enable_cloudwatch_logging,
                    log_group_name: self.log_group_name.clone(),
                    log_stream_name: Reference::id(LOG_STREAM),
                },
                conversion: FormatConversion {
                    role_arn,
                    database_name: target.database_name.clone(),
                    table_name: target.config.table_name.clone(),
                    output_format: DataFormat::Parquet,
                },
                encryption_key: self.encryption_key.clone(),
                prefix: format!("processed/{}", PARTITION_PATH),
                error_output_prefix: error_output_prefix(),
                processing: self.config.processing_config.clone(),
                backup_mode,
                backup,
            }),
        )?;
        stream.depends_on(FIREHOSE_ROLE).depends_on(&table_id(TARGET));

        self.plan
            .output("DeliveryStreamArn", Reference::arn_of(DELIVERY_STREAM));
        self.plan
            .output("DeliveryStreamName", Reference::id(DELIVERY_STREAM));
        Ok(())
    }

    fn finish(mut self) -> Result<ResourcePlan, Error> {
        self.plan.add(FIREHOSE_ROLE, Resource::Role(self.firehose_role))?;
        self.plan
            .add(CLASSIFICATION_ROLE, Resource::Role(self.classification_role))?;
        self.plan.validate()?;
        Ok(self.plan)
    }
}

fn error_output_prefix() -> String {
    format!("failed/!{{firehose:error-output-type}}/{}", PARTITION_PATH)
}

fn firehose_role() -> Role {
    let log_group_arn = Reference::arn_of(LOG_GROUP);
    let logs_arn_prefix = Reference::join([
        Reference::literal("arn:"),
        Reference::partition(),
        Reference::literal(":logs:"),
        Reference::region(),
        Reference::literal(":"),
        Reference::account_id(),
        Reference::literal(":log-group:"),
    ]);
    let log_stream_arn = Reference::join([
        logs_arn_prefix.clone(),
        Reference::id(LOG_GROUP),
        Reference::literal(":log-stream:"),
        Reference::id(LOG_STREAM),
    ]);

    Role::new("firehose.amazonaws.com")
        .with_inline_policy(
            "GluePermissions",
            vec![PolicyStatement::new(
                &["glue:GetTableVersions"],
                vec![Reference::literal("*")],
            )],
        )
        .with_inline_policy(
            "CloudWatchPermissions",
            vec![PolicyStatement::new(
                &["cloudwatch:PutMetricData"],
                vec![Reference::literal("*")],
            )],
        )
        .with_inline_policy(
            "LogsPermissions",
            vec![PolicyStatement::new(
                &["logs:DescribeLogStreams", "logs:DescribeLogGroups"],
                vec![log_group_arn, logs_arn_prefix.suffixed("*")],
            )],
        )
        .with_inline_policy(
            "LogsPutPermissions",
            vec![PolicyStatement::new(&["logs:PutLogEvents"], vec![log_stream_arn])],
        )
}

fn catalog_arns(database: &str, table: &str) -> Vec<Reference> {
    let prefix = Reference::join([
        Reference::literal("arn:"),
        Reference::partition(),
        Reference::literal(":glue:"),
        Reference::region(),
        Reference::literal(":"),
        Reference::account_id(),
        Reference::literal(":"),
    ]);

    vec![
        prefix.suffixed("catalog"),
        prefix.suffixed(&format!("database/{}", database)),
        prefix.suffixed(&format!("table/{}/{}", database, table)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::config::LogsConfig;

    const DATABASE_ARN: &str = "arn:aws:glue:eu-west-1:123456789012:database/twitter";

    fn table_config(name: &str) -> TableConfig {
        TableConfig {
            table_name: name.to_string(),
            columns: vec![
                ColumnDefinition::new("id", ColumnType::BigInt),
                ColumnDefinition::new("text", ColumnType::String),
            ],
            database_arn: DATABASE_ARN.to_string(),
            s3_bucket_arn: None,
            s3_prefix: None,
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            delivery_stream_name: "twitter-firehose".to_string(),
            target_table_config: table_config("r_twitter"),
            source_backup_config: None,
            processing_config: None,
            logs_config: None,
            enable_cloudwatch_logging: true,
            create_encryption_key: false,
            use_access_control: false,
            classifier_code: None,
        }
    }

    fn with_backup() -> PipelineConfig {
        PipelineConfig {
            source_backup_config: Some(table_config("raw_twitter")),
            ..config()
        }
    }

    #[test]
    fn minimal_pipeline_has_no_backup_or_key() {
        let planned = plan(&config()).unwrap();

        assert_eq!(planned.backup_mode(), Some(BackupMode::Disabled));
        assert!(planned.delivery_stream().unwrap().backup.is_none());
        assert!(planned.backup_table.is_none());
        assert!(planned.encryption_key.is_none());
        assert_eq!(planned.plan.count_of("AWS::KMS::Key"), 0);
        assert_eq!(planned.plan.count_of("AWS::Glue::Table"), 1);
        assert_eq!(planned.plan.count_of("AWS::S3::Bucket"), 1);
        assert_eq!(planned.plan.count_of("AWS::LakeFormation::Permissions"), 0);
        assert_eq!(planned.plan.count_of("AWS::Lambda::Function"), 1);
        assert!(!planned.plan.outputs().contains_key("KmsKeyId"));
    }

    #[test]
    fn backup_config_enables_backup_mode() {
        let planned = plan(&with_backup()).unwrap();
        let stream = planned.delivery_stream().unwrap();
        let backup = stream.backup.as_ref().unwrap();

        assert_eq!(planned.backup_mode(), Some(BackupMode::Enabled));
        assert_eq!(backup.buffering, BUFFERING);
        assert!(backup.prefix.starts_with("raw/year="));
        assert_eq!(backup.bucket_arn, Reference::arn_of("SourceBucket"));

        let source = planned.table("SourceTable").unwrap();
        assert_eq!(source.data_format, DataFormat::Json);
        assert!(!source.compressed);
        assert_eq!(planned.plan.count_of("Custom::GlueClassification"), 2);
    }

    #[test]
    fn every_table_ends_with_hourly_partitions() {
        let planned = plan(&with_backup()).unwrap();

        for id in ["TargetTable", "SourceTable"] {
            let table = planned.table(id).unwrap();
            let names: Vec<&str> = table.partition_keys.iter().map(|c| c.name.as_str()).collect();

            assert_eq!(names, ["year", "month", "day", "hour"]);
            assert!(table
                .partition_keys
                .iter()
                .all(|c| c.column_type == ColumnType::SmallInt));
            assert_eq!(table.columns.len(), 2);
        }
    }

    #[test]
    fn target_table_is_parquet_converted_inline() {
        let planned = plan(&config()).unwrap();
        let stream = planned.delivery_stream().unwrap();
        let target = planned.table("TargetTable").unwrap();

        assert_eq!(target.data_format, DataFormat::Parquet);
        assert_eq!(target.database_name, "twitter");
        assert_eq!(stream.conversion.database_name, "twitter");
        assert_eq!(stream.conversion.table_name, "r_twitter");
        assert_eq!(stream.buffering, BUFFERING);
        assert!(stream.prefix.starts_with("processed/year="));

        let template = planned.plan.to_template();
        let destination = &template["Resources"][DELIVERY_STREAM]["Properties"]
            ["ExtendedS3DestinationConfiguration"];
        assert_eq!(destination["CompressionFormat"], "UNCOMPRESSED");
        assert_eq!(destination["S3BackupMode"], "Disabled");
        assert_eq!(
            destination["DataFormatConversionConfiguration"]["OutputFormatConfiguration"]
                ["Serializer"],
            serde_json::json!({ "ParquetSerDe": {} })
        );
    }

    #[test]
    fn encryption_key_is_granted_and_referenced() {
        let planned = plan(&PipelineConfig {
            create_encryption_key: true,
            ..with_backup()
        })
        .unwrap();
        let key_arn = Reference::arn_of(ENCRYPTION_KEY);
        let stream = planned.delivery_stream().unwrap();

        assert_eq!(planned.encryption_key.as_deref(), Some(ENCRYPTION_KEY));
        assert_eq!(stream.encryption_key.as_ref(), Some(&key_arn));
        assert_eq!(stream.backup.as_ref().unwrap().encryption_key.as_ref(), Some(&key_arn));
        assert!(planned.role(FIREHOSE_ROLE).unwrap().allows("kms:Encrypt"));
        assert!(planned.table("TargetTable").unwrap().encrypted);
        assert!(planned.plan.outputs().contains_key("KmsKeyId"));
    }

    #[test]
    fn destinations_carry_encryption_only_with_a_key() {
        let plain = plan(&with_backup()).unwrap().plan.to_template();
        let destination =
            &plain["Resources"][DELIVERY_STREAM]["Properties"]["ExtendedS3DestinationConfiguration"];
        assert!(destination.get("EncryptionConfiguration").is_none());
        assert!(destination["S3BackupConfiguration"]
            .get("EncryptionConfiguration")
            .is_none());

        let encrypted = plan(&PipelineConfig {
            create_encryption_key: true,
            ..with_backup()
        })
        .unwrap()
        .plan
        .to_template();
        let destination = &encrypted["Resources"][DELIVERY_STREAM]["Properties"]
            ["ExtendedS3DestinationConfiguration"];
        assert_eq!(
            destination["EncryptionConfiguration"]["KMSEncryptionConfig"]["AWSKMSKeyARN"],
            serde_json::json!({ "Fn::GetAtt": [ENCRYPTION_KEY, "Arn"] })
        );
        assert!(destination["S3BackupConfiguration"]
            .get("EncryptionConfiguration")
            .is_some());
    }

    #[test]
    fn baseline_role_policies_are_always_present() {
        let planned = plan(&config()).unwrap();
        let role = planned.role(FIREHOSE_ROLE).unwrap();

        assert_eq!(role.assumed_by, "firehose.amazonaws.com");
        for action in [
            "glue:GetTableVersions",
            "cloudwatch:PutMetricData",
            "logs:DescribeLogStreams",
            "logs:PutLogEvents",
            "s3:PutObject",
        ] {
            assert!(role.allows(action), "missing {}", action);
        }
        assert!(!role.allows("kms:Encrypt"));
        assert!(!role.allows("lakeformation:GetDataAccess"));
    }

    #[test]
    fn access_control_grants_both_roles_after_classification() {
        let planned = plan(&PipelineConfig {
            use_access_control: true,
            ..with_backup()
        })
        .unwrap();

        // 2 buckets x 2 roles locations + 2 tables x 2 roles x (database + table)
        assert_eq!(planned.plan.count_of("AWS::LakeFormation::Permissions"), 12);
        assert_eq!(planned.plan.count_of("AWS::LakeFormation::Resource"), 2);

        for table in ["TargetTable", "SourceTable"] {
            for role in [FIREHOSE_ROLE, CLASSIFICATION_ROLE] {
                let permission = planned
                    .plan
                    .get(&format!("{}{}TablePermission", table, role))
                    .unwrap();

                assert!(permission.depends_on.contains(&table.to_string()));
                assert!(permission
                    .depends_on
                    .contains(&format!("{}Classification", table)));
                match &permission.resource {
                    Resource::DataLakePermission(p) => {
                        assert_eq!(p.permissions, TABLE_PERMISSIONS.to_vec());
                        assert_eq!(p.principal, Reference::arn_of(role));
                    }
                    other => panic!("unexpected resource {:?}", other),
                }
            }
        }

        assert!(planned
            .role(CLASSIFICATION_ROLE)
            .unwrap()
            .allows("lakeformation:GetDataAccess"));
    }

    #[test]
    fn imported_bucket_is_not_created() {
        let mut config = config();
        config.target_table_config.s3_bucket_arn = Some("arn:aws:s3:::tweets".to_string());
        config.target_table_config.s3_prefix = Some("twitter/processed/".to_string());

        let planned = plan(&config).unwrap();
        let target = planned.table("TargetTable").unwrap();

        assert_eq!(planned.plan.count_of("AWS::S3::Bucket"), 0);
        assert_eq!(
            target.location,
            Reference::literal("s3://tweets/twitter/processed/")
        );
        assert_eq!(
            planned.delivery_stream().unwrap().bucket_arn,
            Reference::literal("arn:aws:s3:::tweets")
        );
    }

    #[test]
    fn logs_config_overrides_defaults() {
        let planned = plan(&PipelineConfig {
            logs_config: Some(LogsConfig {
                logs_group_name: "/aws/test/firehose/".to_string(),
                logs_retention_days: Some(30),
                logs_removal_policy: Some(RemovalPolicy::Destroy),
            }),
            ..config()
        })
        .unwrap();
        let log_group = planned.plan.get(LOG_GROUP).unwrap();

        assert_eq!(log_group.removal_policy, Some(RemovalPolicy::Destroy));
        assert_eq!(
            log_group.resource,
            Resource::LogGroup {
                name: "/aws/test/firehose/".to_string(),
                retention_days: Some(30),
            }
        );
        assert_eq!(
            planned.delivery_stream().unwrap().logging.log_group_name,
            "/aws/test/firehose/"
        );
    }

    #[test]
    fn configuration_errors_fail_fast() {
        let mut bad_database = config();
        bad_database.target_table_config.database_arn = "aws:::glue:database".to_string();
        assert!(matches!(plan(&bad_database), Err(Error::InvalidArn { .. })));

        let mut no_stream = config();
        no_stream.delivery_stream_name = " ".to_string();
        assert!(matches!(plan(&no_stream), Err(Error::Configuration { .. })));

        let same_table = PipelineConfig {
            source_backup_config: Some(table_config("r_twitter")),
            ..config()
        };
        assert!(matches!(plan(&same_table), Err(Error::Configuration { .. })));

        let mut repeated = config();
        repeated
            .target_table_config
            .columns
            .push(ColumnDefinition::new("Text", ColumnType::String));
        assert!(matches!(plan(&repeated), Err(Error::Configuration { .. })));
    }

    #[test]
    fn partition_keys_are_added_even_when_columns_share_their_names() {
        let mut config = config();
        config
            .target_table_config
            .columns
            .push(ColumnDefinition::new("year", ColumnType::Int));

        let planned = plan(&config).unwrap();
        let target = planned.table("TargetTable").unwrap();

        assert_eq!(target.columns.last().unwrap().name, "year");
        assert_eq!(target.columns.last().unwrap().column_type, ColumnType::Int);
        let names: Vec<&str> = target.partition_keys.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["year", "month", "day", "hour"]);
    }

    #[test]
    fn planning_is_deterministic() {
        let config = PipelineConfig {
            use_access_control: true,
            create_encryption_key: true,
            ..with_backup()
        };

        assert_eq!(
            plan(&config).unwrap().plan.to_template(),
            plan(&config).unwrap().plan.to_template()
        );
    }
}
