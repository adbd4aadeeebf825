use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    pipeline::{
        resources::{
            ContainerDefinition, PolicyStatement, Reference, RemovalPolicy, Resource, Role,
            Service, TaskDefinition,
        },
        ResourcePlan,
    },
};

use super::secret::{TwitterCredentials, WorkerSecret, WORKER_SECRET_NAME};

pub const WORKER_SECRET: &str = "TwitterConfig";
pub const TASK_ROLE: &str = "ECSRole";
pub const LOG_GROUP: &str = "TwitterLogGroup";
pub const CLUSTER: &str = "FargateCluster";
pub const TASK_DEFINITION: &str = "TwitterDriverTaskDefinition";
pub const SERVICE: &str = "TwitterDriverService";

const TASK_CPU: u32 = 1024;
const TASK_MEMORY_MIB: u32 = 2048;

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl From<TwitterConfig> for TwitterCredentials {
    fn from(config: TwitterConfig) -> Self {
        TwitterCredentials {
            consumer_key: config.consumer_key,
            consumer_secret: config.consumer_secret,
            access_token: config.access_token,
            access_token_secret: config.access_token_secret,
        }
    }
}

/// Deployment of the streaming worker that feeds a delivery stream.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReaderConfig {
    pub twitter_config: TwitterConfig,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub kinesis_firehose_name: String,
    pub subnet_ids: Vec<String>,
    pub security_group_id: String,
    #[serde(default = "default_image")]
    pub image: String,
}

fn default_image() -> String {
    "container/twitter".to_string()
}

impl ReaderConfig {
    pub fn secret(&self) -> WorkerSecret {
        WorkerSecret::assemble(
            self.twitter_config.clone().into(),
            self.topics.clone(),
            self.languages.clone(),
            self.kinesis_firehose_name.clone(),
        )
    }
}

pub fn plan(config: &ReaderConfig) -> Result<ResourcePlan, Error> {
    let stream = &config.kinesis_firehose_name;
    if stream.trim().is_empty() {
        return Err(Error::configuration("kinesisFirehoseName is required"));
    }
    if config.subnet_ids.is_empty() {
        return Err(Error::configuration("at least one subnet is required"));
    }
    if config.security_group_id.trim().is_empty() {
        return Err(Error::configuration("securityGroupId is required"));
    }

    let mut plan = ResourcePlan::new();

    plan.add(
        WORKER_SECRET,
        Resource::Secret {
            name: WORKER_SECRET_NAME.to_string(),
            description: "Twitter Configuration for Fargate Twitter Reader".to_string(),
            secret_string: config.secret().to_secret_string()?,
        },
    )?;

    let stream_arn = Reference::join([
        Reference::literal("arn:"),
        Reference::partition(),
        Reference::literal(":firehose:"),
        Reference::region(),
        Reference::literal(":"),
        Reference::account_id(),
        Reference::literal(format!(":deliverystream/{}", stream)),
    ]);
    let mut role = Role::new("ecs-tasks.amazonaws.com")
        .with_managed_policy("service-role/AmazonECSTaskExecutionRolePolicy");
    role.role_name = Some(format!("{}-TwitterReaderRole", stream));
    role.grant(PolicyStatement::new(
        &["firehose:PutRecord", "firehose:PutRecordBatch"],
        vec![stream_arn],
    ));
    role.grant(PolicyStatement::new(
        &["secretsmanager:GetSecretValue"],
        vec![Reference::id(WORKER_SECRET)],
    ));
    role.grant(PolicyStatement::new(
        &["tag:GetResources", "cloudwatch:PutMetricData"],
        vec![Reference::literal("*")],
    ));
    plan.add(TASK_ROLE, Resource::Role(role))?;

    plan.add(
        LOG_GROUP,
        Resource::LogGroup {
            name: format!("/twitter-reader/{}", stream),
            retention_days: Some(7),
        },
    )?
    .removal(RemovalPolicy::Destroy);

    plan.add(
        CLUSTER,
        Resource::Cluster {
            cluster_name: format!("{}-cluster", stream),
        },
    )?;

    plan.add(
        TASK_DEFINITION,
        Resource::TaskDefinition(TaskDefinition {
            cpu: TASK_CPU,
            memory_mib: TASK_MEMORY_MIB,
            task_role: Reference::arn_of(TASK_ROLE),
            execution_role: Reference::arn_of(TASK_ROLE),
            container: ContainerDefinition {
                name: "TwitterDriver".to_string(),
                image: config.image.clone(),
                cpu: TASK_CPU,
                memory_mib: TASK_MEMORY_MIB,
                log_group: Reference::id(LOG_GROUP),
                stream_prefix: format!("{}-TweetDriver", stream),
                docker_labels: BTreeMap::from([
                    ("Name".to_string(), "TwitterReader".to_string()),
                    ("Firehose".to_string(), stream.clone()),
                ]),
                essential: true,
            },
        }),
    )?
    .depends_on(WORKER_SECRET);

    plan.add(
        SERVICE,
        Resource::Service(Service {
            service_name: format!("{}-TwitterDriverService", stream),
            cluster: Reference::id(CLUSTER),
            task_definition: Reference::id(TASK_DEFINITION),
            desired_count: 1,
            assign_public_ip: true,
            subnets: config.subnet_ids.clone(),
            security_groups: vec![config.security_group_id.clone()],
        }),
    )?;

    plan.validate()?;
    Ok(plan)
}
