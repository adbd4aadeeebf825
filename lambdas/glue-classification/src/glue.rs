use async_trait::async_trait;
use aws_sdk_glue::{
    error::{DisplayErrorContext, SdkError},
    operation::get_table::GetTableError,
    types as glue,
};
use domain::catalog::{
    Catalog, CatalogError, CatalogTable, Column, SerDeInfo, StorageDescriptor,
};

/// Glue Data Catalog. Calls are unbounded here; callers apply the deadline.
pub struct GlueCatalog {
    client: aws_sdk_glue::Client,
}

impl GlueCatalog {
    pub fn new(client: aws_sdk_glue::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Catalog for GlueCatalog {
    async fn get_table(&self, database: &str, name: &str) -> Result<CatalogTable, CatalogError> {
        let output = self
            .client
            .get_table()
            .database_name(database)
            .name(name)
            .send()
            .await
            .map_err(|e| get_table_error(e, database, name))?;

        output
            .table()
            .map(table_from_glue)
            .ok_or_else(|| CatalogError::NotFound {
                database: database.to_string(),
                table: name.to_string(),
            })
    }

    async fn update_table(&self, database: &str, table: CatalogTable) -> Result<(), CatalogError> {
        self.client
            .update_table()
            .database_name(database)
            .table_input(table_input(table)?)
            .send()
            .await
            .map_err(|e| CatalogError::Request {
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}

fn get_table_error(error: SdkError<GetTableError>, database: &str, name: &str) -> CatalogError {
    match error.as_service_error() {
        Some(service_error) => lookup_error(service_error, database, name),
        None => CatalogError::Request {
            message: DisplayErrorContext(&error).to_string(),
        },
    }
}

fn lookup_error(error: &GetTableError, database: &str, name: &str) -> CatalogError {
    if error.is_entity_not_found_exception() {
        CatalogError::NotFound {
            database: database.to_string(),
            table: name.to_string(),
        }
    } else {
        CatalogError::Request {
            message: DisplayErrorContext(error).to_string(),
        }
    }
}

fn invalid_input(e: aws_sdk_glue::error::BuildError) -> CatalogError {
    CatalogError::Request {
        message: format!("Invalid table input: {}", e),
    }
}

fn column_from_glue(column: &glue::Column) -> Column {
    Column {
        name: column.name().to_string(),
        column_type: column.r#type().map(str::to_string),
        comment: column.comment().map(str::to_string),
    }
}

fn column_to_glue(column: Column) -> Result<glue::Column, CatalogError> {
    glue::Column::builder()
        .name(column.name)
        .set_type(column.column_type)
        .set_comment(column.comment)
        .build()
        .map_err(invalid_input)
}

fn table_from_glue(table: &glue::Table) -> CatalogTable {
    CatalogTable {
        name: table.name().to_string(),
        description: table.description().map(str::to_string),
        owner: table.owner().map(str::to_string),
        table_type: table.table_type().map(str::to_string),
        retention: table.retention(),
        parameters: table.parameters().cloned().unwrap_or_default(),
        storage_descriptor: table.storage_descriptor().map(|sd| StorageDescriptor {
            columns: sd.columns().iter().map(column_from_glue).collect(),
            location: sd.location().map(str::to_string),
            input_format: sd.input_format().map(str::to_string),
            output_format: sd.output_format().map(str::to_string),
            compressed: sd.compressed(),
            number_of_buckets: sd.number_of_buckets(),
            serde_info: sd.serde_info().map(|serde| SerDeInfo {
                name: serde.name().map(str::to_string),
                serialization_library: serde.serialization_library().map(str::to_string),
                parameters: serde.parameters().cloned().unwrap_or_default(),
            }),
            bucket_columns: sd.bucket_columns().to_vec(),
            parameters: sd.parameters().cloned().unwrap_or_default(),
            stored_as_sub_directories: sd.stored_as_sub_directories(),
        }),
        partition_keys: table.partition_keys().iter().map(column_from_glue).collect(),
    }
}

fn table_input(table: CatalogTable) -> Result<glue::TableInput, CatalogError> {
    let storage_descriptor = match table.storage_descriptor {
        Some(sd) => Some(
            glue::StorageDescriptor::builder()
                .set_columns(Some(
                    sd.columns
                        .into_iter()
                        .map(column_to_glue)
                        .collect::<Result<Vec<_>, _>>()?,
                ))
                .set_location(sd.location)
                .set_input_format(sd.input_format)
                .set_output_format(sd.output_format)
                .compressed(sd.compressed)
                .number_of_buckets(sd.number_of_buckets)
                .set_serde_info(sd.serde_info.map(|serde| {
                    glue::SerDeInfo::builder()
                        .set_name(serde.name)
                        .set_serialization_library(serde.serialization_library)
                        .set_parameters(Some(serde.parameters))
                        .build()
                }))
                .set_bucket_columns(Some(sd.bucket_columns))
                .set_parameters(Some(sd.parameters))
                .stored_as_sub_directories(sd.stored_as_sub_directories)
                .build(),
        ),
        None => None,
    };

    let partition_keys = table
        .partition_keys
        .into_iter()
        .map(column_to_glue)
        .collect::<Result<Vec<_>, _>>()?;

    glue::TableInput::builder()
        .name(table.name)
        .set_description(table.description)
        .set_owner(table.owner)
        .set_table_type(table.table_type)
        .retention(table.retention)
        .set_parameters(Some(table.parameters))
        .set_storage_descriptor(storage_descriptor)
        .set_partition_keys(Some(partition_keys))
        .build()
        .map_err(invalid_input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deadline::DeadlineCatalog;
    use aws_sdk_glue::{
        config::{BehaviorVersion, Credentials, Region},
        types::error::{EntityNotFoundException, InternalServiceException},
    };
    use domain::classification::{parse_event, Reconciler, Status};
    use serde_json::json;
    use std::{
        collections::HashMap,
        time::{Duration, Instant},
    };
    use tokio::{net::TcpListener, task::JoinHandle};

    /// A Glue client whose endpoint accepts connections and never answers.
    async fn stalled_client() -> (aws_sdk_glue::Client, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = aws_sdk_glue::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .endpoint_url(endpoint)
            .build();
        (aws_sdk_glue::Client::from_conf(config), server)
    }

    fn column(name: &str, column_type: &str) -> Column {
        Column {
            name: name.to_string(),
            column_type: Some(column_type.to_string()),
            comment: None,
        }
    }

    #[test]
    fn table_input_keeps_descriptor_and_partitions() {
        let table = CatalogTable {
            name: "r_twitter".to_string(),
            table_type: Some("EXTERNAL_TABLE".to_string()),
            parameters: HashMap::from([("classification".to_string(), "parquet".to_string())]),
            storage_descriptor: Some(StorageDescriptor {
                columns: vec![column("text", "string")],
                location: Some("s3://tweets/r_twitter/processed/".to_string()),
                serde_info: Some(SerDeInfo {
                    serialization_library: Some(
                        "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe".to_string(),
                    ),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            partition_keys: vec![column("year", "smallint"), column("month", "smallint")],
            ..Default::default()
        };

        let input = table_input(table).unwrap();

        assert_eq!(input.name(), "r_twitter");
        assert_eq!(
            input.parameters().and_then(|p| p.get("classification")).map(String::as_str),
            Some("parquet")
        );
        let sd = input.storage_descriptor().unwrap();
        assert_eq!(sd.location(), Some("s3://tweets/r_twitter/processed/"));
        assert_eq!(column_from_glue(&sd.columns()[0]), column("text", "string"));
        let partitions: Vec<Column> = input.partition_keys().iter().map(column_from_glue).collect();
        assert_eq!(partitions, vec![column("year", "smallint"), column("month", "smallint")]);
    }

    #[test]
    fn entity_not_found_maps_to_not_found() {
        let error = GetTableError::EntityNotFoundException(
            EntityNotFoundException::builder()
                .message("Table r_twitter not found")
                .build(),
        );

        assert_eq!(
            lookup_error(&error, "twitter", "r_twitter"),
            CatalogError::NotFound {
                database: "twitter".to_string(),
                table: "r_twitter".to_string(),
            }
        );
    }

    #[test]
    fn other_service_errors_map_to_request() {
        let error = GetTableError::InternalServiceException(
            InternalServiceException::builder()
                .message("internal failure")
                .build(),
        );

        match lookup_error(&error, "twitter", "r_twitter") {
            CatalogError::Request { message } => assert!(message.contains("internal failure")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn stalled_catalog_still_answers_create() {
        let (client, server) = stalled_client().await;
        let glue = GlueCatalog::new(client);
        let catalog = DeadlineCatalog::new(&glue, Duration::from_millis(300));
        let event = parse_event(json!({
            "RequestType": "Create",
            "ResponseURL": "https://example.com/response",
            "StackId": "stack-1",
            "RequestId": "req-1",
            "LogicalResourceId": "TargetTableClassification",
            "ResourceProperties": {
                "TableName": "r_twitter",
                "DatabaseName": "twitter",
                "DataFormat": "parquet"
            }
        }))
        .unwrap();

        let started = Instant::now();
        let response = Reconciler::new(&catalog).handle(&event).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.status, Status::Success);
        assert_eq!(response.physical_resource_id, "twitter-r_twitter");
        assert!(response.reason.unwrap().contains("GetTable timed out"));
        server.abort();
    }
}
