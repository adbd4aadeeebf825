use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::CLASSIFICATION_PARAMETER;

/// Catalog-side view of a table, as read from and written back to the registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct CatalogTable {
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub table_type: Option<String>,
    pub retention: i32,
    pub parameters: HashMap<String, String>,
    pub storage_descriptor: Option<StorageDescriptor>,
    pub partition_keys: Vec<Column>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct StorageDescriptor {
    pub columns: Vec<Column>,
    pub location: Option<String>,
    pub input_format: Option<String>,
    pub output_format: Option<String>,
    pub compressed: bool,
    pub number_of_buckets: i32,
    pub serde_info: Option<SerDeInfo>,
    pub bucket_columns: Vec<String>,
    pub parameters: HashMap<String, String>,
    pub stored_as_sub_directories: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SerDeInfo {
    pub name: Option<String>,
    pub serialization_library: Option<String>,
    pub parameters: HashMap<String, String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: Option<String>,
    pub comment: Option<String>,
}

impl CatalogTable {
    pub fn classification(&self) -> Option<&str> {
        self.parameters
            .get(CLASSIFICATION_PARAMETER)
            .map(String::as_str)
    }

    /// Copy of this table tagged with `data_format`. Everything else is left as read.
    pub fn with_classification(&self, data_format: &str) -> Self {
        let mut table = self.clone();
        table
            .parameters
            .insert(CLASSIFICATION_PARAMETER.to_string(), data_format.to_string());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CatalogTable {
        CatalogTable {
            name: "r_twitter".to_string(),
            table_type: Some("EXTERNAL_TABLE".to_string()),
            parameters: HashMap::from([("has_encrypted_data".to_string(), "true".to_string())]),
            storage_descriptor: Some(StorageDescriptor {
                columns: vec![Column {
                    name: "text".to_string(),
                    column_type: Some("string".to_string()),
                    comment: None,
                }],
                location: Some("s3://bucket/r_twitter/processed/".to_string()),
                ..Default::default()
            }),
            partition_keys: vec![Column {
                name: "year".to_string(),
                column_type: Some("smallint".to_string()),
                comment: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn classification_preserves_other_fields() {
        let original = table();
        let classified = original.with_classification("parquet");

        assert_eq!(classified.classification(), Some("parquet"));
        assert_eq!(
            classified.parameters.get("has_encrypted_data").map(String::as_str),
            Some("true")
        );
        assert_eq!(classified.storage_descriptor, original.storage_descriptor);
        assert_eq!(classified.partition_keys, original.partition_keys);
        assert_eq!(classified.name, original.name);
    }

    #[test]
    fn classification_is_idempotent() {
        let once = table().with_classification("parquet");
        let twice = once.with_classification("parquet");

        assert_eq!(once, twice);
    }

    #[test]
    fn classification_overwrites_previous_value() {
        let table = table().with_classification("json").with_classification("parquet");

        assert_eq!(table.classification(), Some("parquet"));
        assert_eq!(table.parameters.len(), 2);
    }
}
