/// Glue column type grammar
pub mod schema;

/// Catalog table descriptors
pub mod table;

use async_trait::async_trait;
use thiserror::Error;

pub use schema::{ColumnType, StructField};
pub use table::{CatalogTable, Column, SerDeInfo, StorageDescriptor};

/// Parameter key holding the storage data format of a table.
pub const CLASSIFICATION_PARAMETER: &str = "classification";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Table {database}.{table} not found")]
    NotFound { database: String, table: String },

    #[error("Catalog request failed: {message}")]
    Request { message: String },
}

/// Metadata registry mapping (database, table) to table descriptors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_table(&self, database: &str, name: &str) -> Result<CatalogTable, CatalogError>;

    async fn update_table(&self, database: &str, table: CatalogTable) -> Result<(), CatalogError>;
}
