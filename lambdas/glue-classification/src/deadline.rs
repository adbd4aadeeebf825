use std::time::Duration;

use async_trait::async_trait;
use domain::catalog::{Catalog, CatalogError, CatalogTable};
use tokio::time::{timeout_at, Instant};

/// Bounds every call of one invocation by a single shared deadline, so a
/// whole read-modify-write cycle never outlives `budget`.
pub struct DeadlineCatalog<'a> {
    inner: &'a dyn Catalog,
    budget: Duration,
    deadline: Instant,
}

impl<'a> DeadlineCatalog<'a> {
    pub fn new(inner: &'a dyn Catalog, budget: Duration) -> Self {
        Self {
            inner,
            budget,
            deadline: Instant::now() + budget,
        }
    }

    fn timed_out(&self, operation: &str) -> CatalogError {
        CatalogError::Request {
            message: format!("{} timed out, catalog budget of {:?} spent", operation, self.budget),
        }
    }
}

#[async_trait]
impl Catalog for DeadlineCatalog<'_> {
    async fn get_table(&self, database: &str, name: &str) -> Result<CatalogTable, CatalogError> {
        timeout_at(self.deadline, self.inner.get_table(database, name))
            .await
            .map_err(|_| self.timed_out("GetTable"))?
    }

    async fn update_table(&self, database: &str, table: CatalogTable) -> Result<(), CatalogError> {
        timeout_at(self.deadline, self.inner.update_table(database, table))
            .await
            .map_err(|_| self.timed_out("UpdateTable"))?
    }
}
