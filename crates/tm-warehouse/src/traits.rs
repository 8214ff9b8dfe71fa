//! Warehouse trait definition

use crate::error::WarehouseResult;
use crate::job::{QueryJobConfig, TableMetadata};
use async_trait::async_trait;
use tm_core::TableFullName;

/// Warehouse abstraction for Tablemill.
///
/// The build engine only ever talks to the warehouse through this trait:
/// dataset existence and creation, table metadata, and query-job submission.
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Check whether a dataset exists.
    async fn dataset_exists(&self, project: &str, dataset: &str) -> WarehouseResult<bool>;

    /// Create a dataset. Callers check existence first; creating an existing
    /// dataset is not an error.
    async fn create_dataset(&self, project: &str, dataset: &str) -> WarehouseResult<()>;

    /// Check whether a table exists.
    async fn table_exists(&self, name: &TableFullName) -> WarehouseResult<bool>;

    /// Fetch a table's current metadata, or `None` if the table does not
    /// exist.
    async fn table_metadata(&self, name: &TableFullName)
        -> WarehouseResult<Option<TableMetadata>>;

    /// Submit a query job, returning a handle to await its completion.
    async fn submit_query_job(&self, config: QueryJobConfig)
        -> WarehouseResult<Box<dyn QueryJob>>;
}

/// Handle to a submitted query job.
#[async_trait]
pub trait QueryJob: Send + std::fmt::Debug {
    /// Warehouse-assigned job id.
    fn id(&self) -> &str;

    /// Wait for the job to complete, surfacing any job failure.
    async fn await_result(&mut self) -> WarehouseResult<()>;
}
