//! Error types for tm-warehouse

use thiserror::Error;

/// Warehouse operation errors
#[derive(Error, Debug)]
pub enum WarehouseError {
    /// Dataset not found (W001)
    #[error("[W001] Dataset not found: {project}.{dataset}")]
    DatasetNotFound { project: String, dataset: String },

    /// Table not found (W002)
    #[error("[W002] Table not found: {name}")]
    TableNotFound { name: String },

    /// Query job failed (W003)
    #[error("[W003] Query job '{id}' failed: {message}")]
    JobFailed { id: String, message: String },

    /// Backend/transport error (W004)
    #[error("[W004] Warehouse backend error: {0}")]
    Backend(String),
}

/// Result type alias for WarehouseError
pub type WarehouseResult<T> = Result<T, WarehouseError>;
