//! Error types for tm-core

use thiserror::Error;

/// Core error type for Tablemill
#[derive(Error, Debug)]
pub enum CoreError {
    /// N001: No dataset could be determined for a table name
    #[error("[N001] No dataset resolved for table '{table}'. Configure a default dataset or a name transform.")]
    NoDataset { table: String },

    /// N002: No project could be determined for a table name
    #[error("[N002] No project resolved for table '{table}'. Configure a default project or a name transform.")]
    NoProject { table: String },

    /// N003: Empty name component
    #[error("[N003] Empty {context}")]
    EmptyName { context: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
