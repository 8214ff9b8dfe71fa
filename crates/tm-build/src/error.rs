//! Error types for tm-build

use thiserror::Error;
use tm_core::CoreError;
use tm_warehouse::WarehouseError;

/// Build engine errors.
///
/// Every error aborts the whole run and propagates unchanged to the
/// top-level [`build`](crate::ModelBuilder::build) call; there is no
/// partial-success return value.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Name resolution failed (see the N-codes in tm-core)
    #[error(transparent)]
    Configuration(#[from] CoreError),

    /// B001: A build is already in progress on this builder instance
    #[error("[B001] Can't build until the previous build has finished")]
    BuildInProgress,

    /// B002: Two distinct models resolved to the same table name in one run
    #[error("[B002] Different models can't use the same name: '{name}'")]
    NameConflict { name: String },

    /// B003: A model transitively depends on itself
    #[error("[B003] Circular dependency detected: {path}")]
    CircularDependency { path: String },

    /// B004: A warehouse operation failed while building a table
    #[error("[B004] Build of table '{table}' failed: {source}")]
    Execution {
        table: String,
        #[source]
        source: WarehouseError,
    },
}

/// Result type alias for BuildError
pub type BuildResult<T> = Result<T, BuildError>;
