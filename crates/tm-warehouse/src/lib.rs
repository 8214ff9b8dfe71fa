//! tm-warehouse - Warehouse abstraction layer for Tablemill
//!
//! This crate provides the `Warehouse` trait the build engine talks to, the
//! query-job configuration types, and an in-memory emulator used by tests.

pub mod error;
pub mod job;
pub mod memory;
pub mod traits;

pub use error::{WarehouseError, WarehouseResult};
pub use job::{
    ColumnSchema, QueryJobConfig, TableMetadata, TableSchema, WriteDisposition,
};
pub use memory::{MemoryWarehouse, SubmittedJob, TableState};
pub use traits::{QueryJob, Warehouse};
