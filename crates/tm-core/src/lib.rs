//! tm-core - Core library for Tablemill
//!
//! This crate provides the shared types used across all Tablemill components:
//! partial and fully-qualified table names, the name-resolution rules, the
//! model sum type with its factory constructors, and the dependency-recording
//! `NameResolver` used during SQL discovery.

pub mod error;
pub mod model;
pub mod resolver;
pub mod table_name;

pub use error::{CoreError, CoreResult};
pub use model::{
    LayoutHints, Model, ModelKind, ModelRef, PartitionGranularity, TimePartitioning,
};
pub use resolver::NameResolver;
pub use table_name::{NameResolution, NameTransform, TableFullName, TablePartialName};
