//! tm-build - Tablemill build engine
//!
//! Resolves a model's transitive dependencies by executing its SQL closures,
//! validates the discovered graph (name conflicts, cycles) in a dry run, and
//! then materializes every table bottom-up through the warehouse.

pub mod builder;
pub mod error;
pub mod execute;

pub use builder::{BuilderConfig, ModelBuilder};
pub use error::{BuildError, BuildResult};
pub use execute::BuildMode;
