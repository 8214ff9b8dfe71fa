//! Partial and fully-qualified table names, and the rules that resolve one
//! into the other.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A caller-facing table identifier. Only the table component is required;
/// project and dataset are filled in by [`NameResolution::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TablePartialName {
    /// Warehouse project (billing/namespace root), if already known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Dataset the table lives in, if already known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    /// Table name (required)
    pub table: String,
}

impl TablePartialName {
    /// Create a partial name with only the table component set.
    pub fn new(table: impl Into<String>) -> Self {
        let table = table.into();
        debug_assert!(!table.is_empty(), "table name must not be empty");
        Self {
            project: None,
            dataset: None,
            table,
        }
    }

    /// Return a copy with the dataset component set.
    pub fn in_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Return a copy with the project component set.
    pub fn in_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

impl From<&str> for TablePartialName {
    fn from(table: &str) -> Self {
        Self::new(table)
    }
}

impl From<String> for TablePartialName {
    fn from(table: String) -> Self {
        Self::new(table)
    }
}

/// A fully-resolved table identifier.
///
/// The `Display` form, `project.dataset.table`, is the canonical key used
/// for per-run memoization and conflict detection, and is what gets embedded
/// into generated SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableFullName {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableFullName {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableFullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// A caller-supplied rewrite of a partial name, applied before defaults.
pub type NameTransform = Box<dyn Fn(&TablePartialName) -> TablePartialName + Send + Sync>;

/// Rules for turning a [`TablePartialName`] into a [`TableFullName`].
///
/// The optional transform runs first, then any remaining holes are filled
/// from the defaults. Resolution is deterministic: the same partial name and
/// the same rules always produce the same full name.
#[derive(Default)]
pub struct NameResolution {
    /// Project to use when the (transformed) partial name has none
    pub default_project: Option<String>,

    /// Dataset to use when the (transformed) partial name has none
    pub default_dataset: Option<String>,

    /// Rewrite applied to the partial name before defaults
    pub transform: Option<NameTransform>,
}

impl NameResolution {
    /// Resolve a partial name into a full name.
    ///
    /// Fails when no dataset (or no project) can be determined after the
    /// transform and defaults have been applied.
    pub fn resolve(&self, partial: &TablePartialName) -> CoreResult<TableFullName> {
        let partial = match &self.transform {
            Some(transform) => transform(partial),
            None => partial.clone(),
        };

        if partial.table.is_empty() {
            return Err(CoreError::EmptyName {
                context: "table name".into(),
            });
        }

        let dataset = partial
            .dataset
            .or_else(|| self.default_dataset.clone())
            .ok_or_else(|| CoreError::NoDataset {
                table: partial.table.clone(),
            })?;

        let project = partial
            .project
            .or_else(|| self.default_project.clone())
            .ok_or_else(|| CoreError::NoProject {
                table: partial.table.clone(),
            })?;

        Ok(TableFullName {
            project,
            dataset,
            table: partial.table,
        })
    }
}

// Holds a boxed closure, so Debug is written by hand and only reports
// whether a transform is installed.
impl fmt::Debug for NameResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameResolution")
            .field("default_project", &self.default_project)
            .field("default_dataset", &self.default_dataset)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
