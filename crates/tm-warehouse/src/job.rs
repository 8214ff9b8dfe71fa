//! Query-job configuration and table-metadata types.
//!
//! These mirror the shape of a cloud warehouse query-job request: free-form
//! SQL plus optional destination, write disposition, and physical-layout
//! directives. The SQL text itself is opaque to Tablemill.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tm_core::{TableFullName, TimePartitioning};

/// How a destination-table job treats existing contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteDisposition {
    /// Truncate and replace the destination table
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,

    /// Append to the destination table
    #[serde(rename = "WRITE_APPEND")]
    Append,
}

/// One query-job request.
///
/// A full-refresh build sets `destination`, `write_disposition`, and the
/// layout directives. An incremental build submits only the merge statement
/// text; the statement itself names its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryJobConfig {
    /// SQL to execute (opaque)
    pub query: String,

    /// Destination table, for jobs that write a query result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<TableFullName>,

    /// Write semantics for the destination table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_disposition: Option<WriteDisposition>,

    /// Ordered clustering columns for the destination table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering: Option<Vec<String>>,

    /// Time-partitioning directive for the destination table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_partitioning: Option<TimePartitioning>,

    /// Labels attached for cost attribution, passed through verbatim
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl QueryJobConfig {
    /// A job carrying only free-standing SQL (no destination).
    pub fn statement(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            destination: None,
            write_disposition: None,
            clustering: None,
            time_partitioning: None,
            labels: BTreeMap::new(),
        }
    }
}

/// A single column in a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered column schema of a table, as reported by the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Current metadata of an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub schema: TableSchema,
}
