//! Model representation
//!
//! A model describes one warehouse table: its (partial) name, its build
//! strategy, and the closure(s) that produce its SQL. The three strategies
//! are a tagged union so that "external models carry no SQL producer" is
//! enforced by construction rather than convention.

use crate::resolver::NameResolver;
use crate::table_name::TablePartialName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared handle to a model.
///
/// Model identity is pointer identity: two handles refer to "the same model"
/// only when they point at the same allocation (`Arc::ptr_eq`). Two distinct
/// instances that resolve to the same table name are a naming conflict, even
/// if their content is identical.
pub type ModelRef = Arc<Model>;

/// Closure producing the SQL for a full-refresh build.
pub type SqlFn = Box<dyn Fn(&NameResolver) -> String + Send + Sync>;

/// Closure producing the SQL for an incremental merge. Receives the target
/// table's current column names so the merge can enumerate what to update.
pub type IncrementalSqlFn = Box<dyn Fn(&NameResolver, &[String]) -> String + Send + Sync>;

/// Time-based partitioning directive for a materialized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePartitioning {
    /// Column to partition on; `None` partitions on ingestion time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Partition granularity
    #[serde(rename = "type")]
    pub granularity: PartitionGranularity,
}

impl TimePartitioning {
    /// Day-granularity partitioning on the given column.
    pub fn by_day(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            granularity: PartitionGranularity::Day,
        }
    }
}

/// Partition granularity, serialized in the warehouse's upper-case form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartitionGranularity {
    Hour,
    Day,
    Month,
    Year,
}

/// Optional physical-layout hints for a materialized table.
#[derive(Debug, Clone, Default)]
pub struct LayoutHints {
    /// Ordered clustering columns (non-empty when present)
    pub cluster_by: Option<Vec<String>>,

    /// Time-partitioning directive
    pub time_partitioning: Option<TimePartitioning>,
}

/// Build strategy and the SQL producer(s) that go with it.
pub enum ModelKind {
    /// Truncate-and-replace the whole table from one query
    FullRefresh { sql: SqlFn },

    /// Merge new/changed rows into an existing table. `sql_full` is used
    /// when the table does not exist yet; `sql_incremental` when it does.
    Incremental {
        sql_full: SqlFn,
        sql_incremental: IncrementalSqlFn,
    },

    /// A table managed outside Tablemill; referenced, never built
    External,
}

impl fmt::Debug for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::FullRefresh { .. } => f.write_str("FullRefresh"),
            ModelKind::Incremental { .. } => f.write_str("Incremental"),
            ModelKind::External => f.write_str("External"),
        }
    }
}

/// A declarative description of one warehouse table.
pub struct Model {
    name: TablePartialName,
    kind: ModelKind,
    layout: LayoutHints,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Model {
    /// A full-refresh model: `sql` produces the single query whose result
    /// replaces the table entirely.
    pub fn full_refresh(
        name: impl Into<TablePartialName>,
        layout: LayoutHints,
        sql: impl Fn(&NameResolver) -> String + Send + Sync + 'static,
    ) -> ModelRef {
        debug_assert_cluster_by(&layout);
        Arc::new(Self {
            name: name.into(),
            kind: ModelKind::FullRefresh { sql: Box::new(sql) },
            layout,
        })
    }

    /// An incremental model built from one `sql(resolver, incremental)`
    /// closure and a merge key.
    ///
    /// When the target table does not exist yet the closure is invoked with
    /// `incremental = false` and the result replaces the table. Once the
    /// table exists, the closure is invoked with `incremental = true` and
    /// its result is wrapped in a generated `MERGE` statement that upserts
    /// on `merge_key`, updating exactly the columns the table currently has.
    pub fn incremental(
        name: impl Into<TablePartialName>,
        layout: LayoutHints,
        merge_key: Vec<String>,
        sql: impl Fn(&NameResolver, bool) -> String + Send + Sync + 'static,
    ) -> ModelRef {
        debug_assert!(!merge_key.is_empty(), "merge_key must not be empty");
        debug_assert_cluster_by(&layout);

        let sql = Arc::new(sql);
        let sql_full: SqlFn = {
            let sql = Arc::clone(&sql);
            Box::new(move |resolver| sql(resolver, false))
        };
        let sql_incremental: IncrementalSqlFn = Box::new(move |resolver, columns| {
            merge_statement(resolver, &merge_key, columns, &sql(resolver, true))
        });

        Arc::new(Self {
            name: name.into(),
            kind: ModelKind::Incremental {
                sql_full,
                sql_incremental,
            },
            layout,
        })
    }

    /// An incremental model with explicit full and incremental SQL producers,
    /// for callers that want to write the merge statement themselves.
    pub fn incremental_with(
        name: impl Into<TablePartialName>,
        layout: LayoutHints,
        sql_full: impl Fn(&NameResolver) -> String + Send + Sync + 'static,
        sql_incremental: impl Fn(&NameResolver, &[String]) -> String + Send + Sync + 'static,
    ) -> ModelRef {
        debug_assert_cluster_by(&layout);
        Arc::new(Self {
            name: name.into(),
            kind: ModelKind::Incremental {
                sql_full: Box::new(sql_full),
                sql_incremental: Box::new(sql_incremental),
            },
            layout,
        })
    }

    /// An external model: a table assumed to already exist. Never built,
    /// only resolved to a name.
    pub fn external(name: impl Into<TablePartialName>) -> ModelRef {
        Arc::new(Self {
            name: name.into(),
            kind: ModelKind::External,
            layout: LayoutHints::default(),
        })
    }

    /// The caller-supplied (partial) table name.
    pub fn name(&self) -> &TablePartialName {
        &self.name
    }

    /// The build strategy and its SQL producer(s).
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    /// Ordered clustering columns, when declared.
    pub fn cluster_by(&self) -> Option<&[String]> {
        self.layout.cluster_by.as_deref()
    }

    /// Time-partitioning directive, when declared.
    pub fn time_partitioning(&self) -> Option<&TimePartitioning> {
        self.layout.time_partitioning.as_ref()
    }
}

fn debug_assert_cluster_by(layout: &LayoutHints) {
    if let Some(columns) = &layout.cluster_by {
        debug_assert!(!columns.is_empty(), "cluster_by must not be empty");
    }
}

/// Generate the upsert statement for an incremental model: merge the inner
/// query into the model's own table on the merge key, updating every column
/// the table currently has.
fn merge_statement(
    resolver: &NameResolver,
    merge_key: &[String],
    columns: &[String],
    inner_sql: &str,
) -> String {
    let on_clause = merge_key
        .iter()
        .map(|c| format!("MERGE_DEST.`{c}` = MERGE_SOURCE.`{c}`"))
        .collect::<Vec<_>>()
        .join(" AND ");
    let update_set = columns
        .iter()
        .map(|c| format!("MERGE_DEST.`{c}` = MERGE_SOURCE.`{c}`"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "MERGE INTO {self_name} AS MERGE_DEST USING (\n\
         {inner_sql}\n\
         ) AS MERGE_SOURCE\n\
         ON {on_clause}\n\
         WHEN MATCHED THEN UPDATE SET {update_set}\n\
         WHEN NOT MATCHED THEN INSERT ROW\n",
        self_name = resolver.self_name(),
    )
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
