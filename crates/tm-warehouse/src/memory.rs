//! In-memory warehouse emulator.
//!
//! Stands in for the real warehouse in tests: it tracks datasets, tables,
//! and every submitted job, and applies truncate/append write semantics to
//! table state. Table "contents" are modeled as the ordered list of query
//! texts materialized into the table, which is enough to assert build order,
//! truncate-and-replace semantics, and idempotence without a SQL engine.
//!
//! Schemas can be pre-registered per table (attached when the table is first
//! created) so that a later incremental build can fetch column names, the
//! same way the emulator-backed test harness for the original service seeded
//! table schemas.

use crate::error::{WarehouseError, WarehouseResult};
use crate::job::{QueryJobConfig, TableMetadata, TableSchema, WriteDisposition};
use crate::traits::{QueryJob, Warehouse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tm_core::TableFullName;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// State of one emulated table.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    /// Schema attached when the table was created, if any was registered
    pub schema: Option<TableSchema>,

    /// Query texts materialized into the table, oldest first. A truncate
    /// job replaces the whole list; an append job pushes.
    pub materializations: Vec<String>,
}

/// A job as recorded by the emulator, in submission order.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub config: QueryJobConfig,
}

#[derive(Default)]
struct Inner {
    datasets: BTreeSet<(String, String)>,
    tables: HashMap<String, TableState>,
    registered_schemas: HashMap<String, TableSchema>,
    jobs: Vec<SubmittedJob>,
    fail_patterns: Vec<String>,
    gate: Option<Arc<Semaphore>>,
}

/// In-memory [`Warehouse`] implementation.
#[derive(Default)]
pub struct MemoryWarehouse {
    inner: Mutex<Inner>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the schema a table will get when it is first created.
    pub fn with_table_schema(self, name: &TableFullName, schema: TableSchema) -> Self {
        self.inner
            .lock()
            .unwrap()
            .registered_schemas
            .insert(name.to_string(), schema);
        self
    }

    /// Create a table (and its dataset) directly, bypassing job submission.
    pub fn create_table(&self, name: &TableFullName, schema: TableSchema) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .datasets
            .insert((name.project.clone(), name.dataset.clone()));
        inner.tables.insert(
            name.to_string(),
            TableState {
                schema: Some(schema),
                materializations: Vec::new(),
            },
        );
    }

    /// Make every job whose query contains `pattern` fail at
    /// [`QueryJob::await_result`].
    pub fn fail_queries_containing(&self, pattern: impl Into<String>) {
        self.inner.lock().unwrap().fail_patterns.push(pattern.into());
    }

    /// Hold every subsequent job's `await_result` until a permit is added to
    /// `gate`. Used by tests to keep a build in flight.
    pub fn set_job_gate(&self, gate: Arc<Semaphore>) {
        self.inner.lock().unwrap().gate = Some(gate);
    }

    /// All submitted jobs, in submission order.
    pub fn submitted_jobs(&self) -> Vec<SubmittedJob> {
        self.inner.lock().unwrap().jobs.clone()
    }

    /// Number of submitted jobs so far.
    pub fn job_count(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }

    /// Current state of a table, if it exists.
    pub fn table_state(&self, name: &TableFullName) -> Option<TableState> {
        self.inner.lock().unwrap().tables.get(&name.to_string()).cloned()
    }

    /// Whether a dataset exists (sync helper for tests).
    pub fn has_dataset(&self, project: &str, dataset: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .datasets
            .contains(&(project.to_string(), dataset.to_string()))
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn dataset_exists(&self, project: &str, dataset: &str) -> WarehouseResult<bool> {
        Ok(self.has_dataset(project, dataset))
    }

    async fn create_dataset(&self, project: &str, dataset: &str) -> WarehouseResult<()> {
        self.inner
            .lock()
            .unwrap()
            .datasets
            .insert((project.to_string(), dataset.to_string()));
        Ok(())
    }

    async fn table_exists(&self, name: &TableFullName) -> WarehouseResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tables
            .contains_key(&name.to_string()))
    }

    async fn table_metadata(
        &self,
        name: &TableFullName,
    ) -> WarehouseResult<Option<TableMetadata>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.tables.get(&name.to_string()).map(|state| TableMetadata {
            schema: state.schema.clone().unwrap_or_default(),
        }))
    }

    async fn submit_query_job(
        &self,
        config: QueryJobConfig,
    ) -> WarehouseResult<Box<dyn QueryJob>> {
        let mut inner = self.inner.lock().unwrap();

        // Destination jobs require the destination dataset to exist, like
        // the real service.
        if let Some(dest) = &config.destination {
            if !inner
                .datasets
                .contains(&(dest.project.clone(), dest.dataset.clone()))
            {
                return Err(WarehouseError::DatasetNotFound {
                    project: dest.project.clone(),
                    dataset: dest.dataset.clone(),
                });
            }
        }

        let id = Uuid::new_v4().to_string();
        let failure = inner
            .fail_patterns
            .iter()
            .find(|pattern| config.query.contains(pattern.as_str()))
            .map(|pattern| WarehouseError::JobFailed {
                id: id.clone(),
                message: format!("injected failure for query containing '{pattern}'"),
            });

        inner.jobs.push(SubmittedJob {
            id: id.clone(),
            created_at: Utc::now(),
            config: config.clone(),
        });

        // Failing jobs leave table state untouched.
        if failure.is_none() {
            if let Some(dest) = &config.destination {
                let key = dest.to_string();
                let registered = inner.registered_schemas.get(&key).cloned();
                let table = inner.tables.entry(key).or_default();
                if table.schema.is_none() {
                    table.schema = registered;
                }
                match config.write_disposition {
                    Some(WriteDisposition::Append) => {
                        table.materializations.push(config.query.clone());
                    }
                    // Truncate is the default for destination jobs here.
                    _ => table.materializations = vec![config.query.clone()],
                }
            }
        }

        let gate = inner.gate.clone();
        Ok(Box::new(MemoryJob {
            id,
            outcome: failure,
            gate,
        }))
    }
}

#[derive(Debug)]
struct MemoryJob {
    id: String,
    outcome: Option<WarehouseError>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl QueryJob for MemoryJob {
    fn id(&self) -> &str {
        &self.id
    }

    async fn await_result(&mut self) -> WarehouseResult<()> {
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| WarehouseError::Backend("job gate closed".into()))?;
            permit.forget();
        }
        match self.outcome.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
