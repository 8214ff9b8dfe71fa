//! Execution stage: dataset creation and query-job submission.
//!
//! Only ever invoked during the real run, for non-external models, strictly
//! after all of the model's dependencies have themselves been executed.

use crate::builder::BuilderConfig;
use crate::error::{BuildError, BuildResult};
use tm_core::{Model, TableFullName};
use tm_warehouse::{QueryJobConfig, Warehouse, WarehouseError, WriteDisposition};

/// How a model is materialized in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Truncate-and-replace the target table from the query result
    FullRefresh,

    /// Execute a free-standing merge statement against the existing table
    Incremental,
}

/// Materialize one model: ensure the destination dataset exists, submit the
/// query job with the write semantics for `mode`, and await completion.
pub(crate) async fn execute(
    warehouse: &dyn Warehouse,
    config: &BuilderConfig,
    name: &TableFullName,
    sql: &str,
    mode: BuildMode,
    model: &Model,
) -> BuildResult<()> {
    ensure_dataset(warehouse, name).await?;

    let job_config = match mode {
        BuildMode::FullRefresh => {
            log::info!("Starting job to (re)create table '{name}'.");
            QueryJobConfig {
                query: sql.to_string(),
                destination: Some(name.clone()),
                write_disposition: Some(WriteDisposition::Truncate),
                clustering: model.cluster_by().map(<[String]>::to_vec),
                time_partitioning: model.time_partitioning().cloned(),
                labels: config.job_labels.clone(),
            }
        }
        BuildMode::Incremental => {
            log::info!("Starting job to merge into table '{name}'.");
            // The merge statement names its own target; destination, write
            // disposition, and layout directives don't apply.
            let mut job = QueryJobConfig::statement(sql);
            job.labels = config.job_labels.clone();
            job
        }
    };
    log::debug!("{sql}");

    let mut job = warehouse
        .submit_query_job(job_config)
        .await
        .map_err(|source| execution_error(name, source))?;
    log::debug!("Submitted job '{}' for table '{name}'.", job.id());

    job.await_result()
        .await
        .map_err(|source| execution_error(name, source))?;
    log::info!("Finished job for table '{name}'.");

    Ok(())
}

/// Create the destination dataset when absent. Safe to call repeatedly.
async fn ensure_dataset(warehouse: &dyn Warehouse, name: &TableFullName) -> BuildResult<()> {
    log::debug!("Checking if dataset '{}' exists.", name.dataset);
    let exists = warehouse
        .dataset_exists(&name.project, &name.dataset)
        .await
        .map_err(|source| execution_error(name, source))?;

    if exists {
        log::debug!("Dataset '{}' already exists.", name.dataset);
    } else {
        log::debug!("Dataset '{}' doesn't exist yet. Creating it.", name.dataset);
        warehouse
            .create_dataset(&name.project, &name.dataset)
            .await
            .map_err(|source| execution_error(name, source))?;
    }

    Ok(())
}

fn execution_error(name: &TableFullName, source: WarehouseError) -> BuildError {
    BuildError::Execution {
        table: name.to_string(),
        source,
    }
}
