use super::*;
use crate::job::ColumnSchema;

fn name(table: &str) -> TableFullName {
    TableFullName::new("local-test-project", "test_dataset", table)
}

fn truncate_job(table: &str, query: &str) -> QueryJobConfig {
    QueryJobConfig {
        query: query.into(),
        destination: Some(name(table)),
        write_disposition: Some(WriteDisposition::Truncate),
        clustering: None,
        time_partitioning: None,
        labels: Default::default(),
    }
}

#[tokio::test]
async fn test_dataset_lifecycle() {
    let wh = MemoryWarehouse::new();
    assert!(!wh.dataset_exists("p", "d").await.unwrap());
    wh.create_dataset("p", "d").await.unwrap();
    assert!(wh.dataset_exists("p", "d").await.unwrap());
}

#[tokio::test]
async fn test_destination_job_requires_dataset() {
    let wh = MemoryWarehouse::new();
    let err = wh.submit_query_job(truncate_job("t", "select 1")).await.unwrap_err();
    assert!(matches!(err, WarehouseError::DatasetNotFound { .. }));
    assert_eq!(wh.job_count(), 0);
}

#[tokio::test]
async fn test_truncate_replaces_contents() {
    let wh = MemoryWarehouse::new();
    wh.create_dataset("local-test-project", "test_dataset").await.unwrap();

    wh.submit_query_job(truncate_job("t", "select 1"))
        .await
        .unwrap()
        .await_result()
        .await
        .unwrap();
    wh.submit_query_job(truncate_job("t", "select 2"))
        .await
        .unwrap()
        .await_result()
        .await
        .unwrap();

    let state = wh.table_state(&name("t")).unwrap();
    assert_eq!(state.materializations, vec!["select 2"]);
}

#[tokio::test]
async fn test_append_accumulates() {
    let wh = MemoryWarehouse::new();
    wh.create_dataset("local-test-project", "test_dataset").await.unwrap();

    let mut job = truncate_job("t", "select 1");
    wh.submit_query_job(job.clone()).await.unwrap();
    job.query = "select 2".into();
    job.write_disposition = Some(WriteDisposition::Append);
    wh.submit_query_job(job).await.unwrap();

    let state = wh.table_state(&name("t")).unwrap();
    assert_eq!(state.materializations, vec!["select 1", "select 2"]);
}

#[tokio::test]
async fn test_registered_schema_attaches_on_creation() {
    let table = name("daily_temps");
    let schema = TableSchema::new(vec![
        ColumnSchema::new("record_date", "DATE"),
        ColumnSchema::new("temp_c", "FLOAT"),
    ]);
    let wh = MemoryWarehouse::new().with_table_schema(&table, schema);
    wh.create_dataset("local-test-project", "test_dataset").await.unwrap();

    assert!(wh.table_metadata(&table).await.unwrap().is_none());

    wh.submit_query_job(truncate_job("daily_temps", "select 1")).await.unwrap();

    let metadata = wh.table_metadata(&table).await.unwrap().unwrap();
    assert_eq!(metadata.schema.column_names(), vec!["record_date", "temp_c"]);
}

#[tokio::test]
async fn test_failure_injection_leaves_table_untouched() {
    let wh = MemoryWarehouse::new();
    wh.create_dataset("local-test-project", "test_dataset").await.unwrap();
    wh.fail_queries_containing("boom");

    let mut job = wh
        .submit_query_job(truncate_job("t", "select boom"))
        .await
        .unwrap();
    let err = job.await_result().await.unwrap_err();
    assert!(matches!(err, WarehouseError::JobFailed { .. }));

    // Submitted (and logged), but never materialized.
    assert_eq!(wh.job_count(), 1);
    assert!(wh.table_state(&name("t")).is_none());
}

#[tokio::test]
async fn test_statement_job_creates_no_table() {
    let wh = MemoryWarehouse::new();
    let mut job = wh
        .submit_query_job(QueryJobConfig::statement("MERGE INTO x USING ..."))
        .await
        .unwrap();
    job.await_result().await.unwrap();

    assert_eq!(wh.job_count(), 1);
    assert!(!wh.table_exists(&name("x")).await.unwrap());
}
