use std::fs;
use std::path::{Path, PathBuf};

use tabula_core::control::DEFAULT_QUERY_LIMIT;
use tabula_core::{ControlError, DuckDbEngine, EngineConfig, TabulaControlPlane};
use tempfile::TempDir;

fn build_control_plane() -> TabulaControlPlane {
    TabulaControlPlane::new(DuckDbEngine::new(EngineConfig::default()))
}

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write csv fixture");
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

const PEOPLE_CSV: &str = "id,name\n1,ada\n2,grace\n3,edsger\n";

#[tokio::test]
async fn import_then_describe_agree_on_shape() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let control = build_control_plane();

    let report = control
        .import_csv(path_str(&csv), "t")
        .await
        .expect("import should succeed");
    assert!(report.success);
    assert_eq!(report.table_name, "t");
    assert_eq!(report.row_count, 3);
    assert_eq!(report.columns, vec!["id", "name"]);

    let described = control.describe_table("t").await.expect("describe");
    assert_eq!(described.row_count, 3);
    assert_eq!(described.schema.len(), 2);
    assert_eq!(described.sample_data.len(), 3);

    let listed = control.list_tables().await.expect("list");
    assert_eq!(listed.table_count, 1);
    assert_eq!(listed.tables[0].table_name, "t");
    assert_eq!(listed.tables[0].row_count, described.row_count);
}

#[tokio::test]
async fn reimport_replaces_table_contents() {
    let dir = TempDir::new().expect("tempdir");
    let first = write_csv(&dir, "first.csv", PEOPLE_CSV);
    let second = write_csv(&dir, "second.csv", "id,name\n9,alan\n");
    let control = build_control_plane();

    let _ = control.import_csv(path_str(&first), "t").await.expect("first import");
    let report = control
        .import_csv(path_str(&second), "t")
        .await
        .expect("second import");
    assert_eq!(report.row_count, 1);

    let query = control
        .query_data("SELECT name FROM t", DEFAULT_QUERY_LIMIT)
        .await
        .expect("query");
    assert_eq!(query.row_count, 1);
    assert_eq!(query.data[0]["name"], "alan");
}

#[tokio::test]
async fn query_data_enforces_the_limit_ceiling() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let control = build_control_plane();
    let _ = control.import_csv(path_str(&csv), "t").await.expect("import");

    let capped = control
        .query_data("SELECT * FROM t ORDER BY id", 2)
        .await
        .expect("query");
    assert_eq!(capped.row_count, 2);
    assert_eq!(capped.columns, vec!["id", "name"]);

    // An explicit limiting clause wins over the requested ceiling.
    let explicit = control
        .query_data("SELECT * FROM t LIMIT 1", 100)
        .await
        .expect("query");
    assert_eq!(explicit.row_count, 1);
}

#[tokio::test]
async fn query_errors_surface_the_engine_diagnostic() {
    let control = build_control_plane();
    let err = control
        .query_data("SELECT * FROM missing_table", DEFAULT_QUERY_LIMIT)
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::Query(_)));
    assert!(err.to_string().contains("missing_table"));
}

#[tokio::test]
async fn export_then_import_round_trips_shape() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let control = build_control_plane();
    let _ = control.import_csv(path_str(&csv), "t").await.expect("import");

    let out = dir.path().join("exported.csv");
    let exported = control
        .export_query_results("SELECT * FROM t ORDER BY id", path_str(&out))
        .await
        .expect("export");
    assert!(exported.success);
    assert_eq!(exported.row_count, 3);
    assert!(out.is_file());

    let reimported = control
        .import_csv(path_str(&out), "t2")
        .await
        .expect("reimport");
    assert_eq!(reimported.row_count, 3);
    assert_eq!(reimported.columns, vec!["id", "name"]);
}

#[tokio::test]
async fn export_with_bad_query_is_a_query_error() {
    let control = build_control_plane();
    let err = control
        .export_query_results("SELECT * FROM nope", "/tmp/unused.csv")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::Query(_)));
}

#[tokio::test]
async fn export_to_unwritable_path_is_a_write_error() {
    let control = build_control_plane();
    let err = control
        .export_query_results("SELECT 1 AS n", "/definitely/missing/dir/out.csv")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::Write(_)));
}

#[tokio::test]
async fn describe_missing_table_is_not_found() {
    let control = build_control_plane();
    let err = control
        .describe_table("absent")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::NotFound(_)));

    let err = control
        .get_table_stats("absent")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::NotFound(_)));
}

#[tokio::test]
async fn malformed_csv_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    // Ragged row: three fields against a two-column header.
    let csv = write_csv(&dir, "ragged.csv", "id,name\n1,ada\n2,grace,extra\n");
    let control = build_control_plane();

    let err = control
        .import_csv(path_str(&csv), "t")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::Parse(_)));

    // Nothing was created for the failed import.
    let listed = control.list_tables().await.expect("list");
    assert_eq!(listed.table_count, 0);
}

#[tokio::test]
async fn invalid_table_names_are_rejected_before_the_engine() {
    let control = build_control_plane();
    let err = control
        .import_csv("/tmp/whatever.csv", "t; DROP TABLE t")
        .await
        .expect_err("should fail");
    assert!(matches!(err, ControlError::InvalidIdentifier(_)));
}

#[tokio::test]
async fn table_stats_cover_every_column() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let control = build_control_plane();
    let _ = control.import_csv(path_str(&csv), "t").await.expect("import");

    let stats = control.get_table_stats("t").await.expect("stats");
    assert!(stats.success);
    // SUMMARIZE emits one row per column.
    assert_eq!(stats.statistics.len(), 2);
}

#[tokio::test]
async fn table_resource_caps_sample_rows_at_ten() {
    let dir = TempDir::new().expect("tempdir");
    let mut contents = String::from("id\n");
    for n in 0..25 {
        contents.push_str(&format!("{n}\n"));
    }
    let csv = write_csv(&dir, "wide.csv", &contents);
    let control = build_control_plane();
    let _ = control.import_csv(path_str(&csv), "wide").await.expect("import");

    let resource = control.table_resource("wide").await.expect("resource");
    assert_eq!(resource.row_count, 25);
    assert_eq!(resource.sample_data.len(), 10);
}

#[tokio::test]
async fn catalog_names_with_embedded_quotes_list_cleanly() {
    let control = build_control_plane();
    // Arbitrary SQL can create table names the import whitelist never sees;
    // listing must still quote them safely.
    let _ = control
        .query_data("CREATE TABLE \"a\"\"b\" AS SELECT 1 AS x LIMIT 1", 10)
        .await
        .expect("create");

    let listed = control.list_tables().await.expect("list");
    assert_eq!(listed.table_count, 1);
    assert_eq!(listed.tables[0].table_name, "a\"b");
    assert_eq!(listed.tables[0].row_count, 1);
}

#[tokio::test]
async fn reset_connection_drops_in_memory_state() {
    let dir = TempDir::new().expect("tempdir");
    let csv = write_csv(&dir, "people.csv", PEOPLE_CSV);
    let control = build_control_plane();
    let _ = control.import_csv(path_str(&csv), "t").await.expect("import");

    assert!(control.reset_connection().await);
    let listed = control.list_tables().await.expect("list");
    assert_eq!(listed.table_count, 0);
}
