mod common;

use common::{MockDriver, MockResult};
use sql_stmt_middleware::prelude::*;

#[test]
fn quote_renders_dialect_literals() {
    let sqlite = MockDriver::new(DatabaseType::Sqlite).connect(ConnectionOptions::default());
    let mssql = MockDriver::new(DatabaseType::Mssql).connect(ConnectionOptions::default());

    assert_eq!(sqlite.quote(&RowValues::Text("it's".into())), "'it''s'");
    assert_eq!(sqlite.quote(&RowValues::Int(-3)), "-3");
    assert_eq!(sqlite.quote(&RowValues::Bool(true)), "1");
    assert_eq!(sqlite.quote(&RowValues::Null), "NULL");
    assert_eq!(sqlite.quote(&RowValues::Blob(vec![0x0a, 0xff])), "X'0AFF'");
    assert_eq!(mssql.quote(&RowValues::Blob(vec![0x0a, 0xff])), "0x0AFF");
}

#[test]
fn quote_renders_non_finite_floats_as_null() {
    let conn = MockDriver::new(DatabaseType::Postgres).connect(ConnectionOptions::default());
    assert_eq!(conn.quote(&RowValues::Float(2.5)), "2.5");
    assert_eq!(conn.quote(&RowValues::Float(f64::NAN)), "NULL");
    assert_eq!(conn.quote(&RowValues::Float(f64::INFINITY)), "NULL");
    assert_eq!(conn.quote(&RowValues::Float(f64::NEG_INFINITY)), "NULL");
}

#[test]
fn transactions_pass_through() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new(DatabaseType::Postgres);
    let conn = driver.connect(ConnectionOptions::default());
    conn.begin_transaction()?;
    conn.commit()?;
    conn.begin_transaction()?;
    conn.rollback()?;
    assert_eq!(
        driver.transactions(),
        vec!["begin", "commit", "begin", "rollback"]
    );
    assert_eq!(conn.server_version(), "mock 1.0");
    Ok(())
}

#[test]
fn sequence_value_uses_the_dialect_query() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new(DatabaseType::Postgres).with_results(vec![MockResult::new(
        &["currval"],
        vec![vec![RowValues::Int(12)]],
    )]);
    let conn = driver.connect(ConnectionOptions::default());

    assert_eq!(conn.sequence_value("orders_id_seq")?, Some(RowValues::Int(12)));
    assert_eq!(driver.prepared().last().map(String::as_str), Some("SELECT CURRVAL(?)"));
    assert_eq!(
        driver.executions().last(),
        Some(&vec![RowValues::Text("orders_id_seq".into())])
    );
    Ok(())
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn exec_transactions_and_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        assert_eq!(conn.database_type(), DatabaseType::Sqlite);
        assert!(conn.server_version().starts_with('3'));

        conn.exec("CREATE TABLE t (v TEXT)")?;
        conn.begin_transaction()?;
        conn.exec("INSERT INTO t (v) VALUES ('kept')")?;
        conn.commit()?;
        conn.begin_transaction()?;
        conn.exec("INSERT INTO t (v) VALUES ('dropped')")?;
        conn.rollback()?;

        let mut stmt = conn.query("SELECT v FROM t")?;
        let values = stmt.fetch_all(Some(FetchMode::COLUMN), FetchArgs::default())?;
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_column(), Some(&RowValues::Text("kept".into())));

        let err = conn.commit().unwrap_err();
        assert!(matches!(err, StatementError::Execution(_)));
        Ok(())
    }

    #[test]
    fn quoted_values_round_trip_through_sqlite() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        let text = conn.quote(&RowValues::Text("a'; DROP TABLE x; --".into()));
        let blob = conn.quote(&RowValues::Blob(vec![1, 2, 3]));
        let mut stmt = conn.query(&format!("SELECT {text}, {blob}"))?;
        let row = stmt
            .fetch_with(FetchMode::NUMERIC, FetchArgs::default())?
            .ok_or("expected a row")?;
        assert_eq!(
            row.as_numeric(),
            Some(
                &[
                    RowValues::Text("a'; DROP TABLE x; --".into()),
                    RowValues::Blob(vec![1, 2, 3])
                ][..]
            )
        );
        Ok(())
    }

    #[test]
    fn batch_can_create_then_fill_a_table() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        let changed = conn.exec("CREATE TABLE a (x INTEGER); INSERT INTO a (x) VALUES (1), (2)")?;
        assert_eq!(changed, 2);

        let mut stmt = conn.query("SELECT COUNT(*) FROM a")?;
        assert_eq!(stmt.fetch_column(0)?, Some(RowValues::Int(2)));
        Ok(())
    }

    #[test]
    fn bad_later_statement_in_batch_fails_at_execute() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        let mut stmt = conn.prepare("SELECT 1; SELEC 2")?;
        let err = stmt.execute().unwrap_err();
        assert!(matches!(err, StatementError::Execution(_)));
        Ok(())
    }

    #[test]
    fn sqlite_has_no_sequences() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        let err = conn.sequence_value("anything").unwrap_err();
        assert!(matches!(err, StatementError::Unimplemented(_)));
        Ok(())
    }

    #[test]
    fn file_database_from_json_options() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("app.db");
        let json = serde_json::json!({
            "db_path": path.to_string_lossy(),
            "connection": { "default_fetch_mode": "num" }
        })
        .to_string();

        let opts = SqliteOptions::from_json(&json)?;
        assert!(opts.wal);
        let conn = opts.clone().open()?;
        let mut mode = conn.query("PRAGMA journal_mode")?;
        assert_eq!(mode.fetch_column(0)?, Some(RowValues::Text("wal".into())));

        conn.exec("CREATE TABLE t (id INTEGER PRIMARY KEY)")?;
        conn.exec("INSERT INTO t (id) VALUES (1)")?;
        drop(mode);
        drop(conn);

        let reopened = opts.open()?;
        let mut stmt = reopened.query("SELECT id FROM t")?;
        assert!(matches!(stmt.fetch()?, Some(FetchedRow::Numeric(_))));
        Ok(())
    }
}
