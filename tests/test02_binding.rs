mod common;

use std::collections::{BTreeMap, HashMap};

use common::MockDriver;
use sql_stmt_middleware::params::{BindTarget, Encoding};
use sql_stmt_middleware::prelude::*;

#[test]
fn value_binding_snapshots_and_param_binding_reads_late() -> Result<(), Box<dyn std::error::Error>>
{
    let driver = MockDriver::new(DatabaseType::Sqlite);
    let conn = driver.connect(ConnectionOptions::default());

    let v = ParamCell::new(10);
    let mut by_value = conn.prepare("SELECT ?")?;
    by_value.bind_value(1, v.get(), ParamType::Integer);
    let mut by_ref = conn.prepare("SELECT ?")?;
    by_ref.bind_param(1, v.clone(), ParamType::Integer, None);

    v.set(20);
    by_value.execute()?;
    by_ref.execute()?;
    assert_eq!(
        driver.executions(),
        vec![vec![RowValues::Int(10)], vec![RowValues::Int(20)]]
    );
    Ok(())
}

#[test]
fn last_assignment_before_execute_wins() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new(DatabaseType::Sqlite);
    let conn = driver.connect(ConnectionOptions::default());

    let name = ParamCell::new("a");
    let mut stmt = conn.prepare("SELECT ?")?;
    stmt.bind_param(1, name.clone(), ParamType::Str, Some(16));
    name.set("b");
    name.set("c");
    stmt.execute()?;
    name.set("d");
    stmt.execute()?;
    assert_eq!(
        driver.executions(),
        vec![
            vec![RowValues::Text("c".into())],
            vec![RowValues::Text("d".into())]
        ]
    );
    Ok(())
}

#[test]
fn descriptors_carry_binary_and_large_object_encodings() -> Result<(), Box<dyn std::error::Error>>
{
    let driver = MockDriver::new(DatabaseType::Mssql);
    let conn = driver.connect(ConnectionOptions::default());

    let mut stmt = conn.prepare("UPDATE t SET a = ?, b = ?, c = :c")?;
    stmt.bind_value(1, vec![1u8, 2], ParamType::Binary);
    stmt.bind_value(2, vec![3u8], ParamType::LargeObject);
    stmt.bind_value(":c", "x", ParamType::Str);
    stmt.execute()?;

    let descriptors = driver.last_descriptors();
    assert_eq!(descriptors.len(), 3);
    assert!(matches!(descriptors[0], BindingDescriptor::Binary { .. }));
    assert_eq!(descriptors[0].encoding(), Some(Encoding::Binary));
    assert!(matches!(descriptors[1], BindingDescriptor::LargeObject { .. }));
    assert_eq!(descriptors[1].encoding(), Some(Encoding::Stream));
    assert_eq!(descriptors[2].target(), &BindTarget::Name(":c".into()));
    assert_eq!(descriptors[2].encoding(), None);
    Ok(())
}

#[test]
fn execute_with_binds_positional_and_named_values() -> Result<(), Box<dyn std::error::Error>> {
    let driver = MockDriver::new(DatabaseType::Sqlite);
    let conn = driver.connect(ConnectionOptions::default());

    let mut stmt = conn.prepare("SELECT ?, ?")?;
    stmt.execute_with([RowValues::Int(1), RowValues::Text("two".into())])?;

    let mut indexed = BTreeMap::new();
    indexed.insert(1usize, RowValues::Int(22));
    stmt.execute_with(indexed)?;

    assert_eq!(
        driver.executions(),
        vec![
            vec![RowValues::Int(1), RowValues::Text("two".into())],
            vec![RowValues::Int(1), RowValues::Int(22)],
        ]
    );

    let mut named_stmt = conn.prepare("SELECT :a")?;
    let mut named = HashMap::new();
    named.insert(":a".to_string(), RowValues::Bool(true));
    named_stmt.execute_with(named)?;
    assert_eq!(
        driver.executions().last(),
        Some(&vec![RowValues::Bool(true)])
    );
    Ok(())
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;

    #[test]
    fn reference_binding_is_read_at_execute() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;

        let v = ParamCell::new(10);
        let mut a = conn.prepare("SELECT ?")?;
        a.bind_value(1, v.get(), ParamType::Integer);
        let mut b = conn.prepare("SELECT ?")?;
        b.bind_param(1, v.clone(), ParamType::Integer, None);

        v.set(20);
        a.execute()?;
        b.execute()?;
        assert_eq!(a.fetch_column(0)?, Some(RowValues::Int(10)));
        assert_eq!(b.fetch_column(0)?, Some(RowValues::Int(20)));

        v.set(30);
        b.execute()?;
        assert_eq!(b.fetch_column(0)?, Some(RowValues::Int(30)));
        Ok(())
    }

    #[test]
    fn named_parameters_bind_with_or_without_prefix() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;

        let mut stmt = conn.prepare("SELECT :a || @b")?;
        stmt.bind_value("a", "x", ParamType::Str);
        stmt.bind_value("@b", "y", ParamType::Str);
        stmt.execute()?;
        assert_eq!(stmt.fetch_column(0)?, Some(RowValues::Text("xy".into())));
        Ok(())
    }

    #[test]
    fn binary_parameters_are_stored_as_blobs() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;

        let mut stmt = conn.prepare("SELECT typeof(?), typeof(?)")?;
        stmt.bind_value(1, "raw", ParamType::Binary);
        stmt.bind_value(2, "raw", ParamType::Str);
        stmt.execute()?;
        let row = stmt.fetch_with(FetchMode::NUMERIC, FetchArgs::default())?;
        assert_eq!(
            row.as_ref().and_then(FetchedRow::as_numeric),
            Some(&[RowValues::Text("blob".into()), RowValues::Text("text".into())][..])
        );
        Ok(())
    }

    #[test]
    fn unbound_parameters_are_null() -> Result<(), Box<dyn std::error::Error>> {
        let conn = SqliteOptionsBuilder::new(":memory:".into()).open()?;
        let mut stmt = conn.query("SELECT ? IS NULL")?;
        assert_eq!(stmt.fetch_column(0)?, Some(RowValues::Int(1)));
        Ok(())
    }
}
