// SQLite module - native driver adapter over rusqlite
//
// - config: options, builder and opening a connection
// - native: the NativeConnection / NativeStatement implementation
// - params: conversion of bound values into rusqlite values
// - query: result extraction and buffering

pub mod config;
pub mod native;
pub mod params;
pub mod query;

pub use config::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
pub use native::{SqliteNative, SqliteNativeStatement};
pub use query::build_result_set;
