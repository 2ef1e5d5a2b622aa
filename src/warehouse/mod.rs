//! Connections that execute catalog statements.

pub mod redshift;
pub mod sqlite;

pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use anyhow::Result;

use crate::catalog::{Dialect, Statement};
use crate::config::Config;

/// A database the catalog can run against.
///
/// Every statement commits on its own; a failed statement leaves earlier
/// ones in place.
pub trait Warehouse {
    fn name(&self) -> &'static str;

    /// Run one statement, returning the rows it affected
    fn execute(&mut self, statement: &Statement) -> Result<u64>;

    fn count_rows(&mut self, table: &str) -> Result<i64>;
}

/// Open the target named by `dialect` using its config section
pub fn connect(config: &Config, dialect: Dialect) -> Result<Box<dyn Warehouse>> {
    match dialect {
        Dialect::Redshift => Ok(Box::new(RedshiftWarehouse::connect(config.cluster()?)?)),
        Dialect::Sqlite => Ok(Box::new(SqliteWarehouse::open(&config.local()?.database)?)),
    }
}
