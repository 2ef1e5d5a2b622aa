//! Declarations of the staging tables and the star schema.

pub mod dependencies;
pub mod tables;
pub mod types;

pub use dependencies::DependencyResolver;
pub use tables::{get_table, table_names, ALL_TABLES};
pub use types::{Column, ColumnType, ForeignKey, TableKind, TableSchema};
