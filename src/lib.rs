pub mod catalog;
pub mod cli;
pub mod config;
pub mod etl;
pub mod loader;
pub mod logging;
pub mod schema;
pub mod timeparts;
pub mod warehouse;

pub use catalog::{Catalog, Dialect, Stage};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use warehouse::Warehouse;
