use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::catalog::{Dialect, Stage};

#[derive(Parser, Debug)]
#[command(name = "sparkify-dwh")]
#[command(version, about = "Build and load the Sparkify star schema on Redshift")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, global = true, default_value = "dwh.toml")]
    pub config: PathBuf,

    /// Database to run against
    #[arg(short, long, global = true, value_enum, default_value_t = Dialect::Redshift)]
    pub target: Dialect,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drop and recreate every table (all data is lost)
    CreateTables {
        /// Do not add foreign-key constraints
        #[arg(long)]
        skip_constraints: bool,
    },

    /// Bulk-load staging tables, then populate the star schema
    Etl,

    /// Print the statement catalog without connecting
    ShowSql {
        /// Only show this stage
        #[arg(short, long, value_enum)]
        stage: Option<Stage>,
    },

    /// List all table names
    ListTables,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["sparkify-dwh", "etl"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("dwh.toml"));
        assert_eq!(cli.target, Dialect::Redshift);
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Commands::Etl));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sparkify-dwh",
            "create-tables",
            "--skip-constraints",
            "--target",
            "sqlite",
            "-c",
            "local.toml",
        ])
        .unwrap();
        assert_eq!(cli.target, Dialect::Sqlite);
        assert_eq!(cli.config, PathBuf::from("local.toml"));
        assert!(matches!(
            cli.command,
            Commands::CreateTables {
                skip_constraints: true
            }
        ));
    }

    #[test]
    fn test_show_sql_stage() {
        let cli = Cli::try_parse_from(["sparkify-dwh", "show-sql", "--stage", "insert"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::ShowSql {
                stage: Some(Stage::Insert)
            }
        ));
        assert!(Cli::try_parse_from(["sparkify-dwh", "show-sql", "--stage", "vacuum"]).is_err());
    }
}
