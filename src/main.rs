use anyhow::Result;
use sparkify_dwh::{
    catalog::{Catalog, Dialect, LoadSettings, Stage},
    cli::{Cli, Commands},
    config::Config,
    etl::{reset_schema, run_etl, table_counts, SchemaOptions, StageReport},
    logging::init_tracing,
    schema::DependencyResolver,
    warehouse,
};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::CreateTables { skip_constraints } => {
            let start = Instant::now();
            let (config, catalog) = load_catalog(&cli.config, cli.target)?;

            let mut wh = warehouse::connect(&config, cli.target)?;
            let options = SchemaOptions {
                with_constraints: !skip_constraints,
            };
            let reports = reset_schema(wh.as_mut(), &catalog, options)?;

            print_reports(&reports);
            println!(
                "\nRecreated {} tables on {} in {:.1}s",
                catalog.stage(Stage::Create).count(),
                wh.name(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Etl => {
            let start = Instant::now();
            let (config, catalog) = load_catalog(&cli.config, cli.target)?;

            let mut wh = warehouse::connect(&config, cli.target)?;
            let reports = run_etl(wh.as_mut(), &catalog)?;
            print_reports(&reports);

            println!("\nRow counts:\n");
            for (table, rows) in table_counts(wh.as_mut())? {
                println!("  {:<16} {:>10}", table, rows);
            }

            println!(
                "\nETL finished on {} in {:.1}s",
                wh.name(),
                start.elapsed().as_secs_f64()
            );
        }

        Commands::ShowSql { stage } => {
            let (_, catalog) = load_catalog(&cli.config, cli.target)?;

            for statement in catalog
                .statements()
                .iter()
                .filter(|s| stage.map_or(true, |wanted| s.stage == wanted))
            {
                let sql = statement.sql();
                println!("-- {} [{}]: {}", statement.name, statement.stage, statement.purpose);
                if sql.ends_with(';') {
                    println!("{}\n", sql);
                } else {
                    println!("{};\n", sql);
                }
            }
        }

        Commands::ListTables => {
            println!("Tables in dependency order:\n");
            for table in DependencyResolver::new()
                .all_tables_ordered()
                .map_err(anyhow::Error::msg)?
            {
                let deps = table.dependencies();
                if deps.is_empty() {
                    println!("  {:<16} {}", table.name, table.kind);
                } else {
                    println!(
                        "  {:<16} {:<10} -> {}",
                        table.name,
                        table.kind.to_string(),
                        deps.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

/// Config and validated catalog; both fail before any connection is made
fn load_catalog(path: &Path, dialect: Dialect) -> Result<(Config, Catalog)> {
    let config = Config::load(path)?;
    let settings = LoadSettings::from_config(&config, dialect)?;
    let catalog = Catalog::build(dialect, &settings)?;
    Ok((config, catalog))
}

fn print_reports(reports: &[StageReport]) {
    for report in reports {
        println!(
            "  {:<8} {:>3} statements {:>10} rows",
            report.stage.to_string(),
            report.statements,
            report.rows
        );
    }
}
