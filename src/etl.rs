//! Stage runners: reset the schema, bulk-load staging, populate the star schema.

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info};

use crate::catalog::{Catalog, Stage};
use crate::schema::table_names;
use crate::warehouse::Warehouse;

/// Outcome of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub statements: usize,
    pub rows: u64,
}

/// Execute every statement of `stage` in catalog order, stopping at the first failure
pub fn run_stage(
    warehouse: &mut dyn Warehouse,
    catalog: &Catalog,
    stage: Stage,
) -> Result<StageReport> {
    let start = Instant::now();
    let mut report = StageReport {
        stage,
        statements: 0,
        rows: 0,
    };

    for statement in catalog.stage(stage) {
        debug!(%stage, statement = %statement.name, sql = %statement.sql(), "executing");
        let rows = warehouse.execute(statement).with_context(|| {
            format!(
                "{} failed on {} ({})",
                statement.name,
                warehouse.name(),
                statement.purpose
            )
        })?;
        info!(%stage, statement = %statement.name, table = statement.table, rows, "done");

        report.statements += 1;
        report.rows += rows;
    }

    info!(
        %stage,
        statements = report.statements,
        rows = report.rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "stage complete"
    );
    Ok(report)
}

pub fn drop_tables(warehouse: &mut dyn Warehouse, catalog: &Catalog) -> Result<StageReport> {
    run_stage(warehouse, catalog, Stage::Drop)
}

pub fn create_tables(warehouse: &mut dyn Warehouse, catalog: &Catalog) -> Result<StageReport> {
    run_stage(warehouse, catalog, Stage::Create)
}

/// Add foreign-key constraints; empty for dialects without them
pub fn alter_tables(warehouse: &mut dyn Warehouse, catalog: &Catalog) -> Result<StageReport> {
    run_stage(warehouse, catalog, Stage::Alter)
}

pub fn load_staging_tables(
    warehouse: &mut dyn Warehouse,
    catalog: &Catalog,
) -> Result<StageReport> {
    run_stage(warehouse, catalog, Stage::Copy)
}

pub fn insert_tables(warehouse: &mut dyn Warehouse, catalog: &Catalog) -> Result<StageReport> {
    run_stage(warehouse, catalog, Stage::Insert)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Run the alter stage after creating tables
    pub with_constraints: bool,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            with_constraints: true,
        }
    }
}

/// Drop and recreate every table. All data is lost.
pub fn reset_schema(
    warehouse: &mut dyn Warehouse,
    catalog: &Catalog,
    options: SchemaOptions,
) -> Result<Vec<StageReport>> {
    let mut reports = vec![
        drop_tables(warehouse, catalog)?,
        create_tables(warehouse, catalog)?,
    ];
    if options.with_constraints {
        reports.push(alter_tables(warehouse, catalog)?);
    }
    Ok(reports)
}

/// Load staging from object storage, then populate the star schema.
///
/// Staging tables are appended to, not truncated, so running this twice
/// without a reset duplicates staging rows and songplays.
pub fn run_etl(warehouse: &mut dyn Warehouse, catalog: &Catalog) -> Result<Vec<StageReport>> {
    Ok(vec![
        load_staging_tables(warehouse, catalog)?,
        insert_tables(warehouse, catalog)?,
    ])
}

/// Row count of every table, in declaration order
pub fn table_counts(warehouse: &mut dyn Warehouse) -> Result<Vec<(&'static str, i64)>> {
    table_names()
        .into_iter()
        .map(|name| Ok((name, warehouse.count_rows(name)?)))
        .collect()
}
