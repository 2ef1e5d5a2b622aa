//! Ordered, typed SQL statements for every stage of a warehouse run.
//!
//! A [`Catalog`] is rendered for one [`Dialect`] from the table declarations
//! in [`crate::schema`] and explicit [`LoadSettings`]. Each [`Statement`]
//! declares the tables whose statements must run before it, and the catalog
//! refuses to exist if that ordering is violated.

pub mod copy;
pub mod ddl;
pub mod insert;

pub use copy::{BulkCopy, JsonShape};

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::config::{utf8_path, Config, DEFAULT_REGION};
use crate::schema::DependencyResolver;

/// SQL flavour a catalog is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dialect {
    /// Amazon Redshift over the Postgres wire protocol
    Redshift,
    /// Local rehearsal database
    Sqlite,
}

impl Dialect {
    /// Whether `ALTER TABLE ... ADD CONSTRAINT` is available
    pub fn supports_constraints(self) -> bool {
        matches!(self, Dialect::Redshift)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Redshift => write!(f, "redshift"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Phases of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Stage {
    Drop,
    Create,
    Alter,
    Copy,
    Insert,
}

impl Stage {
    /// Stage whose statements a declared dependency refers to
    fn dependency_stage(self) -> Stage {
        match self {
            Stage::Drop | Stage::Create | Stage::Insert => self,
            Stage::Alter | Stage::Copy => Stage::Create,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Drop => write!(f, "drop"),
            Stage::Create => write!(f, "create"),
            Stage::Alter => write!(f, "alter"),
            Stage::Copy => write!(f, "copy"),
            Stage::Insert => write!(f, "insert"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StatementBody {
    Sql(String),
    /// Rendered as `COPY` on Redshift, emulated from local files elsewhere
    Copy(BulkCopy),
}

impl fmt::Display for StatementBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementBody::Sql(sql) => f.write_str(sql),
            StatementBody::Copy(copy) => f.write_str(&copy.to_sql()),
        }
    }
}

/// One step of the catalog
#[derive(Debug, Clone)]
pub struct Statement {
    pub name: String,
    pub purpose: String,
    pub stage: Stage,
    /// Table the statement writes or alters
    pub table: &'static str,
    /// Tables whose statements must come first (see [`Catalog::validate`])
    pub depends_on: Vec<&'static str>,
    pub body: StatementBody,
}

impl Statement {
    pub fn sql(&self) -> String {
        self.body.to_string()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("No insert transform defined for table: {0}")]
    NoTransform(&'static str),

    #[error("{statement} ({stage}) is listed after a {previous} statement")]
    StageOrder {
        statement: String,
        stage: Stage,
        previous: Stage,
    },

    #[error("{statement} ({stage}) runs before the {stage} statement for {dependency}")]
    OutOfOrder {
        statement: String,
        stage: Stage,
        dependency: &'static str,
    },

    #[error("{statement} ({stage}) depends on {dependency}, which has no {required} statement")]
    MissingDependency {
        statement: String,
        stage: Stage,
        dependency: &'static str,
        required: Stage,
    },
}

/// Where bulk loads read from; passed in explicitly rather than read globally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub log_data: String,
    pub log_jsonpath: String,
    pub song_data: String,
    pub iam_role: String,
    pub region: String,
}

impl LoadSettings {
    /// S3 locations and role for Redshift, local paths for the rehearsal database
    pub fn from_config(config: &Config, dialect: Dialect) -> Result<Self> {
        match dialect {
            Dialect::Redshift => {
                let s3 = config.s3()?;
                let role = config.iam_role()?;
                Ok(Self {
                    log_data: s3.log_data.clone(),
                    log_jsonpath: s3.log_jsonpath.clone(),
                    song_data: s3.song_data.clone(),
                    iam_role: role.arn.clone(),
                    region: s3.region.clone(),
                })
            }
            Dialect::Sqlite => {
                let local = config.local()?;
                Ok(Self {
                    log_data: utf8_path("local.log_data", &local.log_data)?.to_string(),
                    log_jsonpath: utf8_path("local.log_jsonpath", &local.log_jsonpath)?
                        .to_string(),
                    song_data: utf8_path("local.song_data", &local.song_data)?.to_string(),
                    iam_role: String::new(),
                    region: DEFAULT_REGION.to_string(),
                })
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    dialect: Dialect,
    statements: Vec<Statement>,
}

impl Catalog {
    /// Render the full catalog for a dialect
    pub fn build(dialect: Dialect, settings: &LoadSettings) -> Result<Self, CatalogError> {
        let resolver = DependencyResolver::new();
        let ordered = resolver
            .all_tables_ordered()
            .map_err(CatalogError::Schema)?;

        let mut statements = Vec::new();

        // Children go first so parents are never dropped while still referenced
        for &table in ordered.iter().rev() {
            statements.push(ddl::drop_table(table, resolver.children(table.name)));
        }

        for &table in &ordered {
            statements.push(ddl::create_table(table, dialect));
        }

        if dialect.supports_constraints() {
            for &table in &ordered {
                for fk in table.foreign_keys {
                    statements.push(ddl::add_foreign_key(table, fk));
                }
            }
        }

        statements.extend(copy::copy_statements(settings));

        for &table in ordered.iter().filter(|t| t.kind.is_analytics()) {
            let statement = insert::insert_into(table, dialect)
                .ok_or(CatalogError::NoTransform(table.name))?;
            statements.push(statement);
        }

        Self::from_statements(dialect, statements)
    }

    /// Wrap an explicit statement list, validating its ordering
    pub fn from_statements(
        dialect: Dialect,
        statements: Vec<Statement>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            dialect,
            statements,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Statements of one stage, in execution order
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &Statement> + '_ {
        self.statements.iter().filter(move |s| s.stage == stage)
    }

    /// Check stage grouping and declared dependencies.
    ///
    /// Drop, create and insert dependencies must appear earlier in the same
    /// stage. Alter and copy dependencies must have a create statement.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut previous = None;
        for statement in &self.statements {
            if let Some(prev) = previous {
                if statement.stage < prev {
                    return Err(CatalogError::StageOrder {
                        statement: statement.name.clone(),
                        stage: statement.stage,
                        previous: prev,
                    });
                }
            }
            previous = Some(statement.stage);
        }

        // First position of each (stage, table) pair
        let mut first: HashMap<(Stage, &str), usize> = HashMap::new();
        for (idx, statement) in self.statements.iter().enumerate() {
            first.entry((statement.stage, statement.table)).or_insert(idx);
        }

        for (idx, statement) in self.statements.iter().enumerate() {
            let required = statement.stage.dependency_stage();
            for dependency in &statement.depends_on {
                let Some(&position) = first.get(&(required, *dependency)) else {
                    return Err(CatalogError::MissingDependency {
                        statement: statement.name.clone(),
                        stage: statement.stage,
                        dependency: *dependency,
                        required,
                    });
                };
                if required == statement.stage && position >= idx {
                    return Err(CatalogError::OutOfOrder {
                        statement: statement.name.clone(),
                        stage: statement.stage,
                        dependency: *dependency,
                    });
                }
            }
        }

        Ok(())
    }
}
