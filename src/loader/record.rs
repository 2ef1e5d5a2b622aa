use anyhow::{bail, Context, Result};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use serde_json::Value;

use crate::schema::{ColumnType, TableSchema};

/// JSON key feeding each table column, in column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub keys: Vec<String>,
}

impl ColumnMapping {
    /// `FORMAT AS JSON 'auto'`: keys are the column names
    pub fn auto(schema: &TableSchema) -> Self {
        Self {
            keys: schema.columns.iter().map(|c| c.name.to_string()).collect(),
        }
    }

    /// Positional JSONPaths keys; there must be exactly one per column
    pub fn positional(schema: &TableSchema, keys: Vec<String>) -> Result<Self> {
        if keys.len() != schema.columns.len() {
            bail!(
                "JSONPaths lists {} expressions but {} has {} columns",
                keys.len(),
                schema.name,
                schema.columns.len()
            );
        }
        Ok(Self { keys })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Convert one JSON record into a row for the given table schema
pub fn parse_record(
    record: &Value,
    schema: &TableSchema,
    mapping: &ColumnMapping,
) -> Result<Vec<SqlValue>> {
    if !record.is_object() {
        bail!("Expected a JSON object, found: {}", record);
    }

    schema
        .columns
        .iter()
        .zip(&mapping.keys)
        .map(|(col, key)| {
            extract_value(record.get(key), &col.col_type)
                .with_context(|| format!("Column {} (JSON key {:?})", col.name, key))
        })
        .collect()
}

fn extract_value(val: Option<&Value>, col_type: &ColumnType) -> Result<SqlValue> {
    let v = match val {
        None | Some(Value::Null) => return Ok(SqlValue::Null),
        Some(v) => v,
    };

    match col_type {
        ColumnType::Varchar => Ok(SqlValue::Text(match v {
            Value::String(s) => s.clone(),
            // Numbers, booleans and nested values load as their JSON text
            other => other.to_string(),
        })),
        ColumnType::Int | ColumnType::BigInt | ColumnType::Identity => {
            let parsed = match v {
                Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => i,
                    // Event logs write registration as `1540919166796.0`
                    (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        f as i64
                    }
                    _ => bail!("{} is not an integer", n),
                },
                Value::String(s) if s.trim().is_empty() => return Ok(SqlValue::Null),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("{:?} is not an integer", s))?,
                other => bail!("Cannot load {} as an integer", other),
            };
            if *col_type == ColumnType::Int && i32::try_from(parsed).is_err() {
                bail!("{} is out of range for INT", parsed);
            }
            Ok(SqlValue::Integer(parsed))
        }
        ColumnType::Decimal => match v {
            Value::Number(n) => n
                .as_f64()
                .map(SqlValue::Real)
                .with_context(|| format!("{} is not a number", n)),
            Value::String(s) if s.trim().is_empty() => Ok(SqlValue::Null),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(SqlValue::Real)
                .with_context(|| format!("{:?} is not a number", s)),
            other => bail!("Cannot load {} as a decimal", other),
        },
    }
}
