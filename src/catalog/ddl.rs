use super::{Dialect, Stage, Statement, StatementBody};
use crate::schema::{Column, ColumnType, ForeignKey, TableSchema};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema, dialect: Dialect) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);

    let columns: Vec<String> = schema
        .columns
        .iter()
        .map(|col| column_definition(col, dialect))
        .collect();

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    if dialect == Dialect::Redshift && !schema.compound_sort_key.is_empty() {
        sql.push_str(&format!(
            "\nCOMPOUND SORTKEY({})",
            schema.compound_sort_key.join(", ")
        ));
    }

    sql
}

fn column_definition(col: &Column, dialect: Dialect) -> String {
    match dialect {
        Dialect::Redshift => {
            let sql_type = match col.col_type {
                ColumnType::Varchar => "VARCHAR",
                ColumnType::Int => "INT",
                ColumnType::BigInt => "BIGINT",
                ColumnType::Decimal => "DECIMAL",
                ColumnType::Identity => "INT IDENTITY(0,1)",
            };

            let pk = if col.primary_key { " PRIMARY KEY" } else { "" };
            let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
            let dist = if col.dist_key { " DISTKEY" } else { "" };
            let sort = if col.sort_key { " SORTKEY" } else { "" };

            format!(
                "    {} {}{}{}{}{}",
                col.name, sql_type, pk, null_constraint, dist, sort
            )
        }
        Dialect::Sqlite => {
            // Key declarations are informational on Redshift; the rehearsal
            // database mirrors that by not enforcing them.
            let sql_type = match col.col_type {
                ColumnType::Varchar => "TEXT",
                ColumnType::Int | ColumnType::BigInt => "INTEGER",
                ColumnType::Decimal => "REAL",
                ColumnType::Identity => "INTEGER PRIMARY KEY",
            };

            let null_constraint = if !col.nullable { " NOT NULL" } else { "" };

            format!("    {} {}{}", col.name, sql_type, null_constraint)
        }
    }
}

/// Constraint name, unique across the schema
pub fn constraint_name(schema: &TableSchema, fk: &ForeignKey) -> String {
    format!("fk_{}_{}", schema.name, fk.column)
}

pub fn generate_add_foreign_key(schema: &TableSchema, fk: &ForeignKey) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
        schema.name,
        constraint_name(schema, fk),
        fk.column,
        fk.references_table,
        fk.references_column
    )
}

/// `DROP TABLE IF EXISTS`, ordered after the drops of every referencing table
pub fn drop_table(schema: &'static TableSchema, children: &[&'static str]) -> Statement {
    Statement {
        name: format!("drop_{}", schema.name),
        purpose: format!("Drop {} table {} if it exists", schema.kind, schema.name),
        stage: Stage::Drop,
        table: schema.name,
        depends_on: children.to_vec(),
        body: StatementBody::Sql(format!("DROP TABLE IF EXISTS {}", schema.name)),
    }
}

pub fn create_table(schema: &'static TableSchema, dialect: Dialect) -> Statement {
    Statement {
        name: format!("create_{}", schema.name),
        purpose: format!("Create {} table {}", schema.kind, schema.name),
        stage: Stage::Create,
        table: schema.name,
        depends_on: schema.dependencies(),
        body: StatementBody::Sql(generate_create_table(schema, dialect)),
    }
}

pub fn add_foreign_key(schema: &'static TableSchema, fk: &ForeignKey) -> Statement {
    Statement {
        name: format!("alter_{}_{}", schema.name, fk.column),
        purpose: format!(
            "Reference {}({}) from {}.{}",
            fk.references_table, fk.references_column, schema.name, fk.column
        ),
        stage: Stage::Alter,
        table: schema.name,
        depends_on: vec![schema.name, fk.references_table],
        body: StatementBody::Sql(generate_add_foreign_key(schema, fk)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{SONGPLAYS, SONGS, STAGING_EVENTS, USERS};

    #[test]
    fn test_generate_create_table_redshift() {
        let sql = generate_create_table(&SONGPLAYS, Dialect::Redshift);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS songplays (\n"));
        assert!(sql.contains("    songplay_id INT IDENTITY(0,1),\n"));
        assert!(sql.contains("    start_time VARCHAR NOT NULL,\n"));
        assert!(sql.contains("    level VARCHAR DISTKEY,\n"));
        assert!(sql.ends_with(")\nCOMPOUND SORTKEY(song_id, artist_id)"));

        let sql = generate_create_table(&SONGS, Dialect::Redshift);
        assert!(sql.contains("    song_id VARCHAR PRIMARY KEY,\n"));
        assert!(sql.contains("    artist_id VARCHAR NOT NULL DISTKEY,\n"));
        assert!(sql.contains("    year INT SORTKEY,\n"));
    }

    #[test]
    fn test_generate_create_table_sqlite() {
        let sql = generate_create_table(&SONGPLAYS, Dialect::Sqlite);
        assert!(sql.contains("    songplay_id INTEGER PRIMARY KEY,\n"));
        assert!(!sql.contains("DISTKEY"));
        assert!(!sql.contains("SORTKEY"));

        let sql = generate_create_table(&USERS, Dialect::Sqlite);
        assert!(sql.contains("    user_id INTEGER,\n"));
        assert!(!sql.contains("PRIMARY KEY"));

        let sql = generate_create_table(&STAGING_EVENTS, Dialect::Sqlite);
        assert!(sql.contains("    length REAL,\n"));
    }

    #[test]
    fn test_generate_add_foreign_key() {
        let sql = generate_add_foreign_key(&SONGPLAYS, &SONGPLAYS.foreign_keys[0]);
        assert_eq!(
            sql,
            "ALTER TABLE songplays ADD CONSTRAINT fk_songplays_user_id FOREIGN KEY (user_id) REFERENCES users(user_id)"
        );
    }

    #[test]
    fn test_drop_statement_waits_for_children() {
        let statement = drop_table(&SONGS, &["songplays"]);
        assert_eq!(statement.name, "drop_songs");
        assert_eq!(statement.depends_on, vec!["songplays"]);
        assert_eq!(statement.sql(), "DROP TABLE IF EXISTS songs");
    }
}
