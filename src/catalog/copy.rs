use super::{LoadSettings, Stage, Statement, StatementBody};
use crate::schema::tables::{STAGING_EVENTS, STAGING_SONGS};

/// How JSON records map onto table columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonShape {
    /// JSONPaths file listing one expression per column, in column order
    Paths(String),
    /// Column names match top-level JSON keys
    Auto,
}

impl JsonShape {
    fn to_sql(&self) -> String {
        match self {
            JsonShape::Paths(location) => quote(location),
            JsonShape::Auto => quote("auto"),
        }
    }
}

/// A bulk load of one staging table from object storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkCopy {
    pub table: &'static str,
    pub source: String,
    pub iam_role: String,
    pub region: String,
    pub shape: JsonShape,
}

impl BulkCopy {
    pub fn to_sql(&self) -> String {
        format!(
            "COPY {} FROM {} iam_role {} region {} FORMAT AS JSON {};",
            self.table,
            quote(&self.source),
            quote(&self.iam_role),
            quote(&self.region),
            self.shape.to_sql()
        )
    }
}

/// Single-quoted SQL string literal
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn copy_statements(settings: &LoadSettings) -> Vec<Statement> {
    let events = BulkCopy {
        table: STAGING_EVENTS.name,
        source: settings.log_data.clone(),
        iam_role: settings.iam_role.clone(),
        region: settings.region.clone(),
        shape: JsonShape::Paths(settings.log_jsonpath.clone()),
    };

    let songs = BulkCopy {
        table: STAGING_SONGS.name,
        source: settings.song_data.clone(),
        iam_role: settings.iam_role.clone(),
        region: settings.region.clone(),
        shape: JsonShape::Auto,
    };

    vec![
        Statement {
            name: "copy_staging_events".to_string(),
            purpose: "Bulk-load event logs through the JSONPaths mapping".to_string(),
            stage: Stage::Copy,
            table: events.table,
            depends_on: vec![events.table],
            body: StatementBody::Copy(events),
        },
        Statement {
            name: "copy_staging_songs".to_string(),
            purpose: "Bulk-load song metadata with automatic key mapping".to_string(),
            stage: Stage::Copy,
            table: songs.table,
            depends_on: vec![songs.table],
            body: StatementBody::Copy(songs),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LoadSettings {
        LoadSettings {
            log_data: "s3://udacity-dend/log_data".into(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
            song_data: "s3://udacity-dend/song_data".into(),
            iam_role: "arn:aws:iam::123456789012:role/dwhRole".into(),
            region: "us-west-2".into(),
        }
    }

    #[test]
    fn test_copy_statement_shape() {
        let statements = copy_statements(&settings());
        assert_eq!(
            statements[0].sql(),
            "COPY staging_events FROM 's3://udacity-dend/log_data' \
             iam_role 'arn:aws:iam::123456789012:role/dwhRole' \
             region 'us-west-2' \
             FORMAT AS JSON 's3://udacity-dend/log_json_path.json';"
        );
        assert_eq!(
            statements[1].sql(),
            "COPY staging_songs FROM 's3://udacity-dend/song_data' \
             iam_role 'arn:aws:iam::123456789012:role/dwhRole' \
             region 'us-west-2' \
             FORMAT AS JSON 'auto';"
        );
    }

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("it's"), "'it''s'");
        assert_eq!(quote(""), "''");
    }
}
