//! Local emulation of Redshift's JSON `COPY` for the rehearsal database.
//!
//! A [`BulkCopy`] source is read as a file or a directory tree of `.json`
//! files, each holding one or more concatenated JSON objects. Columns are
//! mapped either by name (`auto`) or positionally through a JSONPaths file.

pub mod jsonpaths;
pub mod record;

pub use record::{parse_record, ColumnMapping, SqlValue};

use anyhow::{bail, Context, Result};
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::catalog::{BulkCopy, JsonShape};
use crate::schema::{get_table, TableSchema};

/// Load every record under `copy.source` into `copy.table`, all or nothing
pub fn copy_into(conn: &mut Connection, copy: &BulkCopy) -> Result<u64> {
    let schema = get_table(copy.table)
        .with_context(|| format!("Unknown COPY target table: {}", copy.table))?;
    let mapping = column_mapping(schema, &copy.shape)?;
    let files = source_files(Path::new(&copy.source))?;

    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        schema.column_names().join(", "),
        vec!["?"; schema.columns.len()].join(", ")
    );

    let tx = conn.transaction()?;
    let mut count: u64 = 0;
    {
        let mut stmt = tx.prepare_cached(&insert_sql)?;

        for file_path in &files {
            let file = File::open(file_path)
                .with_context(|| format!("Failed to open: {:?}", file_path))?;
            let records =
                serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter::<Value>();

            for (idx, record) in records.enumerate() {
                let record = record.with_context(|| {
                    format!("Invalid JSON in {:?} (record {})", file_path, idx + 1)
                })?;
                let row = parse_record(&record, schema, &mapping).with_context(|| {
                    format!(
                        "Failed to load record {} of {:?} into {}",
                        idx + 1,
                        file_path,
                        schema.name
                    )
                })?;
                stmt.execute(params_from_iter(row.iter()))?;
                count += 1;
            }
        }
    }
    tx.commit()?;

    debug!(table = schema.name, files = files.len(), rows = count, "copied");
    Ok(count)
}

fn column_mapping(schema: &TableSchema, shape: &JsonShape) -> Result<ColumnMapping> {
    match shape {
        JsonShape::Auto => Ok(ColumnMapping::auto(schema)),
        JsonShape::Paths(location) => {
            let keys = jsonpaths::load_jsonpaths(Path::new(location))?;
            ColumnMapping::positional(schema, keys)
                .with_context(|| format!("JSONPaths file {:?} does not fit {}", location, schema.name))
        }
    }
}

/// A single file, or every `.json` file below a directory in path order
pub fn source_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("COPY source not found: {:?}", path);
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    collect_json_files(path, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ddl::generate_create_table;
    use crate::catalog::Dialect;
    use crate::schema::tables::{STAGING_EVENTS, STAGING_SONGS};
    use std::fs;

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for schema in [&STAGING_EVENTS, &STAGING_SONGS] {
            conn.execute(&generate_create_table(schema, Dialect::Sqlite), [])
                .unwrap();
        }
        conn
    }

    fn songs_copy(source: &Path) -> BulkCopy {
        BulkCopy {
            table: "staging_songs",
            source: source.display().to_string(),
            iam_role: String::new(),
            region: "us-west-2".into(),
            shape: JsonShape::Auto,
        }
    }

    #[test]
    fn test_source_files_walks_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();
        fs::write(dir.path().join("A/B/two.json"), "{}").unwrap();
        fs::write(dir.path().join("A/one.json"), "{}").unwrap();
        fs::write(dir.path().join("A/notes.txt"), "skip").unwrap();

        let files = source_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("A/B/two.json"), dir.path().join("A/one.json")]
        );
        assert!(source_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_copy_auto_maps_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("song.json"),
            r#"{"num_songs": 1, "artist_id": "AR1", "artist_name": "Casual", "song_id": "SO1", "title": "Intro", "duration": 218.9, "year": 0}
{"num_songs": 1, "artist_id": "AR2", "artist_name": "Mo", "song_id": "SO2", "title": "Outro", "duration": 100.0, "year": 2004}"#,
        )
        .unwrap();

        let mut conn = connection();
        let count = copy_into(&mut conn, &songs_copy(dir.path())).unwrap();
        assert_eq!(count, 2);

        let (title, latitude): (String, Option<String>) = conn
            .query_row(
                "SELECT title, artist_latitude FROM staging_songs WHERE song_id = 'SO1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(title, "Intro");
        assert_eq!(latitude, None);
    }

    #[test]
    fn test_copy_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"song_id": "SO1", "year": 1999}"#).unwrap();
        fs::write(dir.path().join("b.json"), r#"{"song_id": "SO2", "year": "soon"}"#).unwrap();

        let mut conn = connection();
        let err = copy_into(&mut conn, &songs_copy(dir.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("b.json"));

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM staging_songs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }

    #[test]
    fn test_copy_with_jsonpaths_is_positional() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<String> = STAGING_EVENTS
            .columns
            .iter()
            .map(|c| format!("$['{}']", c.name))
            .collect();
        let paths_file = dir.path().join("paths.json");
        fs::write(&paths_file, serde_json::json!({ "jsonpaths": paths }).to_string()).unwrap();

        let log_dir = dir.path().join("log_data");
        fs::create_dir(&log_dir).unwrap();
        fs::write(
            log_dir.join("events.json"),
            r#"{"artist": null, "page": "Home", "ts": 1541121934796, "userId": "39", "sessionId": 38}"#,
        )
        .unwrap();

        let copy = BulkCopy {
            table: "staging_events",
            source: log_dir.display().to_string(),
            iam_role: String::new(),
            region: "us-west-2".into(),
            shape: JsonShape::Paths(paths_file.display().to_string()),
        };

        let mut conn = connection();
        assert_eq!(copy_into(&mut conn, &copy).unwrap(), 1);

        let (user_id, ts): (i64, i64) = conn
            .query_row("SELECT userId, ts FROM staging_events", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(user_id, 39);
        assert_eq!(ts, 1541121934796);
    }

    #[test]
    fn test_jsonpaths_column_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let paths_file = dir.path().join("paths.json");
        fs::write(&paths_file, r#"{"jsonpaths": ["$['artist']"]}"#).unwrap();
        fs::write(dir.path().join("e.json"), "{}").unwrap();

        let copy = BulkCopy {
            table: "staging_events",
            source: dir.path().join("e.json").display().to_string(),
            iam_role: String::new(),
            region: "us-west-2".into(),
            shape: JsonShape::Paths(paths_file.display().to_string()),
        };
        assert!(copy_into(&mut connection(), &copy).is_err());
    }
}
