//! INSERT-SELECT transforms from the staging tables into the star schema.
//!
//! Every transform reads staging tables only. Dimensions are deduplicated by
//! `DISTINCT` within the statement, never against rows already persisted, so
//! re-running a transform appends again.

use super::{Dialect, Stage, Statement, StatementBody};
use crate::schema::TableSchema;
use crate::timeparts::{TimePart, CLOCK_FUNCTION, PART_FUNCTION};

/// Wall-clock timestamp for an epoch-millis column
fn epoch(column: &str) -> String {
    format!(
        "TIMESTAMP WITH TIME ZONE 'epoch' + {}/1000 * INTERVAL '1 Second '",
        column
    )
}

/// `HH:MM:SS` key; the date is deliberately dropped
pub fn clock_expr(dialect: Dialect, column: &str) -> String {
    match dialect {
        Dialect::Redshift => format!("to_char({}, 'HH24:MI:SS')", epoch(column)),
        Dialect::Sqlite => format!("{}({})", CLOCK_FUNCTION, column),
    }
}

pub fn part_expr(dialect: Dialect, part: TimePart, column: &str) -> String {
    match dialect {
        Dialect::Redshift => format!(
            "extract({} from ({}))",
            part.redshift_datepart(),
            epoch(column)
        ),
        Dialect::Sqlite => format!("{}('{}', {})", PART_FUNCTION, part.name(), column),
    }
}

fn users_select() -> String {
    "SELECT DISTINCT userId, firstName, lastName, gender, level\n\
     FROM staging_events\n\
     WHERE userId IS NOT NULL"
        .to_string()
}

fn artists_select() -> String {
    "SELECT DISTINCT artist_id, artist_name, artist_location, artist_latitude, artist_longitude\n\
     FROM staging_songs\n\
     WHERE artist_id IS NOT NULL"
        .to_string()
}

fn songs_select() -> String {
    "SELECT DISTINCT song_id, title, artist_id, year, duration\n\
     FROM staging_songs\n\
     WHERE song_id IS NOT NULL\n\
     AND artist_id IS NOT NULL"
        .to_string()
}

fn time_select(dialect: Dialect) -> String {
    let mut fields = vec![clock_expr(dialect, "ts")];
    fields.extend(TimePart::ALL.iter().map(|&p| part_expr(dialect, p, "ts")));

    format!(
        "SELECT DISTINCT {}\nFROM staging_events\nWHERE ts IS NOT NULL",
        fields.join(",\n")
    )
}

/// Plays joined to song metadata on exact artist name and title.
/// Events with no matching song are dropped by the inner join.
fn songplays_select(dialect: Dialect) -> String {
    format!(
        "SELECT DISTINCT e.sessionId, {}, e.userId, e.level, s.song_id, s.artist_id, e.location, e.userAgent\n\
         FROM staging_events AS e\n\
         INNER JOIN staging_songs AS s\n\
         ON e.artist = s.artist_name\n\
         AND e.song = s.title\n\
         WHERE e.page = 'NextSong'",
        clock_expr(dialect, "e.ts")
    )
}

/// Build the transform that populates `schema`, if one is defined
pub fn insert_into(schema: &'static TableSchema, dialect: Dialect) -> Option<Statement> {
    let (columns, select, purpose): (Vec<&str>, String, &str) = match schema.name {
        "users" => (
            schema.column_names(),
            users_select(),
            "Distinct users from logged events",
        ),
        "artists" => (
            schema.column_names(),
            artists_select(),
            "Distinct artists from song metadata",
        ),
        "time" => (
            schema.column_names(),
            time_select(dialect),
            "Clock keys and calendar parts of every event timestamp",
        ),
        "songs" => (
            schema.column_names(),
            songs_select(),
            "Distinct songs from song metadata",
        ),
        "songplays" => (
            vec![
                "session_id",
                "start_time",
                "user_id",
                "level",
                "song_id",
                "artist_id",
                "location",
                "user_agent",
            ],
            songplays_select(dialect),
            "NextSong events matched to songs by artist name and title",
        ),
        _ => return None,
    };

    Some(Statement {
        name: format!("insert_{}", schema.name),
        purpose: purpose.to_string(),
        stage: Stage::Insert,
        table: schema.name,
        depends_on: schema.dependencies(),
        body: StatementBody::Sql(format!(
            "INSERT INTO {} ({})\n{}",
            schema.name,
            columns.join(", "),
            select
        )),
    })
}
