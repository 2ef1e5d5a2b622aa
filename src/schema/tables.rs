//! Table schema definitions for the Sparkify warehouse

use super::types::*;

// =============================================================================
// Staging Tables (raw bulk loads, no keys)
// =============================================================================

/// One row per logged app event; columns follow the log JSONPaths file order.
pub static STAGING_EVENTS: TableSchema = TableSchema {
    name: "staging_events",
    kind: TableKind::Staging,
    columns: &[
        Column::new("artist", ColumnType::Varchar).dist_key(),
        Column::new("auth", ColumnType::Varchar),
        Column::new("firstName", ColumnType::Varchar),
        Column::new("gender", ColumnType::Varchar),
        Column::new("itemInSession", ColumnType::BigInt),
        Column::new("lastName", ColumnType::Varchar),
        Column::new("length", ColumnType::Decimal),
        Column::new("level", ColumnType::Varchar),
        Column::new("location", ColumnType::Varchar),
        Column::new("method", ColumnType::Varchar),
        Column::new("page", ColumnType::Varchar),
        Column::new("registration", ColumnType::BigInt),
        Column::new("sessionId", ColumnType::BigInt),
        Column::new("song", ColumnType::Varchar),
        Column::new("status", ColumnType::BigInt),
        Column::new("ts", ColumnType::BigInt),
        Column::new("userAgent", ColumnType::Varchar),
        Column::new("userId", ColumnType::BigInt),
    ],
    foreign_keys: &[],
    compound_sort_key: &[],
};

/// Song metadata; column names match the JSON keys so `FORMAT AS JSON 'auto'` maps them.
pub static STAGING_SONGS: TableSchema = TableSchema {
    name: "staging_songs",
    kind: TableKind::Staging,
    columns: &[
        Column::new("num_songs", ColumnType::Int),
        Column::new("artist_id", ColumnType::Varchar),
        Column::new("artist_latitude", ColumnType::Varchar),
        Column::new("artist_longitude", ColumnType::Varchar),
        Column::new("artist_location", ColumnType::Varchar),
        Column::new("artist_name", ColumnType::Varchar).dist_key(),
        Column::new("song_id", ColumnType::Varchar),
        Column::new("title", ColumnType::Varchar),
        Column::new("duration", ColumnType::Decimal),
        Column::new("year", ColumnType::Int),
    ],
    foreign_keys: &[],
    compound_sort_key: &[],
};

// =============================================================================
// Dimension Tables
// =============================================================================

pub static USERS: TableSchema = TableSchema {
    name: "users",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("user_id", ColumnType::Int).primary_key(),
        Column::new("first_name", ColumnType::Varchar),
        Column::new("last_name", ColumnType::Varchar),
        Column::new("gender", ColumnType::Varchar).dist_key(),
        Column::new("level", ColumnType::Varchar),
    ],
    foreign_keys: &[],
    compound_sort_key: &[],
};

pub static ARTISTS: TableSchema = TableSchema {
    name: "artists",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("artist_id", ColumnType::Varchar).primary_key(),
        Column::new("name", ColumnType::Varchar),
        Column::new("location", ColumnType::Varchar).dist_key(),
        Column::new("latitude", ColumnType::Varchar),
        Column::new("longitude", ColumnType::Varchar),
    ],
    foreign_keys: &[],
    compound_sort_key: &[],
};

/// Keyed by wall-clock `HH:MM:SS`; the date is not part of the key.
pub static TIME: TableSchema = TableSchema {
    name: "time",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("start_time", ColumnType::Varchar).primary_key(),
        Column::new("hour", ColumnType::Int),
        Column::new("day", ColumnType::Int),
        Column::new("week", ColumnType::Int),
        Column::new("month", ColumnType::Int),
        Column::new("year", ColumnType::Int).dist_key(),
        Column::new("weekday", ColumnType::Int),
    ],
    foreign_keys: &[],
    compound_sort_key: &[],
};

pub static SONGS: TableSchema = TableSchema {
    name: "songs",
    kind: TableKind::Dimension,
    columns: &[
        Column::new("song_id", ColumnType::Varchar).primary_key(),
        Column::new("title", ColumnType::Varchar),
        Column::required("artist_id", ColumnType::Varchar).dist_key(),
        Column::new("year", ColumnType::Int).sort_key(),
        Column::new("duration", ColumnType::Decimal),
    ],
    foreign_keys: &[ForeignKey::new("artist_id", "artists")],
    compound_sort_key: &[],
};

// =============================================================================
// Fact Table
// =============================================================================

pub static SONGPLAYS: TableSchema = TableSchema {
    name: "songplays",
    kind: TableKind::Fact,
    columns: &[
        Column::new("songplay_id", ColumnType::Identity),
        Column::required("start_time", ColumnType::Varchar),
        Column::required("user_id", ColumnType::Int),
        Column::new("level", ColumnType::Varchar).dist_key(),
        Column::required("song_id", ColumnType::Varchar),
        Column::required("artist_id", ColumnType::Varchar),
        Column::new("session_id", ColumnType::Int),
        Column::new("location", ColumnType::Varchar),
        Column::new("user_agent", ColumnType::Varchar),
    ],
    foreign_keys: &[
        ForeignKey::new("user_id", "users"),
        ForeignKey::new("song_id", "songs"),
        ForeignKey::new("artist_id", "artists"),
    ],
    compound_sort_key: &["song_id", "artist_id"],
};

/// All tables in declaration order
pub static ALL_TABLES: &[&TableSchema] = &[
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &USERS,
    &ARTISTS,
    &TIME,
    &SONGS,
    &SONGPLAYS,
];

/// Look up a table by name
pub fn get_table(name: &str) -> Option<&'static TableSchema> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

/// All table names, in declaration order
pub fn table_names() -> Vec<&'static str> {
    ALL_TABLES.iter().map(|t| t.name).collect()
}
