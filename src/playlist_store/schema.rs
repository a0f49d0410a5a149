//! SQLite schema for the playlist lifecycle database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const PLAYLIST_FK: ForeignKey = ForeignKey {
    foreign_table: "playlist",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const TRACK_FK: ForeignKey = ForeignKey {
    foreign_table: "track",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

const PLAYLIST_TABLE: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("owner_id", &SqlType::Integer, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "space",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'EMS'")
        ),
        sqlite_column!(
            "status",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'PTP'")
        ),
        sqlite_column!("source", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_playlist_space", "space"),
        ("idx_playlist_owner", "owner_id"),
    ],
    unique_constraints: &[],
};

const TRACK_TABLE: Table = Table {
    name: "track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist", &SqlType::Text, non_null = true),
        sqlite_column!("genre", &SqlType::Text),
    ],
    indices: &[("idx_track_artist", "artist")],
    unique_constraints: &[],
};

/// Ordered playlist membership. Position starts at 0 and is dense.
const PLAYLIST_TRACK_TABLE: Table = Table {
    name: "playlist_track",
    columns: &[
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!(
            "track_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&TRACK_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_playlist_track_playlist", "playlist_id")],
    unique_constraints: &[&["playlist_id", "position"]],
};

/// AI scores, keyed by (playlist, evaluating user).
const PLAYLIST_SCORE_TABLE: Table = Table {
    name: "playlist_score",
    columns: &[
        sqlite_column!(
            "playlist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYLIST_FK)
        ),
        sqlite_column!("user_id", &SqlType::Integer, non_null = true),
        sqlite_column!("score", &SqlType::Real, non_null = true),
        sqlite_column!("reason", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_playlist_score_playlist", "playlist_id")],
    unique_constraints: &[&["playlist_id", "user_id"]],
};

pub const PLAYLIST_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        PLAYLIST_TABLE,
        TRACK_TABLE,
        PLAYLIST_TRACK_TABLE,
        PLAYLIST_SCORE_TABLE,
    ],
    migration: None,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        let schema = &PLAYLIST_VERSIONED_SCHEMAS[0];
        schema.create(&conn).unwrap();
        schema.validate(&conn).unwrap();
    }

    #[test]
    fn playlist_defaults_to_ems_ptp() {
        let conn = Connection::open_in_memory().unwrap();
        PLAYLIST_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO playlist (owner_id, name, source) VALUES (1, 'Imported', 'Platform')",
            [],
        )
        .unwrap();

        let (space, status): (String, String) = conn
            .query_row("SELECT space, status FROM playlist", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(space, "EMS");
        assert_eq!(status, "PTP");
    }

    #[test]
    fn deleting_playlist_cascades_to_tracks_and_scores() {
        let conn = Connection::open_in_memory().unwrap();
        PLAYLIST_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO playlist (owner_id, name, source) VALUES (1, 'P', 'Upload')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO track (title, artist) VALUES ('Song', 'Artist')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO playlist_track (playlist_id, track_id, position) VALUES (1, 1, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason) VALUES (1, 7, 85.0, 'ok')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM playlist WHERE id = 1", []).unwrap();

        let memberships: i64 = conn
            .query_row("SELECT COUNT(*) FROM playlist_track", [], |r| r.get(0))
            .unwrap();
        let scores: i64 = conn
            .query_row("SELECT COUNT(*) FROM playlist_score", [], |r| r.get(0))
            .unwrap();
        let tracks: i64 = conn
            .query_row("SELECT COUNT(*) FROM track", [], |r| r.get(0))
            .unwrap();
        assert_eq!(memberships, 0);
        assert_eq!(scores, 0);
        // Track rows are shared and survive the playlist.
        assert_eq!(tracks, 1);
    }

    #[test]
    fn score_unique_per_playlist_and_user() {
        let conn = Connection::open_in_memory().unwrap();
        PLAYLIST_VERSIONED_SCHEMAS[0].create(&conn).unwrap();

        conn.execute(
            "INSERT INTO playlist (owner_id, name, source) VALUES (1, 'P', 'Upload')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason) VALUES (1, 7, 85.0, 'a')",
            [],
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason) VALUES (1, 7, 90.0, 'b')",
            params![],
        );
        assert!(duplicate.is_err());

        // A different user may score the same playlist.
        conn.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason) VALUES (1, 8, 90.0, 'b')",
            [],
        )
        .unwrap();
    }
}
