//! SQLite-backed playlist store implementation.

use super::models::*;
use super::schema::PLAYLIST_VERSIONED_SCHEMAS;
use super::trait_def::PlaylistStore;
use crate::sqlite_persistence::open_versioned;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::info;

pub struct SqlitePlaylistStore {
    conn: Mutex<Connection>,
}

fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    let space_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let source_str: String = row.get(5)?;
    Ok(Playlist {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        space: SpaceType::from_str(&space_str)
            .map_err(|_| rusqlite::Error::InvalidColumnType(3, space_str, rusqlite::types::Type::Text))?,
        status: StatusFlag::from_str(&status_str)
            .map_err(|_| rusqlite::Error::InvalidColumnType(4, status_str, rusqlite::types::Type::Text))?,
        source: SourceType::from_str(&source_str)
            .map_err(|_| rusqlite::Error::InvalidColumnType(5, source_str, rusqlite::types::Type::Text))?,
        created: row.get(6)?,
    })
}

const PLAYLIST_COLUMNS: &str = "id, owner_id, name, space, status, source, created";

impl SqlitePlaylistStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let mut conn = Connection::open(&db_path)
            .with_context(|| format!("Opening playlist db at {:?}", db_path.as_ref()))?;
        open_versioned(&mut conn, PLAYLIST_VERSIONED_SCHEMAS)?;
        info!("Playlist db ready at {:?}", db_path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        open_versioned(&mut conn, PLAYLIST_VERSIONED_SCHEMAS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl PlaylistStore for SqlitePlaylistStore {
    fn create_playlist(&self, new: &NewPlaylist) -> Result<i64> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO playlist (owner_id, name, space, status, source)
             VALUES (?1, ?2, 'EMS', 'PTP', ?3)",
            params![new.owner_id, new.name, new.source.as_str()],
        )?;
        let playlist_id = tx.last_insert_rowid();

        for (position, track) in new.tracks.iter().enumerate() {
            tx.execute(
                "INSERT INTO track (title, artist, genre) VALUES (?1, ?2, ?3)",
                params![track.title, track.artist, track.genre],
            )?;
            let track_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO playlist_track (playlist_id, track_id, position) VALUES (?1, ?2, ?3)",
                params![playlist_id, track_id, position as i64],
            )?;
        }

        tx.commit()?;
        Ok(playlist_id)
    }

    fn get_playlist(&self, id: i64) -> Result<Option<Playlist>> {
        let conn = self.conn.lock().unwrap();
        let playlist = conn
            .query_row(
                &format!("SELECT {} FROM playlist WHERE id = ?1", PLAYLIST_COLUMNS),
                params![id],
                playlist_from_row,
            )
            .optional()?;
        Ok(playlist)
    }

    fn get_playlist_tracks(&self, id: i64) -> Result<Vec<Track>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.title, t.artist, t.genre
             FROM playlist_track pt JOIN track t ON t.id = pt.track_id
             WHERE pt.playlist_id = ?1
             ORDER BY pt.position",
        )?;
        let tracks = stmt
            .query_map(params![id], |row| {
                Ok(Track {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    artist: row.get(2)?,
                    genre: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn list_playlists(&self, filter: &PlaylistFilter) -> Result<Vec<Playlist>> {
        let conn = self.conn.lock().unwrap();

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(space) = filter.space {
            clauses.push("space = ?");
            values.push(Box::new(space.as_str()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(owner_id) = filter.owner_id {
            clauses.push("owner_id = ?");
            values.push(Box::new(owner_id));
        }

        let mut sql = format!("SELECT {} FROM playlist", PLAYLIST_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let playlists = stmt
            .query_map(rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())), playlist_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(playlists)
    }

    fn update_space_status(
        &self,
        id: i64,
        from: (SpaceType, StatusFlag),
        to: (SpaceType, StatusFlag),
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE playlist SET space = ?1, status = ?2
             WHERE id = ?3 AND space = ?4 AND status = ?5",
            params![
                to.0.as_str(),
                to.1.as_str(),
                id,
                from.0.as_str(),
                from.1.as_str()
            ],
        )?;
        Ok(changed == 1)
    }

    fn promote_with_score(
        &self,
        id: i64,
        from: (SpaceType, StatusFlag),
        to: (SpaceType, StatusFlag),
        user_id: i64,
        score: f64,
        reason: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE playlist SET space = ?1, status = ?2
             WHERE id = ?3 AND space = ?4 AND status = ?5",
            params![
                to.0.as_str(),
                to.1.as_str(),
                id,
                from.0.as_str(),
                from.1.as_str()
            ],
        )?;
        if changed != 1 {
            // Nothing written yet, the transaction just goes away.
            return Ok(false);
        }

        tx.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (playlist_id, user_id)
             DO UPDATE SET score = ?3, reason = ?4, updated = cast(strftime('%s','now') as int)",
            params![id, user_id, score, reason],
        )?;

        tx.commit()?;
        Ok(true)
    }

    fn upsert_score(&self, playlist_id: i64, user_id: i64, score: f64, reason: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO playlist_score (playlist_id, user_id, score, reason)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (playlist_id, user_id)
             DO UPDATE SET score = ?3, reason = ?4, updated = cast(strftime('%s','now') as int)",
            params![playlist_id, user_id, score, reason],
        )?;
        Ok(())
    }

    fn get_score(&self, playlist_id: i64, user_id: i64) -> Result<Option<PlaylistScore>> {
        let conn = self.conn.lock().unwrap();
        let score = conn
            .query_row(
                "SELECT playlist_id, user_id, score, reason, updated
                 FROM playlist_score WHERE playlist_id = ?1 AND user_id = ?2",
                params![playlist_id, user_id],
                |row| {
                    Ok(PlaylistScore {
                        playlist_id: row.get(0)?,
                        user_id: row.get(1)?,
                        score: row.get(2)?,
                        reason: row.get(3)?,
                        updated: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(score)
    }

    fn delete_playlist(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM playlist WHERE id = ?1", params![id])?;
        Ok(deleted == 1)
    }

    fn platform_artist_frequencies(
        &self,
        owner_id: i64,
        limit: usize,
    ) -> Result<Vec<(String, u64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.artist, COUNT(*) AS freq
             FROM track t
             JOIN playlist_track pt ON pt.track_id = t.id
             JOIN playlist p ON p.id = pt.playlist_id
             WHERE p.owner_id = ?1 AND p.source = 'Platform'
             GROUP BY t.artist
             ORDER BY freq DESC, t.artist
             LIMIT ?2",
        )?;
        let frequencies = stmt
            .query_map(params![owner_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(frequencies)
    }

    fn platform_genre_frequencies(
        &self,
        owner_id: i64,
        limit: usize,
    ) -> Result<Vec<(String, u64)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT t.genre, COUNT(*) AS freq
             FROM track t
             JOIN playlist_track pt ON pt.track_id = t.id
             JOIN playlist p ON p.id = pt.playlist_id
             WHERE p.owner_id = ?1 AND p.source = 'Platform' AND t.genre IS NOT NULL
             GROUP BY t.genre
             ORDER BY freq DESC, t.genre
             LIMIT ?2",
        )?;
        let frequencies = stmt
            .query_map(params![owner_id, limit as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(frequencies)
    }

    fn playlists_count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM playlist", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
