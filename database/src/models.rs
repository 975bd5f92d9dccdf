use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "song_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SongStatus {
    Practicing,
    Archived,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Holds the password exactly as submitted; nothing hashes it yet.
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Song {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub youtube_url: Option<String>,
    pub user_id: i32,
    pub status: SongStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub youtube_url: Option<String>,
    pub user_id: i32,
    pub instrument_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DefinedInstrument {
    pub id: i32,
    pub name: String,
}

/// Practice progress of one catalog instrument on one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SongInstrument {
    pub id: i32,
    pub song_id: i32,
    pub instrument_id: i32,
    pub progress: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SongInstrumentDetail {
    #[serde(flatten)]
    pub row: SongInstrument,
    pub instrument: DefinedInstrument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongDetail {
    #[serde(flatten)]
    pub song: Song,
    pub instruments: Vec<SongInstrumentDetail>,
}
