use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, instrument};

pub mod error;
pub mod models;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use store::{InMemoryStore, Store};

use models::{
    DefinedInstrument, NewSong, NewUser, Song, SongDetail, SongInstrument, SongInstrumentDetail,
    SongStatus, User,
};

const SONG_COLUMNS: &str = "id, title, artist, youtube_url, user_id, status, created_at";

#[derive(sqlx::FromRow)]
struct InstrumentRow {
    id: i32,
    song_id: i32,
    instrument_id: i32,
    progress: i32,
    name: String,
}

impl From<InstrumentRow> for SongInstrumentDetail {
    fn from(row: InstrumentRow) -> Self {
        Self {
            row: SongInstrument {
                id: row.id,
                song_id: row.song_id,
                instrument_id: row.instrument_id,
                progress: row.progress,
            },
            instrument: DefinedInstrument {
                id: row.instrument_id,
                name: row.name,
            },
        }
    }
}

pub struct Database {
    pool: sqlx::Pool<sqlx::Postgres>,
}

impl Database {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Creates missing tables and seeds the instrument catalog.
    #[instrument(skip(self), level = "trace")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::Executor::execute(&self.pool, schema::CREATE_TABLES).await?;

        let seeded = sqlx::query(schema::SEED_CATALOG)
            .bind(schema::CATALOG)
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!(n_rows = seeded, "seeded instrument catalog");

        Ok(())
    }

    async fn instruments_for(&self, song_ids: &[i32]) -> Result<Vec<InstrumentRow>> {
        let rows = sqlx::query_as(
            "
            select si.id, si.song_id, si.instrument_id, si.progress, di.name
            from song_instruments si
            join defined_instruments di on di.id = si.instrument_id
            where si.song_id = any($1)
            order by si.id
        ",
        )
        .bind(song_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl Store for Database {
    #[instrument(skip(self), level = "trace")]
    async fn list_active_songs(&self) -> Result<Vec<SongDetail>> {
        let songs: Vec<Song> = sqlx::query_as(&format!(
            "
            select {SONG_COLUMNS} from songs
            where status <> 'ARCHIVED'
            order by created_at desc, id desc
        "
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = songs.iter().map(|song| song.id).collect();
        let mut by_song: HashMap<i32, Vec<SongInstrumentDetail>> = HashMap::new();
        for row in self.instruments_for(&ids).await? {
            by_song.entry(row.song_id).or_default().push(row.into());
        }

        Ok(songs
            .into_iter()
            .map(|song| SongDetail {
                instruments: by_song.remove(&song.id).unwrap_or_default(),
                song,
            })
            .collect())
    }

    #[instrument(skip(self), ret, level = "trace")]
    async fn create_song(&self, new: NewSong) -> Result<SongDetail> {
        let mut tx = self.pool.begin().await?;

        let song: Song = sqlx::query_as(&format!(
            "
            insert into songs(title, artist, youtube_url, user_id, status)
            values ($1, $2, $3, $4, $5)
            returning {SONG_COLUMNS}
        "
        ))
        .bind(&new.title)
        .bind(&new.artist)
        .bind(&new.youtube_url)
        .bind(new.user_id)
        .bind(SongStatus::Practicing)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query(
            "
            insert into song_instruments(song_id, instrument_id, progress)
            select $1, unnest($2::int4[]), 0
        ",
        )
        .bind(song.id)
        .bind(&new.instrument_ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        debug!(n_rows = inserted, song_id = song.id, "inserted song instruments");

        tx.commit().await?;

        let instruments = self
            .instruments_for(&[song.id])
            .await?
            .into_iter()
            .map(SongInstrumentDetail::from)
            .collect();

        Ok(SongDetail { song, instruments })
    }

    #[instrument(skip(self), level = "trace")]
    async fn update_song_status(&self, song_id: i32, status: SongStatus) -> Result<Song> {
        let song: Option<Song> = sqlx::query_as(&format!(
            "update songs set status = $2 where id = $1 returning {SONG_COLUMNS}"
        ))
        .bind(song_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        song.ok_or(Error::NotFound {
            entity: "song",
            id: song_id,
        })
    }

    #[instrument(skip(self), level = "trace")]
    async fn update_instrument_progress(
        &self,
        song_instrument_id: i32,
        progress: i32,
    ) -> Result<SongInstrument> {
        let row: Option<SongInstrument> = sqlx::query_as(
            "
            update song_instruments set progress = $2
            where id = $1
            returning id, song_id, instrument_id, progress
        ",
        )
        .bind(song_instrument_id)
        .bind(progress)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(Error::NotFound {
            entity: "song instrument",
            id: song_instrument_id,
        })
    }

    #[instrument(skip(self), level = "trace")]
    async fn list_defined_instruments(&self) -> Result<Vec<DefinedInstrument>> {
        let instruments = sqlx::query_as("select id, name from defined_instruments order by id")
            .fetch_all(&self.pool)
            .await?;

        Ok(instruments)
    }

    #[instrument(skip(self, new), fields(username = %new.username), level = "trace")]
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let user = sqlx::query_as(
            "
            insert into users(username, email, password_hash)
            values ($1, $2, $3)
            returning id, username, email, password_hash, created_at
        ",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
