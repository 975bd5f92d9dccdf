use async_trait::async_trait;
use parking_lot::RwLock;
use time::OffsetDateTime;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::models::{
    DefinedInstrument, NewSong, NewUser, Song, SongDetail, SongInstrument, SongInstrumentDetail,
    SongStatus, User,
};
use crate::schema::CATALOG;

/// Persistence operations behind every route.
#[async_trait]
pub trait Store: Send + Sync {
    /// Songs that are not archived, newest first, with their instruments.
    async fn list_active_songs(&self) -> Result<Vec<SongDetail>>;

    /// Creates a practicing song and one zero-progress row per instrument id.
    async fn create_song(&self, song: NewSong) -> Result<SongDetail>;

    async fn update_song_status(&self, song_id: i32, status: SongStatus) -> Result<Song>;

    /// Soft delete: the row and its instruments stay, only the status moves.
    async fn archive_song(&self, song_id: i32) -> Result<Song> {
        self.update_song_status(song_id, SongStatus::Archived).await
    }

    /// Progress is written as given, without clamping.
    async fn update_instrument_progress(
        &self,
        song_instrument_id: i32,
        progress: i32,
    ) -> Result<SongInstrument>;

    async fn list_defined_instruments(&self) -> Result<Vec<DefinedInstrument>>;

    async fn create_user(&self, user: NewUser) -> Result<User>;
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    songs: Vec<Song>,
    instruments: Vec<DefinedInstrument>,
    song_instruments: Vec<SongInstrument>,
}

impl Tables {
    fn detail(&self, song: &Song) -> SongDetail {
        let instruments = self
            .song_instruments
            .iter()
            .filter(|row| row.song_id == song.id)
            .filter_map(|row| {
                self.instruments
                    .iter()
                    .find(|instrument| instrument.id == row.instrument_id)
                    .map(|instrument| SongInstrumentDetail {
                        row: row.clone(),
                        instrument: instrument.clone(),
                    })
            })
            .collect();

        SongDetail {
            song: song.clone(),
            instruments,
        }
    }
}

fn next_id(len: usize) -> i32 {
    len as i32 + 1
}

/// Store kept in process memory, seeded with the instrument catalog.
///
/// Enforces the same constraints as the postgres schema so it can stand in
/// for it during development and tests.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let instruments = CATALOG
            .iter()
            .enumerate()
            .map(|(index, name)| DefinedInstrument {
                id: next_id(index),
                name: name.to_string(),
            })
            .collect();

        Self {
            tables: RwLock::new(Tables {
                instruments,
                ..Default::default()
            }),
        }
    }

    pub fn song(&self, song_id: i32) -> Option<SongDetail> {
        let tables = self.tables.read();
        tables
            .songs
            .iter()
            .find(|song| song.id == song_id)
            .map(|song| tables.detail(song))
    }

    pub fn user_count(&self) -> usize {
        self.tables.read().users.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    #[instrument(skip(self), level = "trace")]
    async fn list_active_songs(&self) -> Result<Vec<SongDetail>> {
        let tables = self.tables.read();
        let mut songs: Vec<&Song> = tables
            .songs
            .iter()
            .filter(|song| song.status != SongStatus::Archived)
            .collect();
        songs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(songs.into_iter().map(|song| tables.detail(song)).collect())
    }

    #[instrument(skip(self), level = "trace")]
    async fn create_song(&self, new: NewSong) -> Result<SongDetail> {
        let mut tables = self.tables.write();

        if !tables.users.iter().any(|user| user.id == new.user_id) {
            return Err(Error::Constraint {
                message: format!("user {} does not exist", new.user_id),
            });
        }
        if let Some(missing) = new
            .instrument_ids
            .iter()
            .find(|id| !tables.instruments.iter().any(|i| i.id == **id))
        {
            return Err(Error::Constraint {
                message: format!("defined instrument {missing} does not exist"),
            });
        }

        let song = Song {
            id: next_id(tables.songs.len()),
            title: new.title,
            artist: new.artist,
            youtube_url: new.youtube_url,
            user_id: new.user_id,
            status: SongStatus::Practicing,
            created_at: OffsetDateTime::now_utc(),
        };
        for instrument_id in new.instrument_ids {
            let id = next_id(tables.song_instruments.len());
            tables.song_instruments.push(SongInstrument {
                id,
                song_id: song.id,
                instrument_id,
                progress: 0,
            });
        }
        tables.songs.push(song.clone());

        Ok(tables.detail(&song))
    }

    #[instrument(skip(self), level = "trace")]
    async fn update_song_status(&self, song_id: i32, status: SongStatus) -> Result<Song> {
        let mut tables = self.tables.write();
        let song = tables
            .songs
            .iter_mut()
            .find(|song| song.id == song_id)
            .ok_or(Error::NotFound {
                entity: "song",
                id: song_id,
            })?;
        song.status = status;

        Ok(song.clone())
    }

    #[instrument(skip(self), level = "trace")]
    async fn update_instrument_progress(
        &self,
        song_instrument_id: i32,
        progress: i32,
    ) -> Result<SongInstrument> {
        let mut tables = self.tables.write();
        let row = tables
            .song_instruments
            .iter_mut()
            .find(|row| row.id == song_instrument_id)
            .ok_or(Error::NotFound {
                entity: "song instrument",
                id: song_instrument_id,
            })?;
        row.progress = progress;

        Ok(row.clone())
    }

    #[instrument(skip(self), level = "trace")]
    async fn list_defined_instruments(&self) -> Result<Vec<DefinedInstrument>> {
        Ok(self.tables.read().instruments.clone())
    }

    #[instrument(skip(self, new), fields(username = %new.username), level = "trace")]
    async fn create_user(&self, new: NewUser) -> Result<User> {
        let mut tables = self.tables.write();

        if tables.users.iter().any(|user| user.email == new.email) {
            return Err(Error::Constraint {
                message: format!("email {} is already registered", new.email),
            });
        }

        let user = User {
            id: next_id(tables.users.len()),
            username: new.username,
            email: new.email,
            password_hash: new.password,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.push(user.clone());

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_user(NewUser {
                username: "demo".to_string(),
                email: "demo@groovelog.dev".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();
        store
    }

    fn new_song(title: &str, instrument_ids: Vec<i32>) -> NewSong {
        NewSong {
            title: title.to_string(),
            artist: "Ben E. King".to_string(),
            youtube_url: Some("https://youtu.be/hwZNL7QVJjE".to_string()),
            user_id: 1,
            instrument_ids,
        }
    }

    #[tokio::test]
    async fn created_song_gets_one_zero_progress_row_per_instrument() {
        let store = store_with_user().await;

        let created = store
            .create_song(new_song("Stand By Me", vec![1, 2, 3]))
            .await
            .unwrap();

        assert_eq!(created.song.status, SongStatus::Practicing);
        assert_eq!(created.instruments.len(), 3);
        assert!(created.instruments.iter().all(|i| i.row.progress == 0));
        let names: Vec<_> = created
            .instruments
            .iter()
            .map(|i| i.instrument.name.as_str())
            .collect();
        assert_eq!(names, ["Guitar", "Bass", "Drums"]);
    }

    #[tokio::test]
    async fn unknown_instrument_or_owner_is_a_constraint_failure() {
        let store = store_with_user().await;

        let err = store
            .create_song(new_song("Stand By Me", vec![1, 99]))
            .await
            .unwrap_err();
        assert!(err.is_constraint());

        let mut orphan = new_song("Stand By Me", vec![]);
        orphan.user_id = 42;
        assert!(store.create_song(orphan).await.unwrap_err().is_constraint());

        assert!(store.list_active_songs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_skips_archived_and_is_newest_first() {
        let store = store_with_user().await;
        for title in ["first", "second", "third"] {
            store.create_song(new_song(title, vec![1])).await.unwrap();
        }

        store.archive_song(2).await.unwrap();

        let titles: Vec<_> = store
            .list_active_songs()
            .await
            .unwrap()
            .into_iter()
            .map(|detail| detail.song.title)
            .collect();
        assert_eq!(titles, ["third", "first"]);
    }

    #[tokio::test]
    async fn archiving_keeps_the_row_and_its_instruments() {
        let store = store_with_user().await;
        let created = store
            .create_song(new_song("Stand By Me", vec![1, 2]))
            .await
            .unwrap();

        let archived = store.archive_song(created.song.id).await.unwrap();

        assert_eq!(archived.status, SongStatus::Archived);
        let kept = store.song(created.song.id).unwrap();
        assert_eq!(
            Song {
                status: SongStatus::Practicing,
                ..kept.song.clone()
            },
            created.song
        );
        assert_eq!(kept.instruments, created.instruments);
    }

    #[tokio::test]
    async fn progress_is_not_clamped() {
        let store = store_with_user().await;
        store
            .create_song(new_song("Stand By Me", vec![1]))
            .await
            .unwrap();

        assert_eq!(store.update_instrument_progress(1, 150).await.unwrap().progress, 150);
        assert_eq!(store.update_instrument_progress(1, -5).await.unwrap().progress, -5);
    }

    #[tokio::test]
    async fn missing_rows_are_reported() {
        let store = store_with_user().await;

        assert!(store.archive_song(3).await.unwrap_err().is_not_found());
        assert!(store
            .update_instrument_progress(3, 10)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn duplicate_email_writes_nothing() {
        let store = store_with_user().await;

        let err = store
            .create_user(NewUser {
                username: "someone else".to_string(),
                email: "demo@groovelog.dev".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        assert!(err.is_constraint());
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn catalog_is_seeded() {
        let store = InMemoryStore::new();
        let names: Vec<_> = store
            .list_defined_instruments()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, CATALOG);
    }
}
