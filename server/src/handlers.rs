//! Route handlers. Each one is a single store call wrapped in JSON.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use database::models::{DefinedInstrument, NewSong, NewUser, Song, SongDetail, SongInstrument, User};

use crate::error::ApiError;
use crate::requests::{
    CreateSongRequest, CreateUserRequest, UpdateProgressRequest, UpdateStatusRequest,
};
use crate::server::AppState;

const LIST_SONGS_FAILED: &str = "無法讀取歌曲列表";
const CREATE_SONG_FAILED: &str = "無法建立歌曲";
const UPDATE_STATUS_FAILED: &str = "無法更新歌曲狀態";
const DELETE_SONG_FAILED: &str = "無法刪除歌曲";
const UPDATE_PROGRESS_FAILED: &str = "無法更新練習進度";
const LIST_INSTRUMENTS_FAILED: &str = "無法讀取樂器列表";
const CREATE_USER_FAILED: &str = "建立使用者失敗，可能是 Email 重複了";

pub const USER_ID_HEADER: &str = "x-user-id";

type ApiResult<T> = Result<Json<T>, ApiError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>, message: &'static str) -> Result<T, ApiError> {
    payload.map(|Json(inner)| inner).map_err(|rejection| {
        tracing::debug!(%rejection, "rejected request body");
        ApiError::bad_request(message)
    })
}

fn path_id(id: Result<Path<i32>, PathRejection>, message: &'static str) -> Result<i32, ApiError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(%rejection, "rejected path id");
        ApiError::bad_request(message)
    })
}

/// Owner for new rows: the `x-user-id` header, else the configured default.
fn owner_id(headers: &HeaderMap, default: i32) -> Option<i32> {
    match headers.get(USER_ID_HEADER) {
        None => Some(default),
        Some(value) => value.to_str().ok()?.trim().parse().ok(),
    }
}

pub async fn root() -> &'static str {
    "🎸 GrooveLog API is running! Let's Rock!"
}

pub async fn list_songs(State(state): State<Arc<AppState>>) -> ApiResult<Vec<SongDetail>> {
    state
        .store
        .list_active_songs()
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(LIST_SONGS_FAILED, e))
}

pub async fn create_song(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateSongRequest>, JsonRejection>,
) -> ApiResult<SongDetail> {
    let user_id = owner_id(&headers, state.config.default_user_id)
        .ok_or(ApiError::bad_request(CREATE_SONG_FAILED))?;
    let req = body(payload, CREATE_SONG_FAILED)?;

    let created = state
        .store
        .create_song(NewSong {
            title: req.title,
            artist: req.artist,
            youtube_url: req.youtube_url,
            user_id,
            instrument_ids: req.instrument_ids,
        })
        .await
        .map_err(|e| ApiError::from_store(CREATE_SONG_FAILED, e))?;

    tracing::info!(song_id = created.song.id, user_id, "song created");
    Ok(Json(created))
}

pub async fn update_song_status(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Song> {
    let song_id = path_id(id, UPDATE_STATUS_FAILED)?;
    let status = body(payload, UPDATE_STATUS_FAILED)?.status;

    state
        .store
        .update_song_status(song_id, status)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(UPDATE_STATUS_FAILED, e))
}

pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Song> {
    let song_id = path_id(id, DELETE_SONG_FAILED)?;

    let archived = state
        .store
        .archive_song(song_id)
        .await
        .map_err(|e| ApiError::from_store(DELETE_SONG_FAILED, e))?;

    tracing::info!(song_id, "song archived");
    Ok(Json(archived))
}

pub async fn update_instrument_progress(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateProgressRequest>, JsonRejection>,
) -> ApiResult<SongInstrument> {
    let song_instrument_id = path_id(id, UPDATE_PROGRESS_FAILED)?;
    let progress = body(payload, UPDATE_PROGRESS_FAILED)?
        .progress
        .to_i32()
        .ok_or(ApiError::bad_request(UPDATE_PROGRESS_FAILED))?;

    state
        .store
        .update_instrument_progress(song_instrument_id, progress)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(UPDATE_PROGRESS_FAILED, e))
}

pub async fn list_instruments(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<DefinedInstrument>> {
    state
        .store
        .list_defined_instruments()
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(LIST_INSTRUMENTS_FAILED, e))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<User> {
    let req = body(payload, CREATE_USER_FAILED)?;

    // stored as-is until password hashing lands
    let user = state
        .store
        .create_user(NewUser {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(|e| ApiError::from_store(CREATE_USER_FAILED, e))?;

    tracing::info!(user_id = user.id, "user created");
    Ok(Json(user))
}
