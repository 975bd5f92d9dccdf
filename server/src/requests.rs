//! Request bodies accepted by the JSON routes.

use database::models::SongStatus;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateSongRequest {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(rename = "instrumentIds", default)]
    pub instrument_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SongStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub progress: Numeric,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A value clients may send either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Truncates toward zero and saturates at the `i32` bounds.
    pub fn to_i32(&self) -> Option<i32> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };

        value.is_finite().then_some(value as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(json: &str) -> Option<i32> {
        serde_json::from_str::<UpdateProgressRequest>(json)
            .ok()?
            .progress
            .to_i32()
    }

    #[test]
    fn progress_is_coerced_like_a_numeric_cast() {
        assert_eq!(progress(r#"{"progress": 40}"#), Some(40));
        assert_eq!(progress(r#"{"progress": 72.9}"#), Some(72));
        assert_eq!(progress(r#"{"progress": "85"}"#), Some(85));
        assert_eq!(progress(r#"{"progress": 250}"#), Some(250));
        assert_eq!(progress(r#"{"progress": "lots"}"#), None);
        assert_eq!(progress(r#"{"progress": null}"#), None);
    }

    #[test]
    fn instrument_ids_use_the_camel_case_key() {
        let req: CreateSongRequest = serde_json::from_str(
            r#"{"title": "Hysteria", "artist": "Muse", "youtube_url": null, "instrumentIds": [2]}"#,
        )
        .unwrap();
        assert_eq!(req.instrument_ids, vec![2]);
        assert!(req.youtube_url.is_none());
    }

    #[test]
    fn status_must_be_a_known_variant() {
        let req: UpdateStatusRequest = serde_json::from_str(r#"{"status": "ARCHIVED"}"#).unwrap();
        assert_eq!(req.status, SongStatus::Archived);

        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status": "archived"}"#).is_err());
        assert!(serde_json::from_str::<UpdateStatusRequest>(r#"{"status": "DONE"}"#).is_err());
    }
}
