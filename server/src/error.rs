use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// A failed request. Clients only ever see the route's fixed message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    pub fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    /// Constraint failures are the caller's fault; anything else is ours.
    pub fn from_store(message: &'static str, err: database::Error) -> Self {
        tracing::error!(error = %err, "{message}");

        let status = if err.is_constraint() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        Self { status, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_failures_are_bad_requests() {
        let err = ApiError::from_store(
            "nope",
            database::Error::Constraint {
                message: "duplicate key".to_string(),
            },
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_rows_are_server_errors() {
        let err = ApiError::from_store(
            "nope",
            database::Error::NotFound {
                entity: "song",
                id: 1,
            },
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn body_carries_only_the_message() {
        let body = serde_json::to_value(ErrorResponse { error: "無法建立歌曲" }).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "無法建立歌曲" }));
    }
}
