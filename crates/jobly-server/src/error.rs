//! Translation of failures into HTTP responses.

use crate::auth::AuthError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jobly::JoblyError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Jobly(#[from] JoblyError),

    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Request could not be read (bad JSON, query string or path).
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Jobly(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Jobly(err) if err.is_duplicate() || err.is_validation() => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Jobly(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown to the client for a 4xx response.
    fn client_message(&self) -> String {
        match self {
            ApiError::Jobly(
                JoblyError::NotFound(m) | JoblyError::Duplicate(m) | JoblyError::Validation(m),
            ) => m.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.client_message()
        };

        let body = json!({
            "error": {
                "message": message,
                "status": status.as_u16(),
            }
        });
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn kinds_map_to_status() {
        let cases = [
            (ApiError::from(JoblyError::not_found("x")), 404),
            (ApiError::from(JoblyError::duplicate("x")), 400),
            (ApiError::from(JoblyError::validation("No data")), 400),
            (
                ApiError::from(JoblyError::ForeignKeyViolation("fk".into())),
                400,
            ),
            (ApiError::from(AuthError::NotAdmin), 401),
            (ApiError::from(AuthError::MissingToken), 401),
            (ApiError::from(JoblyError::Other("boom".into())), 500),
            (
                ApiError::from(JoblyError::decode("salary", "bad int")),
                500,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
        }
    }

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let (status, body) = body_of(JoblyError::Other("password=hunter2".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert_eq!(body["error"]["status"], 500);
    }

    #[tokio::test]
    async fn client_errors_carry_their_message() {
        let (status, body) = body_of(JoblyError::not_found("No company: nope").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No company: nope");
        assert_eq!(body["error"]["status"], 404);
    }
}
