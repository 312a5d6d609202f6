use axum::http::StatusCode;
use thiserror::Error;

/// Failure at the data-source boundary.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode records: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("data source error: {0}")]
    Upstream(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: err.to_string(),
        }
    }
}

impl From<crate::date_key::ParseDateKeyError> for AppError {
    fn from(err: crate::date_key::ParseDateKeyError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
