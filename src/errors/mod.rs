/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of a single search call. Transport-layer kinds and the decoding
/// kind are passed through the aggregator unchanged.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("decoding error: {0}")]
    Decoding(#[from] serde_json::Error),
}

impl From<url::ParseError> for SearchError {
    fn from(err: url::ParseError) -> Self {
        SearchError::InvalidAddress(err.to_string())
    }
}

/// Type alias for search results
pub type SearchResult<T> = Result<T, SearchError>;

/// Failures of the last-query store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Errors surfaced by the HTTP front end
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Search(SearchError::InvalidAddress(_)) => "INVALID_ADDRESS",
            ApiError::Search(SearchError::Transport(_)) => "UPSTREAM_ERROR",
            ApiError::Search(SearchError::Status { status, .. }) => match status {
                400..=499 => "UPSTREAM_4XX",
                500..=599 => "UPSTREAM_5XX",
                _ => "UPSTREAM_ERROR",
            },
            ApiError::Search(SearchError::UnexpectedShape(_)) => "UNEXPECTED_SHAPE",
            ApiError::Search(SearchError::Decoding(_)) => "DECODING_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Errors are reported in-band: HTTP 200 with ok=false
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_map_by_class() {
        let err = ApiError::from(SearchError::Status {
            status: 404,
            message: "missing".to_string(),
        });
        assert_eq!(err.code(), "UPSTREAM_4XX");

        let err = ApiError::from(SearchError::Status {
            status: 503,
            message: "down".to_string(),
        });
        assert_eq!(err.code(), "UPSTREAM_5XX");
    }

    #[test]
    fn test_decoding_error_code() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ApiError::from(SearchError::from(parse_err));
        assert_eq!(err.code(), "DECODING_ERROR");
    }

    #[test]
    fn test_url_parse_error_is_invalid_address() {
        let err = SearchError::from(url::Url::parse("not a url").unwrap_err());
        assert!(matches!(err, SearchError::InvalidAddress(_)));
    }
}
