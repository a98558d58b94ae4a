//! 핸들러와 미들웨어에서 발생하는 에러를 HTTP 응답으로 변환

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    BoxError,
};

// ✨ 앱 전용 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid seed. Expected an integer.")]
    InvalidSeed,

    #[error("Invalid status code")]
    InvalidStatus,

    #[error("request timed out")]
    Timeout,

    #[error("Unhandled internal error: {0}")]
    Internal(BoxError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidSeed | AppError::InvalidStatus => StatusCode::BAD_REQUEST,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ✨ 에러를 plain text 응답으로 변환
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(err = %self, "request failed");
        } else {
            tracing::debug!(err = %self, "rejecting request");
        }

        (status, self.to_string()).into_response()
    }
}

/// `HandleErrorLayer` 에서 사용하는 미들웨어 에러 변환
pub async fn handle_middleware_error(error: BoxError) -> AppError {
    if error.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(error)
    }
}
