//! `/status/{code}` 와 `/delay/{n}` 핸들러

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, Method, StatusCode, Uri},
    Json,
};
use serde_json::Value;
use tokio::time::sleep;

use crate::{
    echo::{EchoRequest, Origin},
    error::AppError,
};

const MAX_DELAY_SECS: i64 = 10;

/// ANY /status/{code}
pub async fn status(Path(code): Path<String>) -> Result<StatusCode, AppError> {
    parse_status(&code).ok_or(AppError::InvalidStatus)
}

fn parse_status(code: &str) -> Option<StatusCode> {
    code.trim()
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
        .and_then(|code| StatusCode::from_u16(code).ok())
}

/// GET /delay/{n}
///
/// n 초(최대 10초) 기다린 뒤 `/get` 과 같은 echo 응답을 돌려준다.
pub async fn delay(
    Path(secs): Path<i64>,
    method: Method,
    Origin(origin): Origin,
    uri: Uri,
    headers: HeaderMap,
    Query(args): Query<Vec<(String, String)>>,
) -> Json<Value> {
    let secs = secs.clamp(0, MAX_DELAY_SECS) as u64;
    tracing::debug!(secs, "delaying response");
    sleep(Duration::from_secs(secs)).await;

    Json(
        EchoRequest {
            method,
            origin,
            uri,
            headers,
            args,
            body: Bytes::new(),
        }
        .into_json(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_codes() {
        assert_eq!(parse_status("204"), Some(StatusCode::NO_CONTENT));
        assert_eq!(parse_status("418"), Some(StatusCode::IM_A_TEAPOT));
        assert_eq!(parse_status("599"), StatusCode::from_u16(599).ok());
    }

    #[test]
    fn rejects_invalid_codes() {
        assert_eq!(parse_status("abc"), None);
        assert_eq!(parse_status("99"), None);
        assert_eq!(parse_status("600"), None);
        assert_eq!(parse_status("-200"), None);
    }
}
