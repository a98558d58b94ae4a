//! `GET /drip` 핸들러와 drip 이벤트를 스트리밍 body 로 재생하는 부분.
//!
//! ```not_rust
//! curl -N "http://127.0.0.1:3000/drip?duration=5&numbytes=20&delay=1&code=200"
//! ```

use std::{convert::Infallible, time::Duration};

use axum::{
    body::{Body, Bytes},
    extract::Query,
    http::{header, StatusCode},
    response::IntoResponse,
};
use futures::stream;
use serde::Deserialize;
use tokio::time::{sleep, Instant};

use crate::{
    drip::{drip, DripEvent},
    query::lenient,
};

/// 응답 body 에 쓰이는 바이트 ('*')
pub const FILL_BYTE: u8 = b'*';

/// 한 요청에서 흘려보낼 수 있는 최대 바이트 수 (100KiB)
pub const MAX_BYTES: i64 = 100 * 1024;

const MAX_SECS: f64 = 10.0;
const DEFAULT_SECS: f64 = 2.0;
const DEFAULT_NUM_BYTES: i64 = 10;

// The query parameters for drip
#[derive(Debug, Default, Deserialize)]
pub struct DripQuery {
    #[serde(default, deserialize_with = "lenient")]
    duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    numbytes: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    code: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<u16>,
    #[serde(default, deserialize_with = "lenient")]
    delay: Option<i64>,
}

/// 클램핑이 끝난 drip 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct DripSettings {
    pub duration: Duration,
    pub num_bytes: usize,
    pub status: StatusCode,
    pub delay: Duration,
}

impl From<DripQuery> for DripSettings {
    fn from(query: DripQuery) -> Self {
        let duration = query
            .duration
            .filter(|secs| !secs.is_nan())
            .unwrap_or(DEFAULT_SECS)
            .clamp(0.0, MAX_SECS);

        let num_bytes = query
            .numbytes
            .unwrap_or(DEFAULT_NUM_BYTES)
            .clamp(0, MAX_BYTES);

        // 범위 밖의 코드는 기본값 200 으로
        let status = query
            .code
            .or(query.status)
            .filter(|code| (100..=599).contains(code))
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::OK);

        let delay = query
            .delay
            .unwrap_or(DEFAULT_SECS as i64)
            .clamp(0, MAX_SECS as i64);

        Self {
            duration: Duration::from_secs_f64(duration),
            num_bytes: num_bytes as usize,
            status,
            delay: Duration::from_secs(delay as u64),
        }
    }
}

/// 🚰 GET /drip
pub async fn drip_handler(Query(query): Query<DripQuery>) -> impl IntoResponse {
    let settings = DripSettings::from(query);
    tracing::debug!(?settings, "starting drip");

    if !settings.delay.is_zero() {
        sleep(settings.delay).await;
    }

    // 요청마다 독립적인 시계. tokio 의 Instant 라서 테스트의 paused time 을 따른다.
    let started = Instant::now();
    let events = drip(
        settings.num_bytes,
        settings.duration.as_millis() as u64,
        move || started.elapsed().as_millis() as u64,
    );

    (
        settings.status,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        drip_body(events, FILL_BYTE),
    )
}

/// Plays drip events back as a streamed body.
///
/// `Delay` yields to the runtime with `tokio::time::sleep`, `Bytes(n)` becomes
/// one chunk of `n` fill bytes. When the client goes away hyper drops the
/// body and no further events are pulled.
pub fn drip_body<I>(events: I, fill: u8) -> Body
where
    I: Iterator<Item = DripEvent> + Send + 'static,
{
    let stream = stream::unfold(events, move |mut events| async move {
        loop {
            match events.next() {
                None => return None,
                Some(DripEvent::Delay(ms)) => {
                    tracing::trace!(ms, "drip delay");
                    sleep(Duration::from_millis(ms)).await;
                }
                Some(DripEvent::Bytes(n)) => {
                    tracing::trace!(n, "drip write");
                    let chunk = Bytes::from(vec![fill; n]);
                    return Some((Ok::<_, Infallible>(chunk), events));
                }
            }
        }
    });

    Body::from_stream(stream)
}
