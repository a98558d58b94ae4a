//! 랜덤 바이트를 돌려주는 `/bytes/{n}`, `/stream-bytes/{n}` 핸들러.
//!
//! `seed` 를 주면 같은 바이트열이 재현된다.
//!
//! ```not_rust
//! curl "http://127.0.0.1:3000/bytes/16?seed=42" | xxd
//! curl -N "http://127.0.0.1:3000/stream-bytes/4096?chunk_size=512"
//! ```

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Path, Query},
    http::header,
    response::IntoResponse,
};
use futures::stream;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::Deserialize;

use crate::{error::AppError, query::lenient, stream::MAX_BYTES};

const DEFAULT_CHUNK_SIZE: usize = 10 * 1024;

#[derive(Debug, Deserialize)]
pub struct BytesQuery {
    seed: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    chunk_size: Option<usize>,
}

/// GET /bytes/{n}
pub async fn bytes(
    Path(n): Path<i64>,
    Query(query): Query<BytesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let data = random_bytes(n, query.seed.as_deref())?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// GET /stream-bytes/{n}
pub async fn stream_bytes(
    Path(n): Path<i64>,
    Query(query): Query<BytesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let data = random_bytes(n, query.seed.as_deref())?;
    let chunk_size = query
        .chunk_size
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_CHUNK_SIZE);

    // Bytes::slice 는 복사 없이 같은 버퍼를 공유함
    let chunks = (0..data.len())
        .step_by(chunk_size)
        .map(|start| {
            let end = (start + chunk_size).min(data.len());
            Ok::<_, Infallible>(data.slice(start..end))
        })
        .collect::<Vec<_>>();

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        Body::from_stream(stream::iter(chunks)),
    ))
}

fn random_bytes(n: i64, seed: Option<&str>) -> Result<Bytes, AppError> {
    let mut rng = rng_from_seed(seed)?;
    let mut data = vec![0; n.clamp(0, MAX_BYTES) as usize];
    rng.fill_bytes(&mut data);
    Ok(Bytes::from(data))
}

fn rng_from_seed(seed: Option<&str>) -> Result<StdRng, AppError> {
    let Some(seed) = seed else {
        return Ok(StdRng::from_entropy());
    };

    let seed = seed.trim();
    seed.parse::<i64>()
        .map(|seed| seed as u64)
        .or_else(|_| seed.parse::<u64>())
        .map(StdRng::seed_from_u64)
        .map_err(|_| AppError::InvalidSeed)
}
