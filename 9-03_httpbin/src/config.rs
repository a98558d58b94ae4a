//! 환경 변수 기반 서버 설정
//!
//! - `HTTPBIN_ADDR`: 바인딩 주소 (기본값 `127.0.0.1:3000`)
//! - `HTTPBIN_REQUEST_TIMEOUT_SECS`: 응답 헤더까지의 요청 타임아웃 (기본값 30초)

use std::{net::SocketAddr, str::FromStr, time::Duration};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let addr = parse_or("HTTPBIN_ADDR", lookup("HTTPBIN_ADDR"), defaults.addr);
        let request_timeout = parse_or(
            "HTTPBIN_REQUEST_TIMEOUT_SECS",
            lookup("HTTPBIN_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );

        Self {
            addr,
            request_timeout: Duration::from_secs(request_timeout),
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    let Some(value) = value else {
        return default;
    };

    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, %value, ?default, "invalid config value, using default");
            default
        }
    }
}
