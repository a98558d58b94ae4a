//! 쿼리 파라미터를 "거절하지 않고" 읽기 위한 serde 헬퍼.
//!
//! httpbin 은 잘못된 숫자 파라미터에 에러를 내지 않고 기본값으로 돌아가므로,
//! 빈 문자열이나 파싱 불가능한 값은 모두 `None` 으로 취급한다.

use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Serde deserialization decorator that maps empty or unparsable strings to `None`.
pub fn lenient<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let opt = Option::<String>::deserialize(de)?;
    Ok(opt
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok()))
}
