//! 요청 정보를 JSON 으로 되돌려주는 echo 계열 핸들러
//! (`/get`, `/post`, `/anything`, `/headers`, `/ip`, `/user-agent`, `/uuid`).

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap, Method, Uri},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// 클라이언트 주소 추출기.
///
/// `X-Forwarded-For` 가 있으면 첫 번째 주소를, 없으면 `ConnectInfo` 의 IP 를 사용한다.
/// oneshot 테스트처럼 둘 다 없으면 `None`.
pub struct Origin(pub Option<String>);

impl<S> FromRequestParts<S> for Origin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|addr| addr.trim().to_owned())
            .filter(|addr| !addr.is_empty());

        if forwarded.is_some() {
            return Ok(Self(forwarded));
        }

        // ConnectInfo 추출기를 거쳐야 테스트용 MockConnectInfo 도 인식됨
        let connected = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(connected))
    }
}

/// 요청 한 건의 echo 응답에 필요한 정보
pub struct EchoRequest {
    pub method: Method,
    pub origin: Option<String>,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub args: Vec<(String, String)>,
    pub body: Bytes,
}

impl EchoRequest {
    pub fn into_json(self) -> Value {
        let host = self
            .headers
            .get(header::HOST)
            .and_then(|host| host.to_str().ok())
            .unwrap_or("localhost");

        let mut echo = json!({
            "args": args_json(self.args),
            "headers": headers_json(&self.headers),
            "method": self.method.as_str(),
            "origin": self.origin,
            "url": format!("http://{host}{}", self.uri),
        });

        if has_body(&self.method) {
            echo["data"] = Value::from(String::from_utf8_lossy(&self.body).into_owned());
            echo["json"] = serde_json::from_slice(&self.body).unwrap_or(Value::Null);
        }

        echo
    }
}

fn has_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// 같은 키가 여러 번 오면 배열로 묶음 (`?a=1&a=2` → `"a": ["1", "2"]`)
fn args_json(args: Vec<(String, String)>) -> Value {
    let mut map = Map::new();

    for (key, value) in args {
        match map.get_mut(&key) {
            None => {
                map.insert(key, Value::from(value));
            }
            Some(Value::Array(values)) => values.push(Value::from(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::from(value)]);
            }
        }
    }

    Value::Object(map)
}

fn headers_json(headers: &HeaderMap) -> Value {
    let map = headers
        .keys()
        .map(|name| {
            let value = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_owned(), Value::from(value))
        })
        .collect::<Map<_, _>>();

    Value::Object(map)
}

/// GET /get, POST /post, ... , ANY /anything
pub async fn echo(
    method: Method,
    Origin(origin): Origin,
    uri: Uri,
    headers: HeaderMap,
    Query(args): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Json<Value> {
    Json(
        EchoRequest {
            method,
            origin,
            uri,
            headers,
            args,
            body,
        }
        .into_json(),
    )
}

/// GET /headers
pub async fn headers(headers: HeaderMap) -> Json<Value> {
    Json(json!({ "headers": headers_json(&headers) }))
}

/// GET /ip
pub async fn ip(Origin(origin): Origin) -> Json<Value> {
    Json(json!({ "origin": origin }))
}

/// GET /user-agent
pub async fn user_agent(headers: HeaderMap) -> Json<Value> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    Json(json!({ "user-agent": user_agent }))
}

/// GET /uuid
pub async fn uuid() -> Json<Value> {
    Json(json!({ "uuid": Uuid::new_v4() }))
}
