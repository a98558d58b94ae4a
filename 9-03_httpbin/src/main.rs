//! httpbin 스타일의 HTTP 테스트 서버를 Axum 으로 구현한 예제.
//! 특히 `/drip` 은 응답 body 를 정해진 시간 동안 조금씩 흘려보내서
//! 클라이언트의 타임아웃 / 스트리밍 처리를 시험할 때 사용한다.
//!
//! ```not_rust
//! cargo run -p example-httpbin
//! ```
//!
//! Test with
//! ```not_rust
//! cargo test -p example-httpbin
//! ```

mod bytes;
mod config;
mod drip;
mod echo;
mod error;
mod query;
mod status;
mod stream;


use std::net::SocketAddr;

use axum::{
    error_handling::HandleErrorLayer,
    extract::{MatchedPath, Request},
    routing::{any, delete, get, patch, post, put},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=debug,tower_http=debug", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "loaded config");

    let listener = TcpListener::bind(config.addr).await.unwrap();
    tracing::debug!("listening on {}", listener.local_addr().unwrap());

    // `/ip` 와 echo 응답의 origin 을 위해 ConnectInfo 를 켠다
    axum::serve(
        listener,
        app(&config).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();
}

/// Having a function that produces our app makes it easy to call it from tests
/// without having to create an HTTP server.
fn app(config: &Config) -> Router {
    Router::new()
        // 🔁 echo
        .route("/get", get(echo::echo))
        .route("/post", post(echo::echo))
        .route("/put", put(echo::echo))
        .route("/patch", patch(echo::echo))
        .route("/delete", delete(echo::echo))
        .route("/anything", any(echo::echo))
        .route("/anything/{*rest}", any(echo::echo))
        .route("/headers", get(echo::headers))
        .route("/ip", get(echo::ip))
        .route("/user-agent", get(echo::user_agent))
        .route("/uuid", get(echo::uuid))
        // ⏱️ status / timing
        .route("/status/{code}", any(status::status))
        .route("/delay/{n}", get(status::delay))
        // 🚰 streaming
        .route("/drip", get(stream::drip_handler))
        .route("/bytes/{n}", get(bytes::bytes))
        .route("/stream-bytes/{n}", get(bytes::stream_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(error::handle_middleware_error))
                // 응답 헤더가 나갈 때까지의 시간만 제한 (body 스트리밍은 제외)
                .timeout(config.request_timeout)
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                    let method = req.method();
                    let uri = req.uri();
                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|matched| matched.as_str());

                    tracing::debug_span!("request", %method, %uri, matched_path)
                })),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::debug!("shutting down");
}
