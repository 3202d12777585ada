use axum::{
    debug_handler,
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, RwLock,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub async fn run(addr: SocketAddr) {
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, router()).await.unwrap();
}

pub fn router() -> Router {
    Router::new()
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:status/delay/ms/:delay_ms", get(status))
        .route(
            "/flaky/:every/delay/ms/:delay_ms/scenario/:scenario_name",
            get(flaky),
        )
        .route("/echo", post(echo))
        .layer(TraceLayer::new_for_http())
}

#[debug_handler]
pub async fn delay(Path(delay_ms): Path<u64>) {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
pub async fn status(Path((status, delay_ms)): Path<(u16, u64)>) -> StatusCode {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST)
}

lazy_static! {
    static ref FLAKY_MAP: RwLock<HashMap<String, Arc<AtomicU64>>> = RwLock::new(HashMap::new());
}

/// Every `every`-th request for a given scenario name fails with a 500.
#[debug_handler]
pub async fn flaky(
    Path((every, delay_ms, scenario_name)): Path<(u64, u64, String)>,
) -> StatusCode {
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let read = FLAKY_MAP.read().unwrap().get(&scenario_name).cloned();
    let counter = if let Some(counter) = read {
        counter
    } else {
        FLAKY_MAP
            .write()
            .unwrap()
            .entry(scenario_name)
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .clone()
    };

    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
    if every > 0 && n % every == 0 {
        debug!("MOCK SERVER ___ ERR ({n})");
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

#[debug_handler]
pub async fn echo(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(body))
}
