//! 路由装配

use axum::{
    Json, Router,
    extract::State,
    handler::HandlerWithoutStateExt,
    http::{Method, StatusCode, Uri, header},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::middleware::page_guard;
use crate::state::AppState;
use crate::{auth, business, user};

/// 构建完整应用
///
/// 未匹配到接口的请求交给静态文件目录，页面请求先经过页面守卫。
pub fn app(state: AppState, static_dir: &str) -> Router {
    let static_files = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(not_found.into_service());

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .merge(auth::routes())
        .merge(user::routes())
        .merge(business::routes())
        .fallback_service(static_files)
        .layer(middleware::from_fn_with_state(state.clone(), page_guard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(recorder) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            recorder.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

async fn not_found(uri: Uri) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Not Found: {}", uri.path()))
}
