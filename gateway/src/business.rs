//! 业务代理：排班与通用表格接口
//!
//! 这些接口不要求登录，结果由 AirScript 决定。

use std::collections::HashMap;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use portal_adapter_airscript::SheetQuery;
use portal_common::value_to_string;
use portal_errors::AppResult;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::body::parse_json_value;
use crate::middleware::OptionalSession;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/scheduler", get(scheduler_read).post(scheduler_write))
        .route("/api/v1", any(articles))
        .route("/api/v2", any(training))
        .route("/api/v3", any(clinic))
        .route("/api/v4", any(performance))
}

#[derive(Debug, Deserialize)]
struct SchedulerQuery {
    date: Option<String>,
    b: Option<String>,
}

/// 视图参数，缺失或无法解析时为 0
fn view_param(raw: Option<&str>) -> i64 {
    raw.and_then(|b| b.trim().parse().ok()).unwrap_or(0)
}

async fn scheduler_read(
    State(state): State<AppState>,
    Query(query): Query<SchedulerQuery>,
) -> AppResult<Json<Value>> {
    let date = query.date.as_deref().filter(|d| !d.trim().is_empty());
    let b = view_param(query.b.as_deref());
    Ok(Json(state.scripts.scheduler_read(date, b).await?))
}

async fn scheduler_write(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    body: Bytes,
) -> AppResult<Json<Value>> {
    let mut data = match parse_json_value(&body) {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };

    if let (Some(claims), Value::Object(fields)) = (session, &mut data) {
        debug!(phone = %claims.phone, "Tagging scheduler write with current user");
        fields.insert("currentUserPhone".to_string(), Value::String(claims.phone));
    }

    Ok(Json(state.scripts.scheduler_write(data).await?))
}

async fn articles(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.scripts.query_sheet(SheetQuery::Articles).await?))
}

async fn training(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(Json(state.scripts.query_sheet(SheetQuery::Training).await?))
}

#[derive(Debug, Deserialize)]
struct ClinicQuery {
    name: Option<String>,
}

async fn clinic(
    State(state): State<AppState>,
    Query(query): Query<ClinicQuery>,
) -> AppResult<Json<Value>> {
    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok(Json(state.scripts.query_sheet(SheetQuery::Clinic { name }).await?))
}

/// 请求体优先，其次查询参数
fn performance_param(body: &Value, query: &HashMap<String, String>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(value_to_string)
        .or_else(|| query.get(key).cloned())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn performance(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> AppResult<Response> {
    let body = parse_json_value(&body);
    let Some(phonenum) = performance_param(&body, &query, "phonenum") else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "缺少phonenum参数", "data": null })),
        )
            .into_response());
    };
    let code = performance_param(&body, &query, "code");

    let result = state
        .scripts
        .query_sheet(SheetQuery::Performance { phonenum, code })
        .await?;
    Ok(Json(result).into_response())
}
