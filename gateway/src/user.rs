//! 需要登录的个人接口

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use portal_auth_core::DEFAULT_ROLE;
use portal_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::body::failure;
use crate::middleware::Session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/info", get(user_info))
        .route("/api/app/menu", get(app_menu))
        .route("/api/manual/data", get(manual_data))
        .route("/api/history", get(history))
        .route("/api/wages", get(wages))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub is_logged_in: bool,
    pub phone: String,
    pub name: String,
    pub role: String,
}

/// 令牌里缺少姓名或身份时回查名单
async fn user_info(State(state): State<AppState>, Session(claims): Session) -> Json<UserInfo> {
    let name = claims.name.clone().filter(|n| !n.trim().is_empty());
    let role = Some(claims.role.clone()).filter(|r| !r.trim().is_empty());

    let identity = if name.is_none() || role.is_none() {
        match state.identity.get_identity(&claims.phone).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(phone = %claims.phone, error = %e, "Identity lookup failed");
                None
            }
        }
    } else {
        None
    };

    let name = name
        .or_else(|| identity.as_ref().and_then(|i| i.name.clone()))
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| claims.phone.clone());
    let role = role
        .or_else(|| identity.map(|i| i.role))
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    Json(UserInfo {
        is_logged_in: true,
        phone: claims.phone,
        name,
        role,
    })
}

async fn app_menu(State(state): State<AppState>, Session(claims): Session) -> Response {
    match state.scripts.app_menu(&claims.role).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            error!(role = %claims.role, error = %e, "Failed to load app menu");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "获取菜单失败")
        }
    }
}

async fn manual_data(
    State(state): State<AppState>,
    Session(claims): Session,
) -> AppResult<Json<Value>> {
    let data = state.scripts.manual_data(&claims.phone).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

async fn history(
    State(state): State<AppState>,
    Session(claims): Session,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Value>> {
    let data = state
        .scripts
        .history(&query.start, &query.end, &claims.phone)
        .await?;
    Ok(Json(json!({ "success": true, "data": data })))
}

#[derive(Debug, Deserialize)]
struct WagesQuery {
    month: Option<String>,
}

async fn wages(
    State(state): State<AppState>,
    Session(claims): Session,
    Query(query): Query<WagesQuery>,
) -> AppResult<Json<Value>> {
    let month = query
        .month
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| AppError::validation("缺少月份参数"))?;

    let data = state.scripts.wages(&claims.phone, &month).await?;
    Ok(Json(json!({ "success": true, "data": data })))
}
