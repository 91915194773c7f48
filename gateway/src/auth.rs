//! 登录路由
//!
//! 短信验证码登录、微信静默授权登录与绑定。登录成功后令牌写入 HTTP-only Cookie。

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use portal_auth_core::{DEFAULT_ROLE, SessionSubject};
use portal_common::{normalize_phone, value_to_string};
use portal_errors::{AppError, AppResult};
use portal_ports::IdentityRecord;
use portal_telemetry::{record_login, record_sms};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::body::{failure, parse_json};
use crate::middleware::{with_session_cookie, without_session_cookie};
use crate::state::AppState;

/// 名单中没有姓名时使用的显示名
const DEFAULT_NAME: &str = "员工";

const NOT_STAFF: &str = "非内部人员或手机号错误";
const WRONG_CODE: &str = "验证码错误";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/send", post(send_code))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/wechat-login", post(wechat_login))
        .route("/api/auth/wechat-bind", post(wechat_bind))
        .route("/api/config/wechat-appid", get(wechat_app_id))
}

#[derive(Debug, Default, Deserialize)]
struct SendCodeRequest {
    #[serde(default)]
    phone: Value,
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    phone: Value,
    #[serde(default)]
    code: Value,
}

#[derive(Debug, Default, Deserialize)]
struct WechatLoginRequest {
    #[serde(default)]
    code: Value,
}

#[derive(Debug, Default, Deserialize)]
struct WechatBindRequest {
    #[serde(default)]
    openid: Value,
    #[serde(default)]
    phone: Value,
    #[serde(default)]
    code: Value,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub name: String,
    pub role: String,
}

/// 字符串或数字字段，去空白后为空视为缺失
fn text_field(value: &Value) -> Option<String> {
    value_to_string(value)
        .map(|s| normalize_phone(&s))
        .filter(|s| !s.is_empty())
}

fn require_phone(value: &Value) -> AppResult<String> {
    text_field(value).ok_or_else(|| AppError::validation("请输入手机号"))
}

async fn send_code(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    let request: SendCodeRequest = parse_json(&body)?;
    let phone = require_phone(&request.phone)?;

    if !state.identity.identity_exists(&phone).await? {
        record_sms("forbidden");
        warn!(phone = %phone, "Verification code requested for a phone outside the roster");
        return Err(AppError::forbidden(NOT_STAFF));
    }

    let code = state.codes.issue(&phone).await?;
    let delivered = match state.sms.send_code(&phone, &code).await {
        Ok(accepted) => accepted,
        Err(e) => {
            error!(phone = %phone, error = %e, "SMS delivery failed");
            false
        }
    };

    if !delivered {
        if !state.codes.delete(&phone, &code).await? {
            debug!(phone = %phone, "Undelivered code already replaced, keeping the newer one");
        }
        return Ok(failure(StatusCode::INTERNAL_SERVER_ERROR, "短信发送失败"));
    }

    info!(phone = %phone, "Verification code sent");
    Ok("ok".into_response())
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let request: LoginRequest = parse_json(&body)?;
    // 密钥缺失时不消耗验证码
    state.signing_secret()?;

    let phone = require_phone(&request.phone)?;
    let code = text_field(&request.code).unwrap_or_default();
    if !state.codes.verify(&phone, &code).await? {
        record_login("sms", "rejected");
        return Err(AppError::verification(WRONG_CODE));
    }

    let response = sign_in(&state, jar, &phone, None).await?;
    record_login("sms", "success");
    info!(phone = %phone, "SMS login succeeded");
    Ok(response)
}

async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        without_session_cookie(jar, &state.session),
        Json(json!({ "success": true })),
    )
}

async fn wechat_login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<Response> {
    let request: WechatLoginRequest = parse_json(&body)?;
    let code = text_field(&request.code)
        .ok_or_else(|| AppError::validation("缺少微信授权 code"))?;

    let openid = state.wechat.exchange_code(&code).await?;
    match resolve_bound_phone(&state, &openid).await? {
        Some(phone) => {
            let response = sign_in(&state, jar, &phone, Some(&openid)).await?;
            record_login("wechat", "success");
            info!(phone = %phone, "WeChat login succeeded");
            Ok(response.into_response())
        }
        None => {
            record_login("wechat", "unbound");
            Ok(Json(json!({
                "success": false,
                "needBind": true,
                "openid": openid,
            }))
            .into_response())
        }
    }
}

async fn wechat_bind(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let request: WechatBindRequest = parse_json(&body)?;
    let openid = text_field(&request.openid).ok_or_else(|| AppError::validation("缺少 openid"))?;
    let phone = require_phone(&request.phone)?;
    let code = text_field(&request.code).unwrap_or_default();
    state.signing_secret()?;

    if !state.codes.verify(&phone, &code).await? {
        record_login("wechat_bind", "rejected");
        return Err(AppError::verification(WRONG_CODE));
    }

    if !state.identity.identity_exists(&phone).await? {
        record_login("wechat_bind", "forbidden");
        return Err(AppError::forbidden(NOT_STAFF));
    }

    if !state.identity.bind_external_id_to_phone(&openid, &phone).await? {
        record_login("wechat_bind", "error");
        return Err(AppError::external_service(format!(
            "roster refused to bind openid for {}",
            phone
        )));
    }
    state.openids.insert(&openid, &phone);

    let response = sign_in(&state, jar, &phone, Some(&openid)).await?;
    record_login("wechat_bind", "success");
    info!(phone = %phone, "WeChat account bound");
    Ok(response)
}

async fn wechat_app_id(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state
        .wechat
        .app_id()
        .map(|app_id| Json(json!({ "appid": app_id })))
        .ok_or_else(|| AppError::not_found("未配置微信AppID"))
}

/// openid 对应的手机号
///
/// 缓存命中后仍需确认手机号在名单中，否则剔除并回源查询。
async fn resolve_bound_phone(state: &AppState, openid: &str) -> AppResult<Option<String>> {
    if let Some(phone) = state.openids.get(openid) {
        if state.identity.identity_exists(&phone).await? {
            return Ok(Some(phone));
        }
        state.openids.remove(openid);
    }

    let phone = state.identity.resolve_identity_by_external_id(openid).await?;
    if let Some(phone) = &phone {
        state.openids.insert(openid, phone);
    }
    Ok(phone)
}

/// 签发令牌并写入 Cookie
///
/// 名单查询失败不影响登录，使用缺省姓名与身份。
async fn sign_in(
    state: &AppState,
    jar: CookieJar,
    phone: &str,
    openid: Option<&str>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let identity = match state.identity.get_identity(phone).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(phone = %phone, error = %e, "Identity lookup failed, using default profile");
            None
        }
    };
    let (name, role) = profile(identity);

    let mut subject = SessionSubject::new(phone)
        .with_name(name.clone())
        .with_role(role.clone());
    if let Some(openid) = openid {
        subject = subject.with_openid(openid);
    }

    let token = state.issue_token(subject)?;
    Ok((
        with_session_cookie(jar, &state.session, token),
        Json(LoginResponse {
            success: true,
            name,
            role,
        }),
    ))
}

fn profile(identity: Option<IdentityRecord>) -> (String, String) {
    let Some(record) = identity else {
        return (DEFAULT_NAME.to_string(), DEFAULT_ROLE.to_string());
    };

    let name = record
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());
    let role = if record.role.trim().is_empty() {
        DEFAULT_ROLE.to_string()
    } else {
        record.role
    };
    (name, role)
}
