//! 中间件
//!
//! 会话从 HTTP-only Cookie 中读取，提取器校验令牌后把声明交给处理函数。

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use portal_auth_core::SessionClaims;
use portal_errors::AppError;
use tracing::{debug, warn};

use crate::state::{AppState, SessionSettings};

/// 登录页
pub const LOGIN_PAGE: &str = "/login.html";

/// 无需会话即可访问的静态资源后缀
const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "css", "js", "map", "woff", "woff2", "ttf",
];

/// 已登录会话
///
/// 缺少 Cookie、令牌无效或过期时拒绝为 401。
pub struct Session(pub SessionClaims);

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.session.cookie_name)
            .ok_or_else(|| AppError::unauthenticated("missing session cookie"))?;

        match state.verify_token(&token)? {
            Some(claims) => Ok(Session(claims)),
            None => {
                warn!("Session token rejected");
                Err(AppError::unauthenticated("invalid or expired token"))
            }
        }
    }
}

/// 可选会话：未登录或令牌无效时为 `None`
pub struct OptionalSession(pub Option<SessionClaims>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = session_token(&parts.headers, &state.session.cookie_name)
            .and_then(|token| state.verify_token(&token).ok().flatten());
        Ok(OptionalSession(claims))
    }
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// 写入会话 Cookie
pub fn with_session_cookie(jar: CookieJar, settings: &SessionSettings, token: String) -> CookieJar {
    let cookie = Cookie::build((settings.cookie_name.clone(), token))
        .http_only(true)
        .path("/")
        .secure(settings.secure)
        .max_age(time::Duration::seconds(settings.max_age_secs));
    jar.add(cookie)
}

/// 清除会话 Cookie
pub fn without_session_cookie(jar: CookieJar, settings: &SessionSettings) -> CookieJar {
    jar.remove(Cookie::build((settings.cookie_name.clone(), "")).path("/"))
}

/// 页面守卫
///
/// `/api` 前缀、登录页与静态资源放行；其余页面没有会话 Cookie 时 302 跳转登录页。
/// 这里只检查 Cookie 是否存在，令牌由接口校验。
pub async fn page_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_public_path(&path) || session_token(request.headers(), &state.session.cookie_name).is_some()
    {
        return next.run(request).await;
    }

    debug!(path = %path, "Redirecting anonymous page request to login");
    (StatusCode::FOUND, [(header::LOCATION, LOGIN_PAGE)]).into_response()
}

fn is_public_path(path: &str) -> bool {
    if path.starts_with("/api")
        || path == LOGIN_PAGE
        || path == "/favicon.ico"
        || path == "/health"
        || path == "/metrics"
    {
        return true;
    }

    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/user/info"));
        assert!(is_public_path("/login.html"));
        assert!(is_public_path("/favicon.ico"));
        assert!(is_public_path("/assets/app.JS"));
        assert!(is_public_path("/fonts/icon.woff2"));

        assert!(!is_public_path("/"));
        assert!(!is_public_path("/index.html"));
        assert!(!is_public_path("/scheduler"));
        assert!(is_public_path("/api"));
        assert!(is_public_path("/apix"));
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; auth_token=abc.def.ghi".parse().unwrap());
        assert_eq!(
            session_token(&headers, "auth_token").as_deref(),
            Some("abc.def.ghi")
        );

        headers.insert(COOKIE, "auth_token=".parse().unwrap());
        assert_eq!(session_token(&headers, "auth_token"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let settings = SessionSettings {
            cookie_name: "auth_token".to_string(),
            secure: false,
            max_age_secs: 604800,
        };
        let jar = with_session_cookie(CookieJar::new(), &settings, "t.o.k".to_string());
        let cookie = jar.get("auth_token").unwrap();

        assert_eq!(cookie.value(), "t.o.k");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604800)));
    }
}
