//! # Session Authentication
//!
//! Cookie-backed sessions for the dashboard.
//!
//! ```text
//! POST /login ──► throttle check ──► verify argon2 hash ──► session row
//!                      │                    │                    │
//!                      ▼                    ▼                    ▼
//!                 429 throttle        401 failed / hit     Set-Cookie (HttpOnly)
//!
//! /api/* ──► require_session ──► cookie → sessions.find_valid → CurrentUser
//!                                    │
//!                                    └► 401 when missing or expired
//! ```
//!
//! Role checks happen in handlers through [`CurrentUser::require`].

use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts, Request, State};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;
use resto_core::locale::{translate, translate_with};
use resto_core::{Role, User};
use resto_db::password::verify_password;

// =============================================================================
// Current User
// =============================================================================

/// The authenticated user, placed in request extensions by
/// [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.0.role
    }

    /// 403 unless the user holds one of `roles`. Admins always pass.
    pub fn require(&self, roles: &[Role]) -> ApiResult<()> {
        if self.0.role.is_admin() || roles.contains(&self.0.role) {
            Ok(())
        } else {
            warn!(user = %self.0.email, role = ?self.0.role, "Access denied");
            Err(ApiError::forbidden())
        }
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        self.require(&[Role::Admin])
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// User fields exposed to the dashboard.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub role_label: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        SessionUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            role_label: user.role.label(),
        }
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Resolves the session cookie into a [`CurrentUser`] and slides the
/// session's expiry.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(&state.config.session.cookie_name)
        .map(|c| c.value().to_string())
        .ok_or_else(ApiError::unauthenticated)?;

    let user = state
        .db
        .sessions()
        .find_valid(&token)
        .await?
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthenticated, translate("session_expired")))?;

    state
        .db
        .sessions()
        .touch(&token, state.config.session_lifetime())
        .await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

// =============================================================================
// Login / Logout
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Throttle address of the caller. `X-Forwarded-For` is only read when the
/// server runs behind a trusted proxy; clients can set it to anything.
fn client_ip(
    connect: Option<&ConnectInfo<SocketAddr>>,
    headers: &HeaderMap,
    trust_proxy: bool,
) -> String {
    let forwarded = || {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    trust_proxy
        .then(forwarded)
        .flatten()
        .or_else(|| connect.map(|c| c.0.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn session_cookie(state: &AppState, value: String) -> Cookie<'static> {
    Cookie::build((state.config.session.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.secure_cookie)
        .build()
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<SessionUser>)> {
    let ip = client_ip(connect.as_ref(), &headers, state.config.server.trust_proxy);
    let key = crate::state::LoginThrottle::key(&body.email, &ip);

    if let Some(seconds) = state.throttle.locked_for(&key) {
        warn!(email = %body.email, ip = %ip, seconds = seconds, "Login throttled");
        let seconds = seconds.to_string();
        return Err(ApiError::new(
            ErrorCode::TooManyAttempts,
            translate_with("throttle", &[("seconds", seconds.as_str())]),
        ));
    }

    let user = state.db.users().get_by_email(&body.email).await?;
    let user = match user {
        Some(u) if verify_password(&body.password, &u.password_hash) => u,
        _ => {
            state.throttle.hit(&key);
            warn!(email = %body.email, ip = %ip, "Login failed");
            return Err(ApiError::new(ErrorCode::Unauthenticated, translate("failed")));
        }
    };

    if !user.is_active {
        return Err(ApiError::new(ErrorCode::Forbidden, translate("inactive")));
    }

    state.throttle.clear(&key);

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let session = state
        .db
        .sessions()
        .create(&user.id, Some(ip.as_str()), user_agent, state.config.session_lifetime())
        .await?;

    info!(user = %user.email, role = ?user.role, "Logged in");

    let jar = jar.add(session_cookie(&state, session.id));
    Ok((jar, Json(SessionUser::from(&user))))
}

/// `POST /logout`; succeeds without a session too.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(cookie) = jar.get(&state.config.session.cookie_name) {
        state.db.sessions().delete(cookie.value()).await?;
    }

    let jar = jar.remove(
        Cookie::build(state.config.session.cookie_name.clone())
            .path("/")
            .build(),
    );

    Ok((
        jar,
        Json(MessageResponse {
            message: translate("logged_out"),
        }),
    ))
}
