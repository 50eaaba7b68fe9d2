//! # User Handlers
//!
//! Admin only. Creating or reactivating an account counts against the
//! subscription plan; the last active admin can neither be demoted nor
//! deactivated.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;
use resto_core::subscription::check_user_limit;
use resto_core::validation::{validate_email, validate_password, validate_user_name};
use resto_core::{Role, User};
use resto_db::password::hash_password;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

async fn load(state: &AppState, id: &str) -> ApiResult<User> {
    state
        .db
        .users()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))
}

async fn ensure_not_last_admin(state: &AppState, user: &User) -> ApiResult<()> {
    if user.role.is_admin() && user.is_active && state.db.users().count_admins().await? <= 1 {
        return Err(ApiError::new(
            ErrorCode::Conflict,
            "At least one active admin is required",
        ));
    }
    Ok(())
}

/// `GET /api/users`
pub async fn list(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<User>>> {
    current.require_admin()?;
    Ok(Json(state.db.users().list().await?))
}

/// `POST /api/users`
pub async fn create(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    current.require_admin()?;

    validate_user_name(&body.name)?;
    validate_email(&body.email)?;
    validate_password(&body.password)?;

    let plan = state.db.settings().get().await?.plan;
    check_user_limit(plan, state.db.users().count().await?)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        email: body.email.trim().to_lowercase(),
        password_hash: hash_password(&body.password)?,
        role: body.role,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let user = state.db.users().insert(&user).await?;
    info!(email = %user.email, role = ?user.role, by = %current.0.email, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /api/users/:id/role`
pub async fn change_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleRequest>,
) -> ApiResult<Json<User>> {
    current.require_admin()?;

    let user = load(&state, &id).await?;
    if !body.role.is_admin() {
        ensure_not_last_admin(&state, &user).await?;
    }

    let user = state.db.users().update_role(&id, body.role).await?;
    info!(email = %user.email, role = ?user.role, by = %current.0.email, "Role changed");

    Ok(Json(user))
}

/// `PUT /api/users/:id/password`
pub async fn reset_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    current.require_admin()?;
    validate_password(&body.password)?;

    let hash = hash_password(&body.password)?;
    state.db.users().update_password(&id, &hash).await?;
    info!(id = %id, by = %current.0.email, "Password reset");

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/users/:id/deactivate`
pub async fn deactivate(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    current.require_admin()?;

    if current.0.id == id {
        return Err(ApiError::validation("You cannot deactivate your own account"));
    }

    let user = load(&state, &id).await?;
    ensure_not_last_admin(&state, &user).await?;

    let user = state.db.users().set_active(&id, false).await?;
    info!(email = %user.email, by = %current.0.email, "User deactivated");

    Ok(Json(user))
}

/// `POST /api/users/:id/activate`
pub async fn activate(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    current.require_admin()?;

    let user = load(&state, &id).await?;
    if user.is_active {
        return Ok(Json(user));
    }

    let plan = state.db.settings().get().await?.plan;
    check_user_limit(plan, state.db.users().count().await?)?;

    let user = state.db.users().set_active(&id, true).await?;
    info!(email = %user.email, by = %current.0.email, "User activated");

    Ok(Json(user))
}
