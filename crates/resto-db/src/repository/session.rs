//! # Session Repository
//!
//! Server-side login sessions. The session id is the opaque token stored in
//! the browser cookie.
//!
//! ```text
//! login ──► create(user) ──► token in cookie
//!                               │
//! request ──► find_valid(token) ┤ expired / inactive user → None
//!                               └► user ──► touch(token) slides expiry
//! logout ──► delete(token)
//! ```

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use resto_core::User;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

/// 32 random bytes, hex encoded.
fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    pub async fn create(
        &self,
        user_id: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        lifetime: Duration,
    ) -> DbResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: new_token(),
            user_id: user_id.to_string(),
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            created_at: now,
            last_activity: now,
            expires_at: now + lifetime,
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, ip_address, user_agent, created_at, last_activity, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.last_activity)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, "Session created");
        Ok(session)
    }

    /// The active user behind an unexpired session.
    pub async fn find_valid(&self, token: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.role, u.is_active,
                   u.created_at, u.updated_at
            FROM sessions s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.id = ?1 AND s.expires_at > ?2 AND u.is_active = 1
            "#,
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Records activity and pushes expiry to `now + lifetime`.
    pub async fn touch(&self, token: &str, lifetime: Duration) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query("UPDATE sessions SET last_activity = ?2, expires_at = ?3 WHERE id = ?1")
            .bind(token)
            .bind(now)
            .bind(now + lifetime)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deleting an unknown token is not an error.
    pub async fn delete(&self, token: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Removes expired sessions; returns how many.
    pub async fn purge_expired(&self) -> DbResult<u64> {
        let removed = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            debug!(removed = removed, "Expired sessions purged");
        }

        Ok(removed)
    }
}
