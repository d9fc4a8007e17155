use rand::{rngs::OsRng, RngCore};
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::users::repo::User;

/// Opaque bearer token, bound 1:1 to an identity. No expiry is modeled;
/// a token dies only by being superseded on the next issuance.
#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

/// 20 CSPRNG bytes as 40 lowercase hex characters.
pub(crate) fn generate_key() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl AuthToken {
    /// Issue a fresh token for the identity, superseding any previous one.
    pub async fn issue(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<AuthToken> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (token, user_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token = excluded.token, created_at = excluded.created_at
            RETURNING token, user_id, created_at
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        debug!(user_id = %token.user_id, "token issued");
        Ok(token)
    }

    /// Resolve a presented token to its identity, if any.
    pub async fn resolve(db: &SqlitePool, token: &str) -> sqlx::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff, u.created_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
