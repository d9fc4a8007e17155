use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity record. Deliberately not `Serialize`: everything that leaves the
/// service goes through `dto::UserResponse`, so the hash cannot leak.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, is_active, is_staff, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new identity. Email uniqueness is enforced by the store;
    /// racing registrations surface here as a unique-constraint error.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, is_active, is_staff, created_at)
            VALUES ($1, $2, $3, $4, TRUE, FALSE, $5)
            RETURNING id, email, name, password_hash, is_active, is_staff, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Update only the supplied fields of the caller's own record.
    pub async fn update_profile(
        db: &SqlitePool,
        id: Uuid,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> sqlx::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                password_hash = COALESCE($2, password_hash)
            WHERE id = $3
            RETURNING id, email, name, password_hash, is_active, is_staff, created_at
            "#,
        )
        .bind(name)
        .bind(password_hash)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
