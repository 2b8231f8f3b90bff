use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

/// Stored admin login. `password_hash` is a PHC string and never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct AdminCredential {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AdminCredential {
    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AdminCredential>(
            r#"INSERT INTO admin_credentials (id, username, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminCredential>(
            r#"SELECT id, username, password_hash, created_at
            FROM admin_credentials
            WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }
}
