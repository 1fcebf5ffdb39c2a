use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::configuration::DatabaseSettings;
use crate::error::{DuplicateField, StoreError};
use crate::store::{NewStatus, NewUser, Status, StatusStore, User, UserStore};

type UserRow = (Uuid, String, String, String, DateTime<Utc>);
type StatusRow = (Uuid, String, String, DateTime<Utc>);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.constraint() {
                Some("users_username_key") => return StoreError::Duplicate(DuplicateField::Username),
                Some("users_email_key") => return StoreError::Duplicate(DuplicateField::Email),
                _ => {}
            }
        }
        StoreError::Backend(err.to_string())
    }
}

fn user_from_row((id, username, email, password_hash, created_at): UserRow) -> User {
    User {
        id,
        username,
        email,
        password_hash,
        created_at,
    }
}

fn status_from_row((id, user, message, created_at): StatusRow) -> Status {
    Status {
        id,
        user,
        message,
        created_at,
    }
}

/// Open a pool against `settings` and apply the bundled migrations
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.connection_string())
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;

    tracing::info!(database = %settings.database_name, "Database migrations applied");
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(user_from_row))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }
}

#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn list_recent(&self, limit: usize) -> Result<Vec<Status>, StoreError> {
        let rows = sqlx::query_as::<_, StatusRow>(
            "SELECT id, author, message, created_at FROM statuses ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(status_from_row).collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Status>, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT id, author, message, created_at FROM statuses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(status_from_row))
    }

    async fn insert(&self, status: NewStatus) -> Result<Status, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            INSERT INTO statuses (id, author, message, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author, message, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&status.user)
        .bind(&status.message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(status_from_row(row))
    }

    async fn update_message(&self, id: Uuid, message: &str) -> Result<Option<Status>, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(
            r#"
            UPDATE statuses SET message = $1
            WHERE id = $2
            RETURNING id, author, message, created_at
            "#,
        )
        .bind(message)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(status_from_row))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Status>, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(
            "DELETE FROM statuses WHERE id = $1 RETURNING id, author, message, created_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(status_from_row))
    }
}
