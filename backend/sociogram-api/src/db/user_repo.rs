use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{UserRepository, DUPLICATE_USER_MESSAGE};
use crate::error::{AppError, Result};
use crate::models::{NewUser, PageRequest, ProfileChanges, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, bio, profile_image, \
                            device_token, created_at, updated_at";

/// Postgres-backed user storage
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Escape LIKE wildcards so user input only ever matches literally.
pub(crate) fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, full_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(DUPLICATE_USER_MESSAGE.to_string())
                } else {
                    e.into()
                }
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                bio = COALESCE($3, bio),
                profile_image = COALESCE($4, profile_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.full_name)
            .bind(changes.bio)
            .bind(changes.profile_image)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn set_device_token(&self, id: Uuid, device_token: &str) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET device_token = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(device_token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn search(&self, query: &str, page: PageRequest) -> Result<(Vec<User>, u64)> {
        let pattern = like_pattern(query);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username ILIKE $1 OR full_name ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username ILIKE $1 OR full_name ILIKE $1
            ORDER BY username ASC
            LIMIT $2 OFFSET $3
            "#
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(&pattern)
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((users, total.max(0) as u64))
    }
}
