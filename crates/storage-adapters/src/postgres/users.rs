use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::{DomainError, NewUser, Result, User, UserRepository};
use uuid::Uuid;

use super::{internal, is_unique_violation, PgStore};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    full_name: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            is_admin: row.is_admin,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, username, password_hash, full_name, is_admin, created_at";

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (id, username, password_hash, full_name, is_admin) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(user.is_admin)
            .fetch_one(self.pool())
            .await
            .map(User::from)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Conflict("Username already registered".into())
                } else {
                    internal(e)
                }
            })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await
            .map_err(internal)?;
        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(internal)?;
        Ok(row.map(User::from))
    }

    async fn set_admin(&self, id: Uuid, is_admin: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
            .bind(id)
            .bind(is_admin)
            .execute(self.pool())
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("user", id));
        }
        Ok(())
    }
}
