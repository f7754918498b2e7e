use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub async fn create(pool: &PgPool, new_user: &NewUser) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            "
            INSERT INTO users (email, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, username, first_name, last_name, created_at, updated_at
            ",
        )
        .bind(&new_user.email)
        .bind(&new_user.username)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>(
            "
            SELECT user_id, email, username, first_name, last_name, created_at, updated_at
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_many(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "
            SELECT user_id, email, username, first_name, last_name, created_at, updated_at
            FROM users
            WHERE user_id = ANY($1)
            ",
        )
        .bind(user_ids)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "
            SELECT user_id, email, username, first_name, last_name, created_at, updated_at
            FROM users
            ORDER BY username
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Authors `user_id` is subscribed to, ordered by username.
    pub async fn list_subscribed_authors(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(
            "
            SELECT u.user_id, u.email, u.username, u.first_name, u.last_name, u.created_at, u.updated_at
            FROM users u
            JOIN subscriptions s ON s.author_user_id = u.user_id
            WHERE s.user_id = $1
            ORDER BY u.username
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count_subscribed_authors(pool: &PgPool, user_id: Uuid) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
