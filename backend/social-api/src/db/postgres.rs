use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{MessageRepository, PostRepository, UserRepository};
use crate::error::{ApiError, Result};
use crate::models::{Keyset, Message, NewMessage, NewPost, NewUser, Post, PostText, User};

/// PostgreSQL-backed repository for every entity
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = ApiError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let role = record.role.parse().map_err(ApiError::Internal)?;
        Ok(User {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password_hash,
            role,
            created_at: record.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PostRecord {
    id: Uuid,
    text: Json<PostText>,
    created_at: DateTime<Utc>,
    user_id: Uuid,
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        Post {
            id: record.id,
            text: record.text.0,
            created_at: record.created_at,
            user_id: record.user_id,
        }
    }
}

fn into_users(records: Vec<UserRecord>) -> Result<Vec<User>> {
    records.into_iter().map(User::try_from).collect()
}

#[async_trait::async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        record.try_into()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(User::try_from).transpose()
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, role, created_at
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        into_users(records)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, role, created_at
            FROM users
            WHERE username = $1 OR email = $1
            LIMIT 1
            "#,
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        record.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, role, created_at FROM users ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        into_users(records)
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET username = $1
            WHERE id = $2
            RETURNING id, username, email, password_hash, role, created_at
            "#,
        )
        .bind(username)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(User::try_from).transpose()
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl PostRepository for PgRepository {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (id, text, created_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, created_at, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Json(&post.text))
        .bind(post.created_at)
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(
            "SELECT id, text, created_at, user_id FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Post::from))
    }

    async fn posts_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, text, created_at, user_id
            FROM posts
            WHERE $1::timestamptz IS NULL OR (created_at, id) > ($1, $2::uuid)
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(after.map(|k| k.created_at))
        .bind(after.map(|k| k.id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    async fn posts_by_user(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let records = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, text, created_at, user_id
            FROM posts
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl MessageRepository for PgRepository {
    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, text, created_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, created_at, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&message.text)
        .bind(message.created_at)
        .bind(message.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            "SELECT id, text, created_at, user_id FROM messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn messages_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, text, created_at, user_id
            FROM messages
            WHERE $1::timestamptz IS NULL OR (created_at, id) > ($1, $2::uuid)
            ORDER BY created_at ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(after.map(|k| k.created_at))
        .bind(after.map(|k| k.id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn messages_by_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, text, created_at, user_id
            FROM messages
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
