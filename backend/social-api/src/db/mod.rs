//! Data access for users, posts and messages.
//!
//! Resolvers only see these traits. `PgRepository` backs them with
//! PostgreSQL; `InMemoryRepository` is used by tests and by local runs
//! without `DATABASE_URL`.

pub mod memory;
pub mod postgres;

use sqlx::migrate::Migrator;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Keyset, Message, NewMessage, NewPost, NewUser, Post, User};

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Batched lookup; ids without a row are simply absent from the result
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>>;

    /// Match on username or email
    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>>;

    /// Returns whether a row was removed. Owned posts and messages go with it.
    async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: NewPost) -> Result<Post>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>>;

    /// Posts ordered by `(created_at, id)` ascending, strictly after `after`
    /// when given, at most `limit` rows.
    async fn posts_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Post>>;

    async fn posts_by_user(&self, user_id: Uuid) -> Result<Vec<Post>>;

    async fn delete_post(&self, id: Uuid) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create_message(&self, message: NewMessage) -> Result<Message>;

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>>;

    /// Same ordering contract as [`PostRepository::posts_after`]
    async fn messages_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Message>>;

    async fn messages_by_user(&self, user_id: Uuid) -> Result<Vec<Message>>;

    async fn delete_message(&self, id: Uuid) -> Result<bool>;
}
