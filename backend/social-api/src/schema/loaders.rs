//! DataLoader implementations for N+1 query prevention
//!
//! `Post.user` and `Message.user` resolve through [`UserLoader`]: every id
//! requested while a response is being built is collected into one
//! `find_users_by_ids` call, and repeated ids hit the per-request cache.

use async_graphql::dataloader::Loader;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::UserRepository;
use crate::error::ApiError;
use crate::models::User;

/// User ID loader - batches user lookups
pub struct UserLoader {
    users: Arc<dyn UserRepository>,
}

impl UserLoader {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl Loader<Uuid> for UserLoader {
    type Value = User;
    type Error = ApiError;

    async fn load(&self, keys: &[Uuid]) -> Result<HashMap<Uuid, Self::Value>, Self::Error> {
        tracing::debug!(batch_size = keys.len(), "Loading users");

        let users = self.users.find_users_by_ids(keys).await?;
        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}
