use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MessageRepository, PostRepository, UserRepository};
use crate::error::{ApiError, Result};
use crate::models::{Keyset, Message, NewMessage, NewPost, NewUser, Post, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    messages: HashMap<Uuid, Message>,
}

/// Process-local repository with the same contracts as `PgRepository`:
/// unique usernames and emails, cascade on user delete, ascending
/// `(created_at, id)` range scans.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<RwLock<Tables>>,
    user_batches: Arc<AtomicUsize>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn post_count(&self) -> usize {
        self.tables.read().await.posts.len()
    }

    /// Number of `find_users_by_ids` calls served so far
    pub fn user_batch_count(&self) -> usize {
        self.user_batches.load(Ordering::SeqCst)
    }
}

fn sorted_by_keyset<T: Clone>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> Keyset) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| key(row));
    rows
}

fn page_after<T: Clone>(
    rows: impl Iterator<Item = T>,
    key: impl Fn(&T) -> Keyset + Copy,
    after: Option<Keyset>,
    limit: i64,
) -> Vec<T> {
    let limit = usize::try_from(limit).unwrap_or(0);
    sorted_by_keyset(rows, key)
        .into_iter()
        .filter(|row| after.map_or(true, |after| key(row) > after))
        .take(limit)
        .collect()
}

#[async_trait::async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(ApiError::validation("username must be unique"));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(ApiError::validation("email must be unique"));
        }

        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: crate::models::now(),
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        self.user_batches.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_keyset(tables.users.values().cloned(), |u: &User| Keyset {
            created_at: u.created_at,
            id: u.id,
        }))
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.id != id && u.username == username)
        {
            return Err(ApiError::validation("username must be unique"));
        }

        Ok(tables.users.get_mut(&id).map(|user| {
            user.username = username.to_string();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.posts.retain(|_, p| p.user_id != id);
            tables.messages.retain(|_, m| m.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl PostRepository for InMemoryRepository {
    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&post.user_id) {
            return Err(ApiError::not_found("user", post.user_id));
        }

        let created = Post {
            id: Uuid::new_v4(),
            text: post.text,
            created_at: post.created_at,
            user_id: post.user_id,
        };
        tables.posts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn posts_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(page_after(tables.posts.values().cloned(), Post::keyset, after, limit))
    }

    async fn posts_by_user(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_keyset(
            tables.posts.values().filter(|p| p.user_id == user_id).cloned(),
            Post::keyset,
        ))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.posts.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryRepository {
    async fn create_message(&self, message: NewMessage) -> Result<Message> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&message.user_id) {
            return Err(ApiError::not_found("user", message.user_id));
        }

        let created = Message {
            id: Uuid::new_v4(),
            text: message.text,
            created_at: message.created_at,
            user_id: message.user_id,
        };
        tables.messages.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self.tables.read().await.messages.get(&id).cloned())
    }

    async fn messages_after(&self, after: Option<Keyset>, limit: i64) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(page_after(
            tables.messages.values().cloned(),
            Message::keyset,
            after,
            limit,
        ))
    }

    async fn messages_by_user(&self, user_id: Uuid) -> Result<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_keyset(
            tables
                .messages
                .values()
                .filter(|m| m.user_id == user_id)
                .cloned(),
            Message::keyset,
        ))
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.messages.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostText, Role};
    use chrono::Duration;

    async fn seed_user(repo: &InMemoryRepository, name: &str) -> User {
        repo.create_user(NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            role: Role::User,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_after_is_exclusive_and_ordered() {
        let repo = InMemoryRepository::new();
        let user = seed_user(&repo, "alice").await;
        let base = crate::models::now();

        // Inserted out of order on purpose
        for offset in [2, 0, 1] {
            repo.create_post(NewPost {
                user_id: user.id,
                text: PostText::Plain(format!("post {}", offset)),
                created_at: base + Duration::seconds(offset),
            })
            .await
            .unwrap();
        }

        let all = repo.posts_after(None, 10).await.unwrap();
        let stamps: Vec<_> = all.iter().map(|p| p.created_at).collect();
        assert_eq!(
            stamps,
            vec![base, base + Duration::seconds(1), base + Duration::seconds(2)]
        );

        let after_first = repo
            .posts_after(Some(Keyset::after_instant(base)), 10)
            .await
            .unwrap();
        assert_eq!(after_first.len(), 2);
        assert!(after_first.iter().all(|p| p.created_at > base));

        let limited = repo.posts_after(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_posts_sharing_a_timestamp_page_by_id() {
        let repo = InMemoryRepository::new();
        let user = seed_user(&repo, "alice").await;
        let base = crate::models::now();

        for i in 0..3 {
            repo.create_post(NewPost {
                user_id: user.id,
                text: PostText::Plain(format!("post {}", i)),
                created_at: base,
            })
            .await
            .unwrap();
        }

        let first = repo.posts_after(None, 1).await.unwrap();
        let rest = repo.posts_after(Some(first[0].keyset()), 10).await.unwrap();
        assert_eq!(rest.len(), 2);
        assert!(rest.iter().all(|p| p.keyset() > first[0].keyset()));
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let repo = InMemoryRepository::new();
        seed_user(&repo, "alice").await;

        let duplicate = repo
            .create_user(NewUser {
                username: "alice".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await;
        assert!(matches!(duplicate, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let repo = InMemoryRepository::new();
        let user = seed_user(&repo, "alice").await;
        repo.create_post(NewPost {
            user_id: user.id,
            text: PostText::Plain("hello".into()),
            created_at: crate::models::now(),
        })
        .await
        .unwrap();

        assert!(repo.delete_user(user.id).await.unwrap());
        assert_eq!(repo.post_count().await, 0);
        assert!(!repo.delete_user(user.id).await.unwrap());
    }
}
