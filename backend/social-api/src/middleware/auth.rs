//! Authorization guards for GraphQL resolvers
//!
//! Guards compose in sequence with `?`: each one must pass before the next
//! runs, and the first failure is returned to the caller.

use tracing::warn;
use uuid::Uuid;

use crate::context::{Me, RequestContext};
use crate::error::{ApiError, Result};
use crate::models::{Message, Post};

/// Verify user is authenticated and return their identity
pub fn is_authenticated(ctx: &RequestContext) -> Result<&Me> {
    ctx.me.as_ref().ok_or(ApiError::Unauthenticated)
}

/// Authenticated and holding the `ADMIN` role
pub fn is_admin(ctx: &RequestContext) -> Result<&Me> {
    let me = is_authenticated(ctx)?;
    if !me.is_admin() {
        return Err(ApiError::NotAdmin);
    }
    Ok(me)
}

/// Load post `id` and check the caller owns it
pub async fn is_post_owner(ctx: &RequestContext, id: Uuid) -> Result<Post> {
    let me = is_authenticated(ctx)?;
    let post = ctx
        .state
        .posts
        .find_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("post", id))?;

    if post.user_id != me.id {
        warn!(post_id = %id, user_id = %me.id, "Rejected post access by non-owner");
        return Err(ApiError::NotOwner);
    }
    Ok(post)
}

/// Load message `id` and check the caller owns it
pub async fn is_message_owner(ctx: &RequestContext, id: Uuid) -> Result<Message> {
    let me = is_authenticated(ctx)?;
    let message = ctx
        .state
        .messages
        .find_message(id)
        .await?
        .ok_or_else(|| ApiError::not_found("message", id))?;

    if message.user_id != me.id {
        warn!(message_id = %id, user_id = %me.id, "Rejected message access by non-owner");
        return Err(ApiError::NotOwner);
    }
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JwtConfig, PaginationConfig};
    use crate::context::AppState;
    use crate::db::{InMemoryRepository, PostRepository, UserRepository};
    use crate::models::{NewPost, NewUser, PostText, Role, User};
    use crate::pubsub::BroadcastBroker;
    use std::sync::Arc;

    fn state(repo: &InMemoryRepository) -> AppState {
        AppState::new(
            repo.clone(),
            Arc::new(BroadcastBroker::default()),
            JwtConfig::new("test-secret"),
            PaginationConfig::default(),
        )
    }

    fn me(user: &User) -> Me {
        Me {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }

    async fn user(repo: &InMemoryRepository, name: &str, role: Role) -> User {
        repo.create_user(NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            role,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_fails_every_guard() {
        let repo = InMemoryRepository::new();
        let ctx = RequestContext::anonymous(state(&repo));

        assert!(matches!(is_authenticated(&ctx), Err(ApiError::Unauthenticated)));
        assert!(matches!(is_admin(&ctx), Err(ApiError::Unauthenticated)));
        assert!(matches!(
            is_post_owner(&ctx, Uuid::new_v4()).await,
            Err(ApiError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_admin_guard_checks_role() {
        let repo = InMemoryRepository::new();
        let admin = user(&repo, "root", Role::Admin).await;
        let plain = user(&repo, "bob", Role::User).await;

        let ctx = RequestContext::new(state(&repo), Some(me(&admin)));
        assert_eq!(is_admin(&ctx).unwrap().id, admin.id);

        let ctx = RequestContext::new(state(&repo), Some(me(&plain)));
        assert!(matches!(is_admin(&ctx), Err(ApiError::NotAdmin)));
    }

    #[tokio::test]
    async fn test_post_owner_guard() {
        let repo = InMemoryRepository::new();
        let owner = user(&repo, "alice", Role::User).await;
        let other = user(&repo, "mallory", Role::User).await;
        let post = repo
            .create_post(NewPost {
                user_id: owner.id,
                text: PostText::Plain("mine".into()),
                created_at: crate::models::now(),
            })
            .await
            .unwrap();

        let ctx = RequestContext::new(state(&repo), Some(me(&owner)));
        assert_eq!(is_post_owner(&ctx, post.id).await.unwrap().id, post.id);

        let ctx = RequestContext::new(state(&repo), Some(me(&other)));
        assert!(matches!(
            is_post_owner(&ctx, post.id).await,
            Err(ApiError::NotOwner)
        ));

        assert!(matches!(
            is_post_owner(&ctx, Uuid::new_v4()).await,
            Err(ApiError::NotFound { resource: "post", .. })
        ));
    }

    #[tokio::test]
    async fn test_message_owner_guard_reports_missing_message() {
        let repo = InMemoryRepository::new();
        let owner = user(&repo, "alice", Role::User).await;
        let ctx = RequestContext::new(state(&repo), Some(me(&owner)));

        assert!(matches!(
            is_message_owner(&ctx, Uuid::new_v4()).await,
            Err(ApiError::NotFound { resource: "message", .. })
        ));
    }
}
