//! User schema and resolvers

use async_graphql::{Context, Object, Result as GraphQLResult, ResultExt, ID};
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use super::scalars::Date;
use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::middleware::{is_admin, is_authenticated};
use crate::models::{Message, Post, Role, User};

/// Resolve a user through the per-request loader
pub(crate) async fn load_user(ctx: &Context<'_>, id: Uuid) -> GraphQLResult<User> {
    let rc = RequestContext::from_ctx(ctx)?;
    rc.user_loader
        .load_one(id)
        .await
        .extend()?
        .ok_or_else(|| ApiError::not_found("user", id))
        .extend()
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn username(&self) -> &str {
        &self.username
    }

    async fn email(&self) -> &str {
        &self.email
    }

    async fn role(&self) -> Role {
        self.role
    }

    async fn created_at(&self) -> Date {
        Date(self.created_at)
    }

    /// The user's posts, oldest first
    async fn posts(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<Post>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.state.posts.posts_by_user(self.id).await.extend()
    }

    /// The user's messages, oldest first
    async fn messages(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<Message>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.state.messages.messages_by_user(self.id).await.extend()
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The signed-in user, or `null` for anonymous requests
    async fn me(&self, ctx: &Context<'_>) -> GraphQLResult<Option<User>> {
        let rc = RequestContext::from_ctx(ctx)?;
        match &rc.me {
            Some(me) => rc.user_loader.load_one(me.id).await.extend(),
            None => Ok(None),
        }
    }

    async fn user(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<Option<User>> {
        let rc = RequestContext::from_ctx(ctx)?;
        let id = parse_id(&id).extend()?;
        rc.user_loader.load_one(id).await.extend()
    }

    async fn users(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<User>> {
        let rc = RequestContext::from_ctx(ctx)?;
        rc.state.users.list_users().await.extend()
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Rename the signed-in user
    async fn update_user(&self, ctx: &Context<'_>, username: String) -> GraphQLResult<User> {
        let rc = RequestContext::from_ctx(ctx)?;
        update_user(rc, username).await.extend()
    }

    /// Admin only
    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<bool> {
        let rc = RequestContext::from_ctx(ctx)?;
        delete_user(rc, &id).await.extend()
    }
}

async fn update_user(rc: &RequestContext, username: String) -> Result<User> {
    let me = is_authenticated(rc)?;
    let username = username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("username cannot be empty"));
    }

    let user = rc
        .state
        .users
        .update_username(me.id, username)
        .await?
        .ok_or_else(|| ApiError::not_found("user", me.id))?;
    info!(user_id = %user.id, "User renamed");
    Ok(user)
}

async fn delete_user(rc: &RequestContext, id: &ID) -> Result<bool> {
    let admin = is_admin(rc)?;
    let id = parse_id(id)?;

    let deleted = rc.state.users.delete_user(id).await?;
    if deleted {
        info!(user_id = %id, admin_id = %admin.id, "User deleted");
    }
    Ok(deleted)
}
