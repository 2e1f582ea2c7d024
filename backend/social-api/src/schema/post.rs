//! Post queries, mutations and the `Post` object

use async_graphql::{Context, Object, Result as GraphQLResult, ResultExt, ID};
use tracing::info;
use uuid::Uuid;

use super::pagination::{Connection, PageRequest};
use super::scalars::Date;
use super::{parse_id, user::load_user};
use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::middleware::{is_authenticated, is_post_owner};
use crate::models::{self, LanType, Language, NewPost, Post, PostText, User};
use crate::pubsub::Event;

#[Object]
impl Post {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    /// Plain text, or the translation for `lang` (English by default)
    async fn text(&self, lang: Option<Language>) -> &str {
        self.text.in_language(lang.unwrap_or_default())
    }

    /// Every translation of a localized post; `null` for plain posts
    async fn translations(&self) -> Option<&LanType> {
        self.text.translations()
    }

    async fn created_at(&self) -> Date {
        Date(self.created_at)
    }

    async fn user(&self, ctx: &Context<'_>) -> GraphQLResult<User> {
        load_user(ctx, self.user_id).await
    }
}

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    /// Posts oldest first, `limit` at a time, starting after `cursor`
    async fn posts(
        &self,
        ctx: &Context<'_>,
        cursor: Option<String>,
        limit: Option<i32>,
    ) -> GraphQLResult<Connection<Post>> {
        let rc = RequestContext::from_ctx(ctx)?;
        list_posts(rc, cursor.as_deref(), limit).await.extend()
    }

    async fn post(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<Post> {
        let rc = RequestContext::from_ctx(ctx)?;
        find_post(rc, &id).await.extend()
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn create_post(&self, ctx: &Context<'_>, text: String) -> GraphQLResult<Post> {
        let rc = RequestContext::from_ctx(ctx)?;
        create_post(rc, PostText::Plain(text)).await.extend()
    }

    /// Create a post with a Russian and an English text
    async fn create_localized_post(&self, ctx: &Context<'_>, text: LanType) -> GraphQLResult<Post> {
        let rc = RequestContext::from_ctx(ctx)?;
        create_post(rc, PostText::Localized(text)).await.extend()
    }

    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<bool> {
        let rc = RequestContext::from_ctx(ctx)?;
        delete_post(rc, &id).await.extend()
    }
}

async fn list_posts(
    rc: &RequestContext,
    cursor: Option<&str>,
    limit: Option<i32>,
) -> Result<Connection<Post>> {
    let request = PageRequest::parse(cursor, limit, rc.state.pagination)?;
    let rows = rc
        .state
        .posts
        .posts_after(request.after, request.fetch_limit())
        .await?;

    Ok(request.into_page(rows, Post::keyset))
}

async fn find_post(rc: &RequestContext, id: &ID) -> Result<Post> {
    let id = parse_id(id)?;
    rc.state
        .posts
        .find_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("post", id))
}

async fn create_post(rc: &RequestContext, text: PostText) -> Result<Post> {
    let me = is_authenticated(rc)?;
    text.validate()?;

    let post = rc
        .state
        .posts
        .create_post(NewPost {
            user_id: me.id,
            text,
            created_at: models::now(),
        })
        .await?;
    info!(post_id = %post.id, user_id = %me.id, "Post created");

    rc.state.broker.publish(Event::PostCreated(post.clone())).await?;
    Ok(post)
}

async fn delete_post(rc: &RequestContext, id: &ID) -> Result<bool> {
    let me = is_authenticated(rc)?;
    let id: Uuid = parse_id(id)?;
    is_post_owner(rc, id).await?;

    let deleted = rc.state.posts.delete_post(id).await?;
    if deleted {
        info!(post_id = %id, user_id = %me.id, "Post deleted");
    }
    Ok(deleted)
}
