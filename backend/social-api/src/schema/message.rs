use async_graphql::{Context, Object, Result as GraphQLResult, ResultExt, ID};
use tracing::info;

use super::pagination::{Connection, PageRequest};
use super::scalars::Date;
use super::{parse_id, user::load_user};
use crate::context::RequestContext;
use crate::error::{ApiError, Result};
use crate::middleware::{is_authenticated, is_message_owner};
use crate::models::{self, Message, NewMessage, User};
use crate::pubsub::Event;

#[Object]
impl Message {
    async fn id(&self) -> ID {
        ID(self.id.to_string())
    }

    async fn text(&self) -> &str {
        &self.text
    }

    async fn created_at(&self) -> Date {
        Date(self.created_at)
    }

    async fn user(&self, ctx: &Context<'_>) -> GraphQLResult<User> {
        load_user(ctx, self.user_id).await
    }
}

#[derive(Default)]
pub struct MessageQuery;

#[Object]
impl MessageQuery {
    async fn messages(
        &self,
        ctx: &Context<'_>,
        cursor: Option<String>,
        limit: Option<i32>,
    ) -> GraphQLResult<Connection<Message>> {
        let rc = RequestContext::from_ctx(ctx)?;
        list_messages(rc, cursor.as_deref(), limit).await.extend()
    }

    async fn message(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<Message> {
        let rc = RequestContext::from_ctx(ctx)?;
        find_message(rc, &id).await.extend()
    }
}

#[derive(Default)]
pub struct MessageMutation;

#[Object]
impl MessageMutation {
    async fn create_message(&self, ctx: &Context<'_>, text: String) -> GraphQLResult<Message> {
        let rc = RequestContext::from_ctx(ctx)?;
        create_message(rc, text).await.extend()
    }

    async fn delete_message(&self, ctx: &Context<'_>, id: ID) -> GraphQLResult<bool> {
        let rc = RequestContext::from_ctx(ctx)?;
        delete_message(rc, &id).await.extend()
    }
}

async fn list_messages(
    rc: &RequestContext,
    cursor: Option<&str>,
    limit: Option<i32>,
) -> Result<Connection<Message>> {
    let request = PageRequest::parse(cursor, limit, rc.state.pagination)?;
    let rows = rc
        .state
        .messages
        .messages_after(request.after, request.fetch_limit())
        .await?;

    Ok(request.into_page(rows, Message::keyset))
}

async fn find_message(rc: &RequestContext, id: &ID) -> Result<Message> {
    let id = parse_id(id)?;
    rc.state
        .messages
        .find_message(id)
        .await?
        .ok_or_else(|| ApiError::not_found("message", id))
}

async fn create_message(rc: &RequestContext, text: String) -> Result<Message> {
    let me = is_authenticated(rc)?;
    if text.trim().is_empty() {
        return Err(ApiError::validation("Message text cannot be empty"));
    }

    let message = rc
        .state
        .messages
        .create_message(NewMessage {
            user_id: me.id,
            text,
            created_at: models::now(),
        })
        .await?;
    info!(message_id = %message.id, user_id = %me.id, "Message created");

    rc.state
        .broker
        .publish(Event::MessageCreated(message.clone()))
        .await?;
    Ok(message)
}

async fn delete_message(rc: &RequestContext, id: &ID) -> Result<bool> {
    is_authenticated(rc)?;
    let id = parse_id(id)?;
    is_message_owner(rc, id).await?;

    rc.state.messages.delete_message(id).await
}
