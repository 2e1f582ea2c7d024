//! GraphQL Subscriptions (WebSocket support)
//!
//! Each subscription listens on one broker topic from the moment the
//! client subscribes. Nothing is replayed.

use async_graphql::{Context, SimpleObject, Subscription};
use futures_util::stream::{Stream, StreamExt};

use crate::context::RequestContext;
use crate::models::{Message, Post};
use crate::pubsub::{Event, Topic};

#[derive(SimpleObject, Clone, Debug)]
pub struct PostCreated {
    pub post: Post,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct MessageCreated {
    pub message: Message,
}

#[derive(Default)]
pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Emits every post created after the subscription starts
    async fn post_created(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = PostCreated>> {
        let rc = RequestContext::from_ctx(ctx)?;
        let events = rc.state.broker.subscribe(Topic::PostCreated);

        Ok(events.filter_map(|event| async move {
            match event {
                Event::PostCreated(post) => Some(PostCreated { post }),
                _ => None,
            }
        }))
    }

    /// Emits every message created after the subscription starts
    async fn message_created(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<impl Stream<Item = MessageCreated>> {
        let rc = RequestContext::from_ctx(ctx)?;
        let events = rc.state.broker.subscribe(Topic::MessageCreated);

        Ok(events.filter_map(|event| async move {
            match event {
                Event::MessageCreated(message) => Some(MessageCreated { message }),
                _ => None,
            }
        }))
    }
}
