//! In-process event fan-out for GraphQL subscriptions
//!
//! Resolvers publish through the `EventBroker` trait, so the in-memory
//! `BroadcastBroker` can be replaced by a durable broker without touching
//! them.

pub mod broadcast;

use futures_util::stream::BoxStream;
use std::fmt;

use crate::error::Result;
use crate::models::{Message, Post};

pub use self::broadcast::BroadcastBroker;

/// Event channels a subscriber can listen on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    PostCreated,
    MessageCreated,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::PostCreated => "POST_CREATED",
            Topic::MessageCreated => "MESSAGE_CREATED",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub enum Event {
    PostCreated(Post),
    MessageCreated(Message),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::PostCreated(_) => Topic::PostCreated,
            Event::MessageCreated(_) => Topic::MessageCreated,
        }
    }
}

#[async_trait::async_trait]
pub trait EventBroker: Send + Sync {
    /// Deliver `event` to every current subscriber of its topic. Returns the
    /// number of listeners it was handed to.
    async fn publish(&self, event: Event) -> Result<usize>;

    /// Stream of events on `topic` published after this call returns.
    fn subscribe(&self, topic: Topic) -> BoxStream<'static, Event>;
}
