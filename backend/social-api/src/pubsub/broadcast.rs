use futures_util::stream::{BoxStream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

use super::{Event, EventBroker, Topic};
use crate::error::Result;

/// `EventBroker` over a tokio broadcast channel. Nothing is persisted: a
/// subscriber only sees events published while it is connected, and one
/// that falls more than `capacity` events behind skips the backlog.
#[derive(Clone)]
pub struct BroadcastBroker {
    sender: broadcast::Sender<Event>,
}

impl BroadcastBroker {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of live subscriptions across all topics
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastBroker {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait::async_trait]
impl EventBroker for BroadcastBroker {
    async fn publish(&self, event: Event) -> Result<usize> {
        let topic = event.topic();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(topic = %topic, receivers, "Event published");
                Ok(receivers)
            }
            // No subscribers connected; the event is dropped.
            Err(_) => {
                debug!(topic = %topic, "Event published with no subscribers");
                Ok(0)
            }
        }
    }

    fn subscribe(&self, topic: Topic) -> BoxStream<'static, Event> {
        BroadcastStream::new(self.sender.subscribe())
            .filter_map(move |received| async move {
                match received {
                    Ok(event) if event.topic() == topic => Some(event),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(topic = %topic, skipped, "Subscriber lagged; events dropped");
                        None
                    }
                }
            })
            .boxed()
    }
}
