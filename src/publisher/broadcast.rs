use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::{Publisher, RoomEvent};

const CHANNEL_CAPACITY: usize = 64;

/// In-process multi-subscriber pub/sub keyed by channel name. Each channel
/// is a lazily-created `broadcast` sender; late-joining subscribers do not
/// receive past events, matching the at-most-once, no-replay contract.
pub struct BroadcastPublisher {
    channels: DashMap<String, broadcast::Sender<RoomEvent>>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        Self { channels: DashMap::new() }
    }

    /// Subscribes to a channel, creating it if it doesn't exist yet.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<RoomEvent> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, channel: &str, event: RoomEvent) {
        if let Some(sender) = self.channels.get(channel) {
            // Err means there are currently no subscribers; best-effort delivery,
            // so that's not a failure worth logging.
            let _ = sender.send(event);
        } else {
            tracing::trace!(channel, "publish with no subscriber channel yet, dropping");
        }
    }
}
