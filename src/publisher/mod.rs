pub mod broadcast;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{DivisionResult, RoomSnapshot};

pub use broadcast::BroadcastPublisher;

/// The event taxonomy per room channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RoomEvent {
    MemberJoined(RoomSnapshot),
    MemberLeft(RoomSnapshot),
    RoomUpdated(RoomSnapshot),
    RoomClosed,
    TeamsDivided {
        room: RoomSnapshot,
        division: DivisionResult,
    },
}

pub fn channel_for(room_code: &str) -> String {
    format!("room-{room_code}")
}

/// Named-channel fan-out. `publish` is best-effort: failures
/// (e.g. no subscribers) are swallowed and never propagate back to the
/// caller, so a dropped event can never fail the enclosing Room Service
/// transaction.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, event: RoomEvent);
}
