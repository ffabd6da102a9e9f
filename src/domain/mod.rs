pub mod division;
pub mod label;
pub mod membership;
pub mod room;
pub mod user;

pub use division::DivisionResult;
pub use label::{Label, LabelRule, LabelRules};
pub use membership::{MemberProjection, Membership, Team};
pub use room::{RoomAggregate, RoomSnapshot, RoomStatus};
pub use user::{UserId, UserProfile};
