use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    division::DivisionResult,
    label::LabelRules,
    membership::{Membership, Team},
    user::UserId,
};

pub const MIN_MAX_MEMBERS: i32 = 2;
pub const MAX_MAX_MEMBERS: i32 = 100;
pub const DEFAULT_MAX_MEMBERS: i32 = 10;
pub const MAX_GAME_NAME_LEN: usize = 128;
pub const ROOM_CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Divided,
    /// Terminal. Never persisted — `CloseRoom` deletes the room and its
    /// memberships in the same transaction that would otherwise record it.
    Closed,
}

impl RoomStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Divided => "divided",
            RoomStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<RoomStatus> {
        match s {
            "waiting" => Some(RoomStatus::Waiting),
            "divided" => Some(RoomStatus::Divided),
            "closed" => Some(RoomStatus::Closed),
            _ => None,
        }
    }
}

/// The full room aggregate: the room row plus its memberships, as loaded
/// from the Repository. The Room Service never touches entities directly.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomAggregate {
    pub id: i64,
    pub room_code: String,
    pub game_name: String,
    pub owner_id: UserId,
    pub status: RoomStatus,
    pub max_members: i32,
    pub label_rules: LabelRules,
    pub division_result: Option<DivisionResult>,
    pub members: Vec<Membership>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomAggregate {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.member_count() >= self.max_members as usize
    }

    pub fn find_member(&self, user_id: &str) -> Option<&Membership> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn owner(&self) -> Option<&Membership> {
        self.find_member(&self.owner_id)
    }

    /// Snapshot invariant check: every membership has a team
    /// drawn from {team_a, team_b} once divided.
    pub fn all_members_assigned(&self) -> bool {
        self.members.iter().all(|m| m.team != Team::None)
    }

    pub fn to_snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            room_code: self.room_code.clone(),
            game_name: self.game_name.clone(),
            status: self.status,
            max_members: self.max_members,
            owner_id: self.owner_id.clone(),
            label_rules: self.label_rules.clone(),
            owner: self.owner().map(MemberView::from),
            members: self.members.iter().map(MemberView::from).collect(),
            member_count: self.member_count(),
            created_at: self.created_at,
        }
    }
}

/// A membership as rendered in a room snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: UserId,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub team: Team,
    pub labels: Vec<crate::domain::label::Label>,
    pub joined_at: DateTime<Utc>,
}

impl From<&Membership> for MemberView {
    fn from(m: &Membership) -> Self {
        Self {
            id: m.user_id.clone(),
            nickname: m.display_name.clone(),
            avatar_url: m.avatar_url.clone(),
            team: m.team,
            labels: m.labels.clone(),
            joined_at: m.joined_at,
        }
    }
}

/// The full aggregated read-model of a room, returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: i64,
    pub room_code: String,
    pub game_name: String,
    pub status: RoomStatus,
    pub max_members: i32,
    pub owner_id: UserId,
    pub label_rules: LabelRules,
    pub owner: Option<MemberView>,
    pub members: Vec<MemberView>,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}
