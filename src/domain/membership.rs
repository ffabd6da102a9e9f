use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{label::Label, user::UserId};

/// Which side of a division a member has landed on. `None` before a room
/// has been divided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[default]
    None,
    TeamA,
    TeamB,
}

impl Team {
    pub fn as_str(self) -> &'static str {
        match self {
            Team::None => "none",
            Team::TeamA => "team_a",
            Team::TeamB => "team_b",
        }
    }

    pub fn parse(s: &str) -> Option<Team> {
        match s {
            "none" => Some(Team::None),
            "team_a" => Some(Team::TeamA),
            "team_b" => Some(Team::TeamB),
            _ => None,
        }
    }

    pub fn opposite(self) -> Option<Team> {
        match self {
            Team::TeamA => Some(Team::TeamB),
            Team::TeamB => Some(Team::TeamA),
            Team::None => None,
        }
    }
}

/// A (room, user) pair: one membership row plus the projected user facts
/// (name, avatar) the Repository joins in from the user profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub room_id: i64,
    pub user_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub team: Team,
    pub labels: Vec<Label>,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn has_label(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }
}

/// The member projection carried in a room snapshot or division result:
/// identifier, name, avatar, labels (and, in a snapshot, team + join time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProjection {
    pub id: UserId,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub labels: Vec<Label>,
}

impl From<&Membership> for MemberProjection {
    fn from(m: &Membership) -> Self {
        Self {
            id: m.user_id.clone(),
            nickname: m.display_name.clone(),
            avatar_url: m.avatar_url.clone(),
            labels: m.labels.clone(),
        }
    }
}
