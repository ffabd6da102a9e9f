//! Test doubles for the Repository and Publisher ports, used by service and
//! API integration tests. Never compiled into the release binary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{DivisionResult, Label, LabelRules, Membership, RoomAggregate, RoomStatus, Team};
use crate::error::ServiceError;
use crate::repository::{NewRoom, RoomRepository};

/// An in-memory stand-in for `SeaOrmRoomRepository`, serializing all access
/// behind a single mutex (the real implementation serializes per-room via
/// row locks; a single lock is an acceptable simplification for tests).
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<i64, RoomAggregate>>,
    next_room_id: AtomicI64,
    next_member_id: AtomicI64,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self { rooms: Mutex::new(HashMap::new()), next_room_id: AtomicI64::new(1), next_member_id: AtomicI64::new(1) }
    }

    async fn find_by_code(&self, code: &str) -> Option<RoomAggregate> {
        self.rooms.lock().await.values().find(|r| r.room_code == code).cloned()
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, room: NewRoom) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;

        if rooms.values().any(|r| r.room_code == room.room_code) {
            return Err(ServiceError::RoomCodeConflict);
        }

        let now = Utc::now();
        let room_id = self.next_room_id.fetch_add(1, Ordering::SeqCst);
        let member_id = self.next_member_id.fetch_add(1, Ordering::SeqCst);

        let owner_membership = Membership {
            id: member_id,
            room_id,
            user_id: room.owner_id.clone(),
            display_name: room.owner_id.clone(),
            avatar_url: None,
            team: Team::None,
            labels: Vec::new(),
            joined_at: now,
        };

        let aggregate = RoomAggregate {
            id: room_id,
            room_code: room.room_code,
            game_name: room.game_name,
            owner_id: room.owner_id,
            status: RoomStatus::Waiting,
            max_members: room.max_members,
            label_rules: LabelRules::default(),
            division_result: None,
            members: vec![owner_membership],
            created_at: now,
            updated_at: now,
        };

        rooms.insert(room_id, aggregate.clone());
        Ok(aggregate)
    }

    async fn get_room_by_code(&self, code: &str) -> Result<RoomAggregate, ServiceError> {
        self.find_by_code(code).await.ok_or(ServiceError::NotFound)
    }

    async fn find_owned_waiting_room(&self, user_id: &str) -> Result<Option<RoomAggregate>, ServiceError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .values()
            .find(|r| r.owner_id == user_id && r.status == RoomStatus::Waiting)
            .cloned())
    }

    async fn find_joined_room(&self, user_id: &str) -> Result<Option<RoomAggregate>, ServiceError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .values()
            .find(|r| r.owner_id != user_id && r.find_member(user_id).is_some())
            .cloned())
    }

    async fn add_member(&self, room_id: i64, user_id: &str) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;

        if room.find_member(user_id).is_some() {
            return Err(ServiceError::AlreadyMember);
        }

        let member_id = self.next_member_id.fetch_add(1, Ordering::SeqCst);
        room.members.push(Membership {
            id: member_id,
            room_id,
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            avatar_url: None,
            team: Team::None,
            labels: Vec::new(),
            joined_at: Utc::now(),
        });
        room.updated_at = Utc::now();

        Ok(room.clone())
    }

    async fn remove_member(&self, room_id: i64, user_id: &str) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;
        room.members.retain(|m| m.user_id != user_id);
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn update_member_team(&self, room_id: i64, user_id: &str, team: Team) -> Result<(), ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;
        if let Some(member) = room.members.iter_mut().find(|m| m.user_id == user_id) {
            member.team = team;
        }
        Ok(())
    }

    async fn update_member_labels(
        &self,
        room_id: i64,
        user_id: &str,
        labels: Vec<Label>,
    ) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;
        let member = room
            .members
            .iter_mut()
            .find(|m| m.user_id == user_id)
            .ok_or(ServiceError::MemberNotFound)?;
        member.labels = labels;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn update_room(&self, room: &RoomAggregate) -> Result<(), ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let existing = rooms.get_mut(&room.id).ok_or(ServiceError::NotFound)?;
        existing.status = room.status;
        existing.label_rules = room.label_rules.clone();
        existing.division_result = room.division_result.clone();
        existing.updated_at = Utc::now();
        Ok(())
    }

    async fn update_label_rules(&self, room_id: i64, rules: &LabelRules) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;
        room.label_rules = rules.clone();
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&self, room_id: i64) -> Result<(), ServiceError> {
        self.rooms.lock().await.remove(&room_id);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn apply_division(
        &self,
        room_id: i64,
        assignments: &[(String, Team)],
        status: RoomStatus,
        division_result: Option<DivisionResult>,
    ) -> Result<RoomAggregate, ServiceError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(&room_id).ok_or(ServiceError::NotFound)?;

        for (user_id, team) in assignments {
            let member = room
                .members
                .iter_mut()
                .find(|m| &m.user_id == user_id)
                .ok_or(ServiceError::MemberNotFound)?;
            member.team = *team;
        }

        room.status = status;
        room.division_result = division_result;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn find_stale_waiting_rooms(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RoomAggregate>, ServiceError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .values()
            .filter(|r| r.status == RoomStatus::Waiting && r.updated_at < older_than)
            .cloned()
            .collect())
    }
}

/// Used by `get_division_result` reconstruction when a room has not been
/// persisted with a cached result yet; kept here so solver tests and service
/// tests share one seam for building expected outcomes.
#[allow(dead_code)]
pub fn empty_division_result() -> DivisionResult {
    DivisionResult::default()
}
