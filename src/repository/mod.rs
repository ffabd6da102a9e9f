pub mod entities;
pub mod sea_orm_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{DivisionResult, LabelRules, RoomAggregate, RoomStatus, Team, user::UserId};
use crate::error::ServiceError;

pub use sea_orm_repo::SeaOrmRoomRepository;

/// A new room to persist, before it is assigned an id.
pub struct NewRoom {
    pub room_code: String,
    pub game_name: String,
    pub owner_id: UserId,
    pub max_members: i32,
}

/// The persistence contract. Every mutating call is executed
/// within a transaction that holds at least a row-level lock on the target
/// room, so concurrent calls against the same room serialize.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Persists a new room and its owner membership. Fails with
    /// `RoomCodeConflict` if the code is already used by a non-closed room.
    async fn create_room(&self, room: NewRoom) -> Result<RoomAggregate, ServiceError>;

    /// Returns the full aggregate (room + members + user projections).
    async fn get_room_by_code(&self, code: &str) -> Result<RoomAggregate, ServiceError>;

    /// Returns a waiting room owned by the user, or nothing.
    async fn find_owned_waiting_room(
        &self,
        user_id: &str,
    ) -> Result<Option<RoomAggregate>, ServiceError>;

    /// Returns at most one non-closed, non-owned room the user belongs to.
    async fn find_joined_room(&self, user_id: &str)
    -> Result<Option<RoomAggregate>, ServiceError>;

    /// Inserts a membership with team=`none`. Fails `AlreadyMember` on duplicate.
    async fn add_member(
        &self,
        room_id: i64,
        user_id: &str,
    ) -> Result<RoomAggregate, ServiceError>;

    /// Deletes a membership. Idempotent.
    async fn remove_member(
        &self,
        room_id: i64,
        user_id: &str,
    ) -> Result<RoomAggregate, ServiceError>;

    async fn update_member_team(
        &self,
        room_id: i64,
        user_id: &str,
        team: Team,
    ) -> Result<(), ServiceError>;

    async fn update_member_labels(
        &self,
        room_id: i64,
        user_id: &str,
        labels: Vec<crate::domain::Label>,
    ) -> Result<RoomAggregate, ServiceError>;

    /// Persists status, labelRules, and divisionResult.
    async fn update_room(&self, room: &RoomAggregate) -> Result<(), ServiceError>;

    /// Writes every listed member's team, the room status, and the cached
    /// division result in one transaction under the room's exclusive lock,
    /// so a divide/redivide can never be observed half-applied.
    async fn apply_division(
        &self,
        room_id: i64,
        assignments: &[(String, Team)],
        status: RoomStatus,
        division_result: Option<DivisionResult>,
    ) -> Result<RoomAggregate, ServiceError>;

    /// Persists `labelRules` only, enforcing the owner-only, rule-validated path.
    async fn update_label_rules(
        &self,
        room_id: i64,
        rules: &LabelRules,
    ) -> Result<RoomAggregate, ServiceError>;

    /// Cascades to memberships.
    async fn delete_room(&self, room_id: i64) -> Result<(), ServiceError>;

    /// Trivial liveness probe, not part of the domain state machine.
    async fn health_check(&self) -> Result<(), ServiceError>;

    /// Rooms still `waiting` whose last update predates `older_than`, for the
    /// auto-expiry sweep.
    async fn find_stale_waiting_rooms(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RoomAggregate>, ServiceError>;
}
