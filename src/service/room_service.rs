use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;

use crate::domain::{
    DivisionResult, Label, LabelRules, RoomSnapshot, RoomStatus, Team,
    room::{MAX_GAME_NAME_LEN, MAX_MAX_MEMBERS, MIN_MAX_MEMBERS},
};
use crate::domain::label::LabelRule;
use crate::error::{ServiceError, ServiceResult};
use crate::publisher::{Publisher, RoomEvent, channel_for};
use crate::repository::{NewRoom, RoomRepository};
use crate::solver::{PartitionSolver, SolverMember, build_division_result};

const CODE_GENERATION_ATTEMPTS: u32 = 10;

/// The room lifecycle state machine: validates invariants, mutates through
/// the Repository, emits events through the Publisher. Holds no state of
/// its own beyond its collaborators.
pub struct RoomService {
    repository: Arc<dyn RoomRepository>,
    publisher: Arc<dyn Publisher>,
    solver: PartitionSolver,
    rng: Mutex<StdRng>,
}

impl RoomService {
    pub fn new(repository: Arc<dyn RoomRepository>, publisher: Arc<dyn Publisher>, rng: StdRng) -> Self {
        Self { repository, publisher, solver: PartitionSolver::new(), rng: Mutex::new(rng) }
    }

    pub async fn create_room(
        &self,
        user_id: &str,
        game_name: &str,
        max_members: i32,
    ) -> ServiceResult<RoomSnapshot> {
        if self.repository.find_owned_waiting_room(user_id).await?.is_some() {
            return Err(ServiceError::HasActiveRoom);
        }
        if !(MIN_MAX_MEMBERS..=MAX_MAX_MEMBERS).contains(&max_members) {
            return Err(ServiceError::InvalidMaxMembers(MIN_MAX_MEMBERS, MAX_MAX_MEMBERS));
        }
        if game_name.is_empty() || game_name.chars().count() > MAX_GAME_NAME_LEN {
            return Err(ServiceError::InvalidGameName(MAX_GAME_NAME_LEN));
        }

        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = self.generate_room_code().await;
            let room = NewRoom {
                room_code: code,
                game_name: game_name.to_string(),
                owner_id: user_id.to_string(),
                max_members,
            };

            match self.repository.create_room(room).await {
                Ok(aggregate) => return Ok(aggregate.to_snapshot()),
                Err(ServiceError::RoomCodeConflict) => continue,
                Err(other) => return Err(other),
            }
        }

        Err(ServiceError::CodeExhausted)
    }

    async fn generate_room_code(&self) -> String {
        let mut rng = self.rng.lock().await;
        // 6 digits, first digit 1-9
        format!("{:06}", rng.random_range(100_000..1_000_000u32))
    }

    pub async fn get_room(&self, code: &str) -> ServiceResult<RoomSnapshot> {
        Ok(self.repository.get_room_by_code(code).await?.to_snapshot())
    }

    pub async fn join_room(&self, user_id: &str, code: &str) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if room.status != RoomStatus::Waiting {
            return Err(ServiceError::RoomNotJoinable);
        }

        if room.find_member(user_id).is_some() {
            return Ok(room.to_snapshot());
        }

        if room.is_full() {
            return Err(ServiceError::RoomFull);
        }

        let updated = self.repository.add_member(room.id, user_id).await?;
        let snapshot = updated.to_snapshot();
        self.publish(code, RoomEvent::MemberJoined(snapshot.clone())).await;
        Ok(snapshot)
    }

    pub async fn leave_room(&self, user_id: &str, code: &str) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if room.is_owner(user_id) {
            return self.close_room(user_id, code).await;
        }

        if room.find_member(user_id).is_none() {
            return Ok(room.to_snapshot());
        }

        let updated = self.repository.remove_member(room.id, user_id).await?;
        let snapshot = updated.to_snapshot();
        self.publish(code, RoomEvent::MemberLeft(snapshot.clone())).await;
        Ok(snapshot)
    }

    pub async fn remove_member(
        &self,
        owner_id: &str,
        code: &str,
        member_user_id: &str,
    ) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }
        if member_user_id == owner_id {
            return Err(ServiceError::CannotRemoveOwner);
        }
        if room.find_member(member_user_id).is_none() {
            return Err(ServiceError::MemberNotFound);
        }

        let updated = self.repository.remove_member(room.id, member_user_id).await?;
        let snapshot = updated.to_snapshot();
        self.publish(code, RoomEvent::MemberLeft(snapshot.clone())).await;
        Ok(snapshot)
    }

    pub async fn close_room(&self, owner_id: &str, code: &str) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }

        let snapshot = room.to_snapshot();
        self.publish(code, RoomEvent::RoomClosed).await;
        self.repository.delete_room(room.id).await?;
        Ok(snapshot)
    }

    pub async fn set_member_labels(
        &self,
        owner_id: &str,
        code: &str,
        member_user_id: &str,
        labels: &[String],
    ) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }
        if room.find_member(member_user_id).is_none() {
            return Err(ServiceError::MemberNotFound);
        }

        let parsed = parse_labels(labels)?;
        let updated = self.repository.update_member_labels(room.id, member_user_id, parsed).await?;
        let snapshot = updated.to_snapshot();
        self.publish(code, RoomEvent::RoomUpdated(snapshot.clone())).await;
        Ok(snapshot)
    }

    pub async fn set_label_rules(
        &self,
        owner_id: &str,
        code: &str,
        rules: &[(String, String)],
    ) -> ServiceResult<RoomSnapshot> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }

        let parsed = parse_label_rules(rules)?;
        if !parsed.is_consistent() {
            return Err(ServiceError::ConflictingRules);
        }

        let updated = self.repository.update_label_rules(room.id, &parsed).await?;
        let snapshot = updated.to_snapshot();
        self.publish(code, RoomEvent::RoomUpdated(snapshot.clone())).await;
        Ok(snapshot)
    }

    pub async fn divide_teams(&self, owner_id: &str, code: &str) -> ServiceResult<DivisionResult> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }
        if room.status != RoomStatus::Waiting {
            return Err(ServiceError::WrongStatus);
        }
        if room.member_count() < 2 {
            return Err(ServiceError::TooFewMembers);
        }

        let solver_members: Vec<SolverMember> = room.members.iter().map(SolverMember::from).collect();
        let outcome = {
            let mut rng = self.rng.lock().await;
            self.solver.solve(&solver_members, &room.label_rules, false, &mut *rng)
        };

        let division = build_division_result(&room.members, &outcome);

        let assignments: Vec<(String, Team)> = outcome
            .team_a
            .iter()
            .map(|id| (id.clone(), Team::TeamA))
            .chain(outcome.team_b.iter().map(|id| (id.clone(), Team::TeamB)))
            .collect();

        let fresh = self
            .repository
            .apply_division(room.id, &assignments, RoomStatus::Divided, Some(division.clone()))
            .await?;

        let snapshot = fresh.to_snapshot();
        self.publish(code, RoomEvent::TeamsDivided { room: snapshot, division: division.clone() }).await;

        Ok(division)
    }

    pub async fn redivide_teams(&self, owner_id: &str, code: &str) -> ServiceResult<DivisionResult> {
        let room = self.repository.get_room_by_code(code).await?;

        if !room.is_owner(owner_id) {
            return Err(ServiceError::NotOwner);
        }

        let reset_assignments: Vec<(String, Team)> =
            room.members.iter().map(|m| (m.user_id.clone(), Team::None)).collect();
        self.repository.apply_division(room.id, &reset_assignments, RoomStatus::Waiting, None).await?;

        self.divide_teams(owner_id, code).await
    }

    pub async fn get_division_result(&self, code: &str) -> ServiceResult<DivisionResult> {
        let room = self.repository.get_room_by_code(code).await?;

        if let Some(result) = room.division_result {
            return Ok(result);
        }

        let team_a = room.members.iter().filter(|m| m.team == Team::TeamA).map(Into::into).collect();
        let team_b = room.members.iter().filter(|m| m.team == Team::TeamB).map(Into::into).collect();
        Ok(DivisionResult { team_a, team_b })
    }

    pub async fn get_my_owned_room(&self, user_id: &str) -> ServiceResult<Option<RoomSnapshot>> {
        Ok(self.repository.find_owned_waiting_room(user_id).await?.map(|r| r.to_snapshot()))
    }

    pub async fn get_my_joined_room(&self, user_id: &str) -> ServiceResult<Option<RoomSnapshot>> {
        Ok(self.repository.find_joined_room(user_id).await?.map(|r| r.to_snapshot()))
    }

    /// Liveness probe, not part of the room state machine.
    pub async fn health(&self) -> ServiceResult<()> {
        self.repository.health_check().await
    }

    /// Closes every `waiting` room with no activity for longer than
    /// `max_age_secs`, through the same event + delete path an owner-initiated
    /// close takes. Returns the number of rooms closed.
    pub async fn close_stale_rooms(&self, max_age_secs: u64) -> ServiceResult<usize> {
        let cutoff = Utc::now() - chrono::Duration::seconds(max_age_secs as i64);
        let stale = self.repository.find_stale_waiting_rooms(cutoff).await?;

        for room in &stale {
            self.publish(&room.room_code, RoomEvent::RoomClosed).await;
            self.repository.delete_room(room.id).await?;
        }

        Ok(stale.len())
    }

    async fn publish(&self, code: &str, event: RoomEvent) {
        self.publisher.publish(&channel_for(code), event).await;
    }
}

fn parse_labels(labels: &[String]) -> ServiceResult<Vec<Label>> {
    labels
        .iter()
        .map(|raw| Label::parse(raw).ok_or_else(|| ServiceError::InvalidLabel(raw.clone())))
        .collect()
}

fn parse_label_rules(rules: &[(String, String)]) -> ServiceResult<LabelRules> {
    let mut map = std::collections::BTreeMap::new();
    for (label, rule) in rules {
        let label = Label::parse(label).ok_or_else(|| ServiceError::InvalidLabel(label.clone()))?;
        let rule = LabelRule::parse(rule).ok_or_else(|| ServiceError::InvalidRule(rule.clone()))?;
        map.insert(label, rule);
    }
    Ok(LabelRules::from_map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::broadcast::BroadcastPublisher;
    use crate::testing::InMemoryRoomRepository;
    use rand::SeedableRng;

    fn service() -> RoomService {
        RoomService::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(BroadcastPublisher::new()),
            StdRng::seed_from_u64(7),
        )
    }

    #[tokio::test]
    async fn create_room_rejects_second_active_room() {
        let svc = service();
        svc.create_room("owner-1", "uno", 4).await.unwrap();
        let err = svc.create_room("owner-1", "uno", 4).await.unwrap_err();
        assert!(matches!(err, ServiceError::HasActiveRoom));
    }

    #[tokio::test]
    async fn room_code_is_six_digits_with_nonzero_first_digit() {
        for seed in 0..50 {
            let svc = RoomService::new(
                Arc::new(InMemoryRoomRepository::new()),
                Arc::new(BroadcastPublisher::new()),
                StdRng::seed_from_u64(seed),
            );
            let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
            assert_eq!(room.room_code.len(), 6);
            assert!(room.room_code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(&room.room_code[0..1], "0");
        }
    }

    #[tokio::test]
    async fn join_room_is_idempotent() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        let first = svc.join_room("player-2", &code).await.unwrap();
        let second = svc.join_room("player-2", &code).await.unwrap();
        assert_eq!(first.member_count, second.member_count);
    }

    #[tokio::test]
    async fn join_room_rejects_full_room() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 2).await.unwrap();
        let code = room.room_code.clone();

        svc.join_room("player-2", &code).await.unwrap();
        let err = svc.join_room("player-3", &code).await.unwrap_err();
        assert!(matches!(err, ServiceError::RoomFull));
    }

    #[tokio::test]
    async fn owner_leaving_closes_room() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        svc.leave_room("owner-1", &code).await.unwrap();
        let err = svc.get_room(&code).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn set_label_rules_rejects_two_same_team_labels() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        let rules = vec![
            ("god".to_string(), "same_team".to_string()),
            ("boss".to_string(), "same_team".to_string()),
        ];
        let err = svc.set_label_rules("owner-1", &code, &rules).await.unwrap_err();
        assert!(matches!(err, ServiceError::ConflictingRules));
    }

    #[tokio::test]
    async fn divide_teams_requires_two_members() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        let err = svc.divide_teams("owner-1", &code).await.unwrap_err();
        assert!(matches!(err, ServiceError::TooFewMembers));
    }

    #[tokio::test]
    async fn divide_teams_assigns_every_member() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();
        svc.join_room("player-2", &code).await.unwrap();
        svc.join_room("player-3", &code).await.unwrap();

        let division = svc.divide_teams("owner-1", &code).await.unwrap();
        assert_eq!(division.team_a.len() + division.team_b.len(), 3);

        let snapshot = svc.get_room(&code).await.unwrap();
        assert_eq!(snapshot.status, RoomStatus::Divided);
    }

    #[tokio::test]
    async fn close_stale_rooms_sweeps_inactive_waiting_rooms() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        let closed = svc.close_stale_rooms(0).await.unwrap();
        assert_eq!(closed, 1);

        let err = svc.get_room(&code).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn close_stale_rooms_leaves_fresh_rooms_alone() {
        let svc = service();
        let room = svc.create_room("owner-1", "uno", 4).await.unwrap();
        let code = room.room_code.clone();

        let closed = svc.close_stale_rooms(3600).await.unwrap();
        assert_eq!(closed, 0);
        svc.get_room(&code).await.unwrap();
    }
}
