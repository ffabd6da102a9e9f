use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, RuntimeErr, TransactionTrait,
};

use crate::{
    domain::{DivisionResult, Label, LabelRules, Membership, RoomAggregate, RoomStatus, Team},
    error::ServiceError,
    repository::{NewRoom, RoomRepository, entities::prelude::*, entities::room, entities::membership, entities::user_profile},
};

pub struct SeaOrmRoomRepository {
    conn: DatabaseConnection,
}

impl SeaOrmRoomRepository {
    pub async fn new(url: &str, pool_size: u32) -> Result<Self, ServiceError> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size).min_connections(1);

        let conn = Database::connect(opt)
            .await
            .map_err(|e| ServiceError::Config(format!("failed to connect to database: {e}")))?;

        Ok(Self { conn })
    }

    pub async fn run_migrations(&self) -> Result<(), ServiceError> {
        room_party_migration::Migrator::up(&self.conn, None).await?;
        Ok(())
    }

    async fn load_aggregate(
        conn: &impl ConnectionTrait,
        model: room::Model,
    ) -> Result<RoomAggregate, ServiceError> {
        let member_rows = Membership::find()
            .filter(membership::Column::RoomId.eq(model.id))
            .all(conn)
            .await?;

        let user_ids: Vec<String> = member_rows.iter().map(|m| m.user_id.clone()).collect();
        let profiles = if user_ids.is_empty() {
            Vec::new()
        } else {
            UserProfile::find().filter(user_profile::Column::Id.is_in(user_ids)).all(conn).await?
        };

        let mut members = Vec::with_capacity(member_rows.len());
        for row in member_rows {
            let profile = profiles.iter().find(|p| p.id == row.user_id);
            let labels: Vec<Label> = serde_json::from_str(&row.labels).unwrap_or_default();

            members.push(Membership {
                id: row.id,
                room_id: row.room_id,
                user_id: row.user_id.clone(),
                display_name: profile.map(|p| p.display_name.clone()).unwrap_or_default(),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                team: Team::parse(&row.team).unwrap_or_default(),
                labels,
                joined_at: row.joined_at,
            });
        }
        members.sort_by_key(|m| m.joined_at);

        let label_rules: LabelRules =
            serde_json::from_str(&model.label_rules).unwrap_or_default();
        let division_result = model
            .division_result
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok());

        Ok(RoomAggregate {
            id: model.id,
            room_code: model.room_code,
            game_name: model.game_name,
            owner_id: model.owner_id,
            status: RoomStatus::parse(&model.status).unwrap_or(RoomStatus::Waiting),
            max_members: model.max_members,
            label_rules,
            division_result,
            members,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    async fn get_by_id(
        conn: &impl ConnectionTrait,
        room_id: i64,
    ) -> Result<RoomAggregate, ServiceError> {
        let model = Room::find_by_id(room_id).one(conn).await?.ok_or(ServiceError::NotFound)?;
        Self::load_aggregate(conn, model).await
    }

    async fn ensure_profile(
        conn: &impl ConnectionTrait,
        user_id: &str,
    ) -> Result<(), ServiceError> {
        if UserProfile::find_by_id(user_id.to_string()).one(conn).await?.is_some() {
            return Ok(());
        }

        let now = Utc::now();
        let active = user_profile::ActiveModel {
            id: Set(user_id.to_string()),
            display_name: Set(user_id.to_string()),
            avatar_url: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Another concurrent caller may have just inserted the same row; a unique
        // violation here is harmless, the profile already exists.
        match active.insert(conn).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => {
            e.as_database_error().is_some_and(|d| d.is_unique_violation())
        }
        DbErr::RecordNotInserted => false,
        _ => false,
    }
}

#[async_trait]
impl RoomRepository for SeaOrmRoomRepository {
    async fn create_room(&self, room: NewRoom) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        Self::ensure_profile(&txn, &room.owner_id).await?;

        let now = Utc::now();
        let active = room::ActiveModel {
            id: Default::default(),
            room_code: Set(room.room_code),
            game_name: Set(room.game_name),
            owner_id: Set(room.owner_id.clone()),
            status: Set(RoomStatus::Waiting.as_str().to_string()),
            max_members: Set(room.max_members),
            label_rules: Set(serde_json::to_string(&LabelRules::default()).unwrap()),
            division_result: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = match active.insert(&txn).await {
            Ok(model) => model,
            Err(e) if is_unique_violation(&e) => return Err(ServiceError::RoomCodeConflict),
            Err(e) => return Err(e.into()),
        };

        let member = membership::ActiveModel {
            id: Default::default(),
            room_id: Set(inserted.id),
            user_id: Set(room.owner_id),
            team: Set(Team::None.as_str().to_string()),
            labels: Set(serde_json::to_string(&Vec::<Label>::new()).unwrap()),
            joined_at: Set(now),
        };
        member.insert(&txn).await?;

        let aggregate = Self::get_by_id(&txn, inserted.id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn get_room_by_code(&self, code: &str) -> Result<RoomAggregate, ServiceError> {
        let model = Room::find()
            .filter(room::Column::RoomCode.eq(code))
            .one(&self.conn)
            .await?
            .ok_or(ServiceError::NotFound)?;
        Self::load_aggregate(&self.conn, model).await
    }

    async fn find_owned_waiting_room(
        &self,
        user_id: &str,
    ) -> Result<Option<RoomAggregate>, ServiceError> {
        let model = Room::find()
            .filter(room::Column::OwnerId.eq(user_id))
            .filter(room::Column::Status.eq(RoomStatus::Waiting.as_str()))
            .one(&self.conn)
            .await?;

        match model {
            Some(model) => Ok(Some(Self::load_aggregate(&self.conn, model).await?)),
            None => Ok(None),
        }
    }

    async fn find_joined_room(
        &self,
        user_id: &str,
    ) -> Result<Option<RoomAggregate>, ServiceError> {
        let rooms = Room::find()
            .filter(room::Column::OwnerId.ne(user_id))
            .inner_join(Membership)
            .filter(membership::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await?;

        match rooms.into_iter().next() {
            Some(model) => Ok(Some(Self::load_aggregate(&self.conn, model).await?)),
            None => Ok(None),
        }
    }

    async fn add_member(
        &self,
        room_id: i64,
        user_id: &str,
    ) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        // acquire the per-room lock for the duration of this mutation
        let _locked =
            Room::find_by_id(room_id).lock_exclusive().one(&txn).await?.ok_or(ServiceError::NotFound)?;

        Self::ensure_profile(&txn, user_id).await?;

        let already = Membership::find()
            .filter(membership::Column::RoomId.eq(room_id))
            .filter(membership::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        if already.is_some() {
            return Err(ServiceError::AlreadyMember);
        }

        let member = membership::ActiveModel {
            id: Default::default(),
            room_id: Set(room_id),
            user_id: Set(user_id.to_string()),
            team: Set(Team::None.as_str().to_string()),
            labels: Set(serde_json::to_string(&Vec::<Label>::new()).unwrap()),
            joined_at: Set(Utc::now()),
        };
        member.insert(&txn).await?;

        let aggregate = Self::get_by_id(&txn, room_id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn remove_member(
        &self,
        room_id: i64,
        user_id: &str,
    ) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        let _locked =
            Room::find_by_id(room_id).lock_exclusive().one(&txn).await?.ok_or(ServiceError::NotFound)?;

        Membership::delete_many()
            .filter(membership::Column::RoomId.eq(room_id))
            .filter(membership::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let aggregate = Self::get_by_id(&txn, room_id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn update_member_team(
        &self,
        room_id: i64,
        user_id: &str,
        team: Team,
    ) -> Result<(), ServiceError> {
        let txn = self.conn.begin().await?;

        let model = Membership::find()
            .filter(membership::Column::RoomId.eq(room_id))
            .filter(membership::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(ServiceError::MemberNotFound)?;

        let mut active: membership::ActiveModel = model.into();
        active.team = Set(team.as_str().to_string());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn update_member_labels(
        &self,
        room_id: i64,
        user_id: &str,
        labels: Vec<Label>,
    ) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        let model = Membership::find()
            .filter(membership::Column::RoomId.eq(room_id))
            .filter(membership::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
            .ok_or(ServiceError::MemberNotFound)?;

        let mut active: membership::ActiveModel = model.into();
        active.labels = Set(serde_json::to_string(&labels).unwrap());
        active.update(&txn).await?;

        let aggregate = Self::get_by_id(&txn, room_id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn update_room(&self, room: &RoomAggregate) -> Result<(), ServiceError> {
        let txn = self.conn.begin().await?;

        let model = Room::find_by_id(room.id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::NotFound)?;

        // Persisted status is always waiting/divided; `closed` rooms are deleted.
        let persisted_status = if room.status == RoomStatus::Closed {
            RoomStatus::Waiting
        } else {
            room.status
        };

        let mut active: room::ActiveModel = model.into();
        active.status = Set(persisted_status.as_str().to_string());
        active.label_rules = Set(serde_json::to_string(&room.label_rules).unwrap());
        active.division_result =
            Set(room.division_result.as_ref().map(|d| serde_json::to_string(d).unwrap()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        for member in &room.members {
            let existing = Membership::find()
                .filter(membership::Column::RoomId.eq(room.id))
                .filter(membership::Column::UserId.eq(&member.user_id))
                .one(&txn)
                .await?;

            if let Some(existing) = existing {
                let mut active: membership::ActiveModel = existing.into();
                active.team = Set(member.team.as_str().to_string());
                active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    async fn update_label_rules(
        &self,
        room_id: i64,
        rules: &LabelRules,
    ) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        let model = Room::find_by_id(room_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let mut active: room::ActiveModel = model.into();
        active.label_rules = Set(serde_json::to_string(rules).unwrap());
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        let aggregate = Self::get_by_id(&txn, room_id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn delete_room(&self, room_id: i64) -> Result<(), ServiceError> {
        let txn = self.conn.begin().await?;

        let _locked =
            Room::find_by_id(room_id).lock_exclusive().one(&txn).await?.ok_or(ServiceError::NotFound)?;

        Room::delete_by_id(room_id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn apply_division(
        &self,
        room_id: i64,
        assignments: &[(String, Team)],
        status: RoomStatus,
        division_result: Option<DivisionResult>,
    ) -> Result<RoomAggregate, ServiceError> {
        let txn = self.conn.begin().await?;

        let model = Room::find_by_id(room_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ServiceError::NotFound)?;

        for (user_id, team) in assignments {
            let member = Membership::find()
                .filter(membership::Column::RoomId.eq(room_id))
                .filter(membership::Column::UserId.eq(user_id.as_str()))
                .one(&txn)
                .await?
                .ok_or(ServiceError::MemberNotFound)?;

            let mut active: membership::ActiveModel = member.into();
            active.team = Set(team.as_str().to_string());
            active.update(&txn).await?;
        }

        let persisted_status = if status == RoomStatus::Closed { RoomStatus::Waiting } else { status };

        let mut active: room::ActiveModel = model.into();
        active.status = Set(persisted_status.as_str().to_string());
        active.division_result = Set(division_result.as_ref().map(|d| serde_json::to_string(d).unwrap()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        let aggregate = Self::get_by_id(&txn, room_id).await?;
        txn.commit().await?;
        Ok(aggregate)
    }

    async fn find_stale_waiting_rooms(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RoomAggregate>, ServiceError> {
        let models = Room::find()
            .filter(room::Column::Status.eq(RoomStatus::Waiting.as_str()))
            .filter(room::Column::UpdatedAt.lt(older_than))
            .all(&self.conn)
            .await?;

        let mut aggregates = Vec::with_capacity(models.len());
        for model in models {
            aggregates.push(Self::load_aggregate(&self.conn, model).await?);
        }
        Ok(aggregates)
    }
}
