use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfile::Table)
                    .col(string(UserProfile::Id).primary_key())
                    .col(string(UserProfile::DisplayName))
                    .col(string_null(UserProfile::AvatarUrl))
                    .col(timestamp(UserProfile::CreatedAt))
                    .col(timestamp(UserProfile::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Room::Table)
                    .col(pk_auto(Room::Id))
                    .col(string_len(Room::RoomCode, 6).unique_key())
                    .col(string(Room::GameName))
                    .col(string(Room::OwnerId))
                    .col(string(Room::Status))
                    .col(integer(Room::MaxMembers))
                    .col(text(Room::LabelRules))
                    .col(text_null(Room::DivisionResult))
                    .col(timestamp(Room::CreatedAt))
                    .col(timestamp(Room::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Membership::Table)
                    .col(pk_auto(Membership::Id))
                    .col(integer(Membership::RoomId))
                    .col(string(Membership::UserId))
                    .col(string(Membership::Team))
                    .col(text(Membership::Labels))
                    .col(timestamp(Membership::JoinedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_membership_room")
                            .from(Membership::Table, Membership::RoomId)
                            .to(Room::Table, Room::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_membership_room_user")
                            .table(Membership::Table)
                            .col(Membership::RoomId)
                            .col(Membership::UserId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Membership::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Room::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserProfile::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum UserProfile {
    Table,
    Id,
    DisplayName,
    AvatarUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Room {
    Table,
    Id,
    RoomCode,
    GameName,
    OwnerId,
    Status,
    MaxMembers,
    LabelRules,
    DivisionResult,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Membership {
    Table,
    Id,
    RoomId,
    UserId,
    Team,
    Labels,
    JoinedAt,
}
