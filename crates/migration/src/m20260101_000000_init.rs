//! Initial Pocketbook schema.
//!
//! - `users`: known people, referenced by opaque string ids
//! - `pockets`: shared wallets with an owner, editors and watchers
//! - `pocket_members`: one row per (pocket, user) with any access, for lookups
//! - `categories`: per-pocket spend categories
//! - `spends`: incomes and expenses, with the balance they left behind
//! - `join_requests`: requests for access to a pocket

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Pockets {
    Table,
    Id,
    OwnerId,
    EditorIds,
    WatcherIds,
    Name,
    Currency,
    Icon,
    Balance,
    Level,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PocketMembers {
    Table,
    PocketId,
    UserId,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    PocketId,
    Name,
    Icon,
    IsIncome,
    DefaultSpendType,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Spends {
    Table,
    Id,
    UserId,
    PocketId,
    CategoryId,
    Name,
    Price,
    IsIncome,
    SpendType,
    Date,
    BalanceSnapshot,
    LinkedSpendId,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum JoinRequests {
    Table,
    Id,
    RequesterId,
    PocketId,
    PocketName,
    ApproverId,
    IsApproved,
    IsRejected,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Pockets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Pockets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pockets::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pockets::OwnerId).string().not_null())
                    .col(ColumnDef::new(Pockets::EditorIds).text().not_null())
                    .col(ColumnDef::new(Pockets::WatcherIds).text().not_null())
                    .col(ColumnDef::new(Pockets::Name).string().not_null())
                    .col(
                        ColumnDef::new(Pockets::Currency)
                            .string()
                            .not_null()
                            .default("IDR"),
                    )
                    .col(ColumnDef::new(Pockets::Icon).string().not_null())
                    .col(
                        ColumnDef::new(Pockets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Pockets::Level)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Pockets::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Pockets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Pockets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pockets-owner_id")
                            .from(Pockets::Table, Pockets::OwnerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pockets-owner_id")
                    .table(Pockets::Table)
                    .col(Pockets::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Pocket members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PocketMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PocketMembers::PocketId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PocketMembers::UserId).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(PocketMembers::PocketId)
                            .col(PocketMembers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pocket_members-pocket_id")
                            .from(PocketMembers::Table, PocketMembers::PocketId)
                            .to(Pockets::Table, Pockets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pocket_members-user_id")
                            .from(PocketMembers::Table, PocketMembers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-pocket_members-user_id")
                    .table(PocketMembers::Table)
                    .col(PocketMembers::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::PocketId).string().not_null())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string().not_null())
                    .col(ColumnDef::new(Categories::IsIncome).boolean().not_null())
                    .col(ColumnDef::new(Categories::DefaultSpendType).small_integer())
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Categories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-pocket_id")
                            .from(Categories::Table, Categories::PocketId)
                            .to(Pockets::Table, Pockets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-pocket_id")
                    .table(Categories::Table)
                    .col(Categories::PocketId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Spends
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Spends::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Spends::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Spends::UserId).string().not_null())
                    .col(ColumnDef::new(Spends::PocketId).string().not_null())
                    .col(ColumnDef::new(Spends::CategoryId).string())
                    .col(ColumnDef::new(Spends::Name).string().not_null())
                    .col(ColumnDef::new(Spends::Price).big_integer().not_null())
                    .col(ColumnDef::new(Spends::IsIncome).boolean().not_null())
                    .col(
                        ColumnDef::new(Spends::SpendType)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Spends::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Spends::BalanceSnapshot)
                            .big_integer()
                            .not_null(),
                    )
                    // Points at the other leg of a transfer, which lives in
                    // another pocket and may be deleted on its own.
                    .col(ColumnDef::new(Spends::LinkedSpendId).string())
                    .col(
                        ColumnDef::new(Spends::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Spends::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Spends::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-spends-pocket_id")
                            .from(Spends::Table, Spends::PocketId)
                            .to(Pockets::Table, Pockets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-spends-user_id")
                            .from(Spends::Table, Spends::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-spends-pocket_id-date-id")
                    .table(Spends::Table)
                    .col(Spends::PocketId)
                    .col(Spends::Date)
                    .col(Spends::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-spends-category_id")
                    .table(Spends::Table)
                    .col(Spends::CategoryId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Join requests
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(JoinRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JoinRequests::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::RequesterId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JoinRequests::PocketId).string().not_null())
                    .col(
                        ColumnDef::new(JoinRequests::PocketName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::ApproverId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::IsRejected)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JoinRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-join_requests-pocket_id")
                            .from(JoinRequests::Table, JoinRequests::PocketId)
                            .to(Pockets::Table, Pockets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-join_requests-approver_id")
                    .table(JoinRequests::Table)
                    .col(JoinRequests::ApproverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-join_requests-requester_id")
                    .table(JoinRequests::Table)
                    .col(JoinRequests::RequesterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JoinRequests::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Spends::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PocketMembers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pockets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
