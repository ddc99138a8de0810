//! Membership projection: one row per `(pocket, user)` with any access.
//!
//! The pocket's editor/watcher lists are authoritative; these rows are kept in
//! sync by the same transaction and exist so "pockets of a user" is a query.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pocket_members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub pocket_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pockets::Entity",
        from = "Column::PocketId",
        to = "super::pockets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Pocket,
}

impl Related<super::pockets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pocket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
