//! Join requests: a non-member asks the pocket owner for access.
//!
//! `Pending -> Approved` or `Pending -> Rejected`; both outcomes are final.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub id: Uuid,
    pub requester_id: String,
    pub pocket_id: Uuid,
    pub pocket_name: String,
    pub approver_id: String,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JoinRequest {
    pub fn status(&self) -> JoinRequestStatus {
        match (self.is_approved, self.is_rejected) {
            (true, _) => JoinRequestStatus::Approved,
            (false, true) => JoinRequestStatus::Rejected,
            (false, false) => JoinRequestStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status() != JoinRequestStatus::Pending
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "join_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub requester_id: String,
    pub pocket_id: String,
    pub pocket_name: String,
    pub approver_id: String,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

impl From<&JoinRequest> for ActiveModel {
    fn from(request: &JoinRequest) -> Self {
        Self {
            id: ActiveValue::Set(request.id.to_string()),
            requester_id: ActiveValue::Set(request.requester_id.clone()),
            pocket_id: ActiveValue::Set(request.pocket_id.to_string()),
            pocket_name: ActiveValue::Set(request.pocket_name.clone()),
            approver_id: ActiveValue::Set(request.approver_id.clone()),
            is_approved: ActiveValue::Set(request.is_approved),
            is_rejected: ActiveValue::Set(request.is_rejected),
            created_at: ActiveValue::Set(request.created_at),
            updated_at: ActiveValue::Set(request.updated_at),
        }
    }
}

impl TryFrom<Model> for JoinRequest {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "join request")?,
            requester_id: model.requester_id,
            pocket_id: parse_uuid(&model.pocket_id, "pocket")?,
            pocket_name: model.pocket_name,
            approver_id: model.approver_id,
            is_approved: model.is_approved,
            is_rejected: model.is_rejected,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
