//! Spend primitives.
//!
//! A `Spend` is one ledger entry (income or expense) against a pocket. The
//! price is always a non-negative magnitude; the sign comes from `is_income`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendType {
    #[default]
    General,
    Need,
    Want,
    Saving,
    /// Assigned to both legs of a pocket-to-pocket transfer.
    Transfer,
}

impl SpendType {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::General => 0,
            Self::Need => 1,
            Self::Want => 2,
            Self::Saving => 3,
            Self::Transfer => 4,
        }
    }
}

impl TryFrom<i16> for SpendType {
    type Error = EngineError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::General),
            1 => Ok(Self::Need),
            2 => Ok(Self::Want),
            3 => Ok(Self::Saving),
            4 => Ok(Self::Transfer),
            other => Err(EngineError::Validation(format!(
                "invalid spend type: {other}"
            ))),
        }
    }
}

/// Contribution of an entry to its pocket balance.
pub fn signed_price(price: i64, is_income: bool) -> i64 {
    if is_income { price } else { -price }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spend {
    pub id: Uuid,
    pub user_id: String,
    pub pocket_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub price: i64,
    pub is_income: bool,
    pub spend_type: SpendType,
    /// Transaction date chosen by the user.
    pub date: DateTime<Utc>,
    /// Pocket balance right after this entry was applied.
    pub balance_snapshot: i64,
    /// The other leg of a transfer, if this entry is one.
    pub linked_spend_id: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spend {
    pub fn signed_price(&self) -> i64 {
        signed_price(self.price, self.is_income)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "spends")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub pocket_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub price: i64,
    pub is_income: bool,
    pub spend_type: i16,
    pub date: DateTimeUtc,
    pub balance_snapshot: i64,
    pub linked_spend_id: Option<String>,
    pub version: i64,
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

impl From<&Spend> for ActiveModel {
    fn from(spend: &Spend) -> Self {
        Self {
            id: ActiveValue::Set(spend.id.to_string()),
            user_id: ActiveValue::Set(spend.user_id.clone()),
            pocket_id: ActiveValue::Set(spend.pocket_id.to_string()),
            category_id: ActiveValue::Set(spend.category_id.map(|id| id.to_string())),
            name: ActiveValue::Set(spend.name.clone()),
            price: ActiveValue::Set(spend.price),
            is_income: ActiveValue::Set(spend.is_income),
            spend_type: ActiveValue::Set(spend.spend_type.as_i16()),
            date: ActiveValue::Set(spend.date),
            balance_snapshot: ActiveValue::Set(spend.balance_snapshot),
            linked_spend_id: ActiveValue::Set(spend.linked_spend_id.map(|id| id.to_string())),
            version: ActiveValue::Set(spend.version),
            created_at: ActiveValue::Set(spend.created_at),
            updated_at: ActiveValue::Set(spend.updated_at),
        }
    }
}

impl TryFrom<Model> for Spend {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "spend")?,
            user_id: model.user_id,
            pocket_id: parse_uuid(&model.pocket_id, "pocket")?,
            category_id: model
                .category_id
                .as_deref()
                .map(|id| parse_uuid(id, "category"))
                .transpose()?,
            name: model.name,
            price: model.price,
            is_income: model.is_income,
            spend_type: SpendType::try_from(model.spend_type)?,
            date: model.date,
            balance_snapshot: model.balance_snapshot,
            linked_spend_id: model
                .linked_spend_id
                .as_deref()
                .map(|id| parse_uuid(id, "spend"))
                .transpose()?,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_follows_is_income() {
        assert_eq!(signed_price(500, true), 500);
        assert_eq!(signed_price(500, false), -500);
        assert_eq!(signed_price(0, false), 0);
    }

    #[test]
    fn unknown_spend_type_is_rejected() {
        assert_eq!(SpendType::Transfer.as_i16(), 4);
        assert!(matches!(
            SpendType::try_from(9),
            Err(EngineError::Validation(_))
        ));
    }
}
