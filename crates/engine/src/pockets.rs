//! The `Pocket` is a shared wallet: one owner, editors (read/write) and
//! watchers (read-only). It carries the running balance of its spends.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, util::parse_uuid};

/// Feature tier assigned to freshly created pockets.
pub const DEFAULT_LEVEL: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pocket {
    pub id: Uuid,
    pub owner_id: String,
    pub editor_ids: BTreeSet<String>,
    pub watcher_ids: BTreeSet<String>,
    pub name: String,
    pub currency: Currency,
    pub icon: String,
    /// Minor units. Σ signed(price) over the pocket's spends.
    pub balance: i64,
    pub level: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pocket {
    /// Deduplicated union of owner, editors and watchers: the rows the
    /// membership projection must hold.
    pub fn member_ids(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self
            .editor_ids
            .union(&self.watcher_ids)
            .cloned()
            .collect();
        out.insert(self.owner_id.clone());
        out
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "pockets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    /// JSON array of user ids.
    pub editor_ids: String,
    /// JSON array of user ids.
    pub watcher_ids: String,
    pub name: String,
    pub currency: String,
    pub icon: String,
    pub balance: i64,
    pub level: i32,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pocket_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::spends::Entity")]
    Spends,
    #[sea_orm(has_many = "super::categories::Entity")]
    Categories,
}

impl Related<super::pocket_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::spends::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Spends.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn encode_ids(ids: &BTreeSet<String>) -> ResultEngine<String> {
    serde_json::to_string(ids)
        .map_err(|_| EngineError::Validation("invalid member id list".to_string()))
}

fn decode_ids(raw: &str) -> ResultEngine<BTreeSet<String>> {
    serde_json::from_str(raw)
        .map_err(|_| EngineError::Validation("invalid member id list".to_string()))
}

impl TryFrom<&Pocket> for ActiveModel {
    type Error = EngineError;

    fn try_from(pocket: &Pocket) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(pocket.id.to_string()),
            owner_id: ActiveValue::Set(pocket.owner_id.clone()),
            editor_ids: ActiveValue::Set(encode_ids(&pocket.editor_ids)?),
            watcher_ids: ActiveValue::Set(encode_ids(&pocket.watcher_ids)?),
            name: ActiveValue::Set(pocket.name.clone()),
            currency: ActiveValue::Set(pocket.currency.code().to_string()),
            icon: ActiveValue::Set(pocket.icon.clone()),
            balance: ActiveValue::Set(pocket.balance),
            level: ActiveValue::Set(pocket.level),
            version: ActiveValue::Set(pocket.version),
            created_at: ActiveValue::Set(pocket.created_at),
            updated_at: ActiveValue::Set(pocket.updated_at),
        })
    }
}

impl TryFrom<Model> for Pocket {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "pocket")?,
            owner_id: model.owner_id,
            editor_ids: decode_ids(&model.editor_ids)?,
            watcher_ids: decode_ids(&model.watcher_ids)?,
            name: model.name,
            currency: Currency::try_from(model.currency.as_str())?,
            icon: model.icon,
            balance: model.balance,
            level: model.level,
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
    fn member_ids_deduplicates_owner_and_lists() {
        let now = Utc::now();
        let pocket = Pocket {
            id: Uuid::nil(),
            owner_id: "alice".to_string(),
            editor_ids: ["alice".to_string(), "bob".to_string()].into(),
            watcher_ids: ["bob".to_string(), "carol".to_string()].into(),
            name: "Trip".to_string(),
            currency: Currency::Idr,
            icon: String::new(),
            balance: 0,
            level: DEFAULT_LEVEL,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let members: Vec<String> = pocket.member_ids().into_iter().collect();
        assert_eq!(members, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn member_lists_round_trip_through_json() {
        let ids: BTreeSet<String> = ["b".to_string(), "a".to_string()].into();
        let raw = encode_ids(&ids).unwrap();
        assert_eq!(raw, r#"["a","b"]"#);
        assert_eq!(decode_ids(&raw).unwrap(), ids);
    }
}
