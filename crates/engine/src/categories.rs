//! Category registry per pocket.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, SpendType, util::parse_uuid};

/// `(name, icon, is_income, default spend type)` seeded into every new pocket.
pub(crate) const DEFAULT_CATEGORIES: [(&str, &str, bool, Option<SpendType>); 25] = [
    ("Food & Drink", "utensils", false, Some(SpendType::Need)),
    ("Groceries", "basket", false, Some(SpendType::Need)),
    ("Transportation", "bus", false, Some(SpendType::Need)),
    ("Fuel", "gas-pump", false, Some(SpendType::Need)),
    ("Housing", "house", false, Some(SpendType::Need)),
    ("Utilities", "bolt", false, Some(SpendType::Need)),
    ("Internet & Phone", "wifi", false, Some(SpendType::Need)),
    ("Health", "heart-pulse", false, Some(SpendType::Need)),
    ("Insurance", "shield", false, Some(SpendType::Need)),
    ("Education", "book", false, Some(SpendType::Need)),
    ("Kids", "baby", false, Some(SpendType::Need)),
    ("Shopping", "bag", false, Some(SpendType::Want)),
    ("Entertainment", "film", false, Some(SpendType::Want)),
    ("Travel", "plane", false, Some(SpendType::Want)),
    ("Personal Care", "scissors", false, Some(SpendType::Want)),
    ("Gifts & Donations", "gift", false, Some(SpendType::Want)),
    ("Subscriptions", "repeat", false, Some(SpendType::Want)),
    ("Savings", "piggy-bank", false, Some(SpendType::Saving)),
    ("Other Expense", "ellipsis", false, None),
    ("Salary", "briefcase", true, None),
    ("Bonus", "star", true, None),
    ("Business", "store", true, None),
    ("Investment", "chart-line", true, Some(SpendType::Saving)),
    ("Gift Received", "hand-holding-heart", true, None),
    ("Other Income", "coins", true, None),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub pocket_id: Uuid,
    pub name: String,
    pub icon: String,
    pub is_income: bool,
    pub default_spend_type: Option<SpendType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub pocket_id: String,
    pub name: String,
    pub icon: String,
    pub is_income: bool,
    pub default_spend_type: Option<i16>,
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

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id.to_string()),
            pocket_id: ActiveValue::Set(category.pocket_id.to_string()),
            name: ActiveValue::Set(category.name.clone()),
            icon: ActiveValue::Set(category.icon.clone()),
            is_income: ActiveValue::Set(category.is_income),
            default_spend_type: ActiveValue::Set(
                category.default_spend_type.map(SpendType::as_i16),
            ),
            created_at: ActiveValue::Set(category.created_at),
            updated_at: ActiveValue::Set(category.updated_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            pocket_id: parse_uuid(&model.pocket_id, "pocket")?,
            name: model.name,
            icon: model.icon,
            is_income: model.is_income,
            default_spend_type: model
                .default_spend_type
                .map(SpendType::try_from)
                .transpose()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
