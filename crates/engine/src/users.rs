//! Users table (minimal entity).
//!
//! Identities are provisioned outside the engine; the engine only resolves
//! ids to existence and display names.

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryFilter, entity::prelude::*};

use crate::ResultEngine;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Batch lookup: returns `id -> name` for the ids that exist.
pub(crate) async fn find_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = &String>,
) -> ResultEngine<HashMap<String, String>> {
    let ids: Vec<String> = ids.into_iter().cloned().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Entity::find()
        .filter(Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|m| (m.id, m.name)).collect())
}
