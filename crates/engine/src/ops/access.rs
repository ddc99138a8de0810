use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Pocket, ResultEngine, Spend, access, categories, pocket_members, pockets, spends,
    users,
};

use super::Engine;

impl Engine {
    pub(super) async fn load_pocket<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
    ) -> ResultEngine<Pocket> {
        let model = pockets::Entity::find_by_id(pocket_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("pocket not exists".to_string()))?;
        Pocket::try_from(model)
    }

    pub(super) async fn require_pocket_read<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Pocket> {
        let pocket = self.load_pocket(db, pocket_id).await?;
        access::require_read(&pocket, user_id)?;
        Ok(pocket)
    }

    pub(super) async fn require_pocket_write<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Pocket> {
        let pocket = self.load_pocket(db, pocket_id).await?;
        access::require_write(&pocket, user_id)?;
        Ok(pocket)
    }

    pub(super) async fn load_spend<C: ConnectionTrait>(
        &self,
        db: &C,
        spend_id: Uuid,
    ) -> ResultEngine<Spend> {
        let model = spends::Entity::find_by_id(spend_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("spend not exists".to_string()))?;
        Spend::try_from(model)
    }

    /// The category must exist and belong to `pocket_id`.
    pub(super) async fn require_category_in_pocket<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        category_id: Uuid,
    ) -> ResultEngine<()> {
        let found = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::PocketId.eq(pocket_id.to_string()))
            .one(db)
            .await?;
        if found.is_none() {
            return Err(EngineError::KeyNotFound(
                "category not exists".to_string(),
            ));
        }
        Ok(())
    }

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<()> {
        let found = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?;
        if found.is_none() {
            return Err(EngineError::KeyNotFound(format!("user {user_id}")));
        }
        Ok(())
    }

    /// Ids of every pocket `user_id` holds a membership row for.
    pub(super) async fn member_pocket_ids<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<BTreeSet<String>> {
        let rows = pocket_members::Entity::find()
            .filter(pocket_members::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|m| m.pocket_id).collect())
    }
}
