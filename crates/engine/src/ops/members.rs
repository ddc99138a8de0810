use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{EngineError, Pocket, ResultEngine, pocket_members};

use super::{Engine, with_tx};

impl Engine {
    /// Give `person_id` editor access, or watcher access when `as_read_only`.
    pub async fn add_person(
        &self,
        actor_id: &str,
        pocket_id: Uuid,
        person_id: &str,
        as_read_only: bool,
    ) -> ResultEngine<Pocket> {
        let person_id = person_id.trim();
        let pocket = with_tx!(self, |db_tx| {
            let mut pocket = self
                .require_pocket_write(&db_tx, pocket_id, actor_id)
                .await?;
            if pocket.owner_id == person_id {
                return Err(EngineError::Validation(
                    "the owner cannot be added to a pocket".to_string(),
                ));
            }
            self.require_user(&db_tx, person_id).await?;

            if as_read_only {
                pocket.watcher_ids.insert(person_id.to_string());
            } else {
                pocket.editor_ids.insert(person_id.to_string());
            }
            self.save_pocket(&db_tx, &mut pocket).await?;
            self.insert_member_row(&db_tx, pocket_id, person_id).await?;
            Ok(pocket)
        })?;

        tracing::info!(%pocket_id, person = person_id, read_only = as_read_only, "member added");
        self.notify(
            vec![person_id.to_string()],
            "Added to pocket",
            format!("You now have access to \"{}\"", pocket.name),
        );
        Ok(pocket)
    }

    /// Remove `person_id` from both access lists.
    pub async fn remove_person(
        &self,
        actor_id: &str,
        pocket_id: Uuid,
        person_id: &str,
    ) -> ResultEngine<Pocket> {
        let person_id = person_id.trim();
        let pocket = with_tx!(self, |db_tx| {
            let mut pocket = self
                .require_pocket_write(&db_tx, pocket_id, actor_id)
                .await?;
            if pocket.owner_id == person_id {
                return Err(EngineError::Validation(
                    "the owner cannot be removed from a pocket".to_string(),
                ));
            }

            pocket.editor_ids.remove(person_id);
            pocket.watcher_ids.remove(person_id);
            let deleted = pocket_members::Entity::delete_many()
                .filter(pocket_members::Column::PocketId.eq(pocket_id.to_string()))
                .filter(pocket_members::Column::UserId.eq(person_id.to_string()))
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!(
                    "member {person_id}"
                )));
            }
            self.save_pocket(&db_tx, &mut pocket).await?;
            Ok(pocket)
        })?;

        tracing::info!(%pocket_id, person = person_id, "member removed");
        Ok(pocket)
    }

    /// Insert the membership row unless it is already there.
    pub(super) async fn insert_member_row<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        let row = pocket_members::ActiveModel {
            pocket_id: ActiveValue::Set(pocket_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
        };
        pocket_members::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    pocket_members::Column::PocketId,
                    pocket_members::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }
}
