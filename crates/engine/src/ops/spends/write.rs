use chrono::Utc;
use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, NewSpend, ResultEngine, Spend, SpendPatch, SpendType, access, signed_price,
    spends,
    util::{balance_out_of_range, normalize_spend_name, validate_price},
};

use super::super::{Engine, with_tx};

fn reject_reserved_type(spend_type: Option<SpendType>) -> ResultEngine<()> {
    if spend_type == Some(SpendType::Transfer) {
        return Err(EngineError::Validation(
            "spend type transfer is reserved for pocket transfers".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Record an income or expense and move the pocket balance with it.
    pub async fn create_spend(&self, user_id: &str, cmd: NewSpend) -> ResultEngine<Spend> {
        validate_price(cmd.price)?;
        reject_reserved_type(Some(cmd.spend_type))?;
        let name = normalize_spend_name(&cmd.name)?;

        let (spend, pocket) = with_tx!(self, |db_tx| {
            let pocket = self
                .require_pocket_write(&db_tx, cmd.pocket_id, user_id)
                .await?;
            if let Some(category_id) = cmd.category_id {
                self.require_category_in_pocket(&db_tx, pocket.id, category_id)
                    .await?;
            }

            let balance = self
                .apply_balance_delta(&db_tx, pocket.id, signed_price(cmd.price, cmd.is_income))
                .await?;
            let now = Utc::now();
            let spend = Spend {
                id: self.next_id(),
                user_id: user_id.to_string(),
                pocket_id: pocket.id,
                category_id: cmd.category_id,
                name,
                price: cmd.price,
                is_income: cmd.is_income,
                spend_type: cmd.spend_type,
                date: cmd.date,
                balance_snapshot: balance,
                linked_spend_id: None,
                version: 1,
                created_at: now,
                updated_at: now,
            };
            spends::ActiveModel::from(&spend).insert(&db_tx).await?;
            Ok((spend, pocket))
        })?;

        tracing::debug!(spend_id = %spend.id, pocket_id = %pocket.id, "spend created");
        let kind = if spend.is_income { "income" } else { "expense" };
        self.notify_members(
            &pocket,
            user_id,
            "New spend",
            format!("{kind} \"{}\" of {} in {}", spend.name, spend.price, pocket.name),
        );
        Ok(spend)
    }

    /// Change some fields of a spend. Only its creator may edit it.
    ///
    /// When the signed amount changes, the difference is applied to the
    /// pocket balance in the same transaction.
    pub async fn update_partial_spend(
        &self,
        user_id: &str,
        spend_id: Uuid,
        patch: SpendPatch,
    ) -> ResultEngine<Spend> {
        if patch.is_empty() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }
        reject_reserved_type(patch.spend_type)?;
        let name = patch
            .name
            .as_deref()
            .map(normalize_spend_name)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut spend = self.load_spend(&db_tx, spend_id).await?;
            if spend.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the creator can edit a spend".to_string(),
                ));
            }
            let pocket = self.load_pocket(&db_tx, spend.pocket_id).await?;
            access::require_write(&pocket, user_id)?;
            if let Some(expected) = patch.expected_version
                && expected != spend.version
            {
                return Err(EngineError::Conflict(format!(
                    "spend version is {}, expected {expected}",
                    spend.version
                )));
            }
            if spend.linked_spend_id.is_some()
                && (patch.price.is_some() || patch.is_income.is_some() || patch.spend_type.is_some())
            {
                return Err(EngineError::Validation(
                    "amount and type of a transfer leg cannot change".to_string(),
                ));
            }

            let old_signed = spend.signed_price();
            if let Some(name) = name {
                spend.name = name;
            }
            if let Some(price) = patch.price {
                spend.price = price;
            }
            if let Some(is_income) = patch.is_income {
                spend.is_income = is_income;
            }
            if let Some(spend_type) = patch.spend_type {
                spend.spend_type = spend_type;
            }
            if let Some(date) = patch.date {
                spend.date = date;
            }
            if let Some(category_id) = patch.category_id {
                if let Some(category_id) = category_id {
                    self.require_category_in_pocket(&db_tx, pocket.id, category_id)
                        .await?;
                }
                spend.category_id = category_id;
            }

            let delta = spend
                .signed_price()
                .checked_sub(old_signed)
                .ok_or_else(balance_out_of_range)?;
            if delta != 0 {
                spend.balance_snapshot = self
                    .apply_balance_delta(&db_tx, pocket.id, delta)
                    .await?;
            }
            self.save_spend(&db_tx, &mut spend).await?;
            Ok(spend)
        })
    }

    /// Delete a spend and take its contribution back out of the balance.
    ///
    /// Deleting one leg of a transfer unlinks the other leg, which stays in
    /// its own pocket.
    pub async fn delete_spend(&self, user_id: &str, spend_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let spend = self.load_spend(&db_tx, spend_id).await?;
            if spend.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "only the creator can delete a spend".to_string(),
                ));
            }
            let pocket = self.load_pocket(&db_tx, spend.pocket_id).await?;
            access::require_write(&pocket, user_id)?;

            self.apply_balance_delta(&db_tx, pocket.id, -spend.signed_price())
                .await?;
            if let Some(linked) = spend.linked_spend_id {
                spends::Entity::update_many()
                    .col_expr(
                        spends::Column::LinkedSpendId,
                        Expr::value(Option::<String>::None),
                    )
                    .filter(spends::Column::Id.eq(linked.to_string()))
                    .exec(&db_tx)
                    .await?;
            }
            let deleted = spends::Entity::delete_by_id(spend_id.to_string())
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound("spend not exists".to_string()));
            }
            tracing::debug!(%spend_id, pocket_id = %pocket.id, "spend deleted");
            Ok(())
        })
    }

    pub async fn spend_detail(&self, user_id: &str, spend_id: Uuid) -> ResultEngine<Spend> {
        let db = &self.database;
        let spend = self.load_spend(db, spend_id).await?;
        self.require_pocket_read(db, spend.pocket_id, user_id)
            .await?;
        Ok(spend)
    }
}
