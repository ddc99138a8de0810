use sea_orm::{ConnectionTrait, QueryFilter, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, Pocket, ResultEngine, Spend, pockets, spends, util::balance_out_of_range,
};

use super::Engine;

mod list;
mod transfer;
mod write;

pub use list::SPEND_CURSOR_TYPES;

impl Engine {
    /// `balance = balance + delta` on the pocket row, then read the result.
    ///
    /// The update is a single statement so concurrent writers add up instead
    /// of overwriting each other.
    pub(super) async fn apply_balance_delta<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        delta: i64,
    ) -> ResultEngine<i64> {
        if delta != 0 {
            // SQLite promotes an overflowing integer sum to REAL.
            let in_range = if delta > 0 {
                pockets::Column::Balance.lte(i64::MAX.saturating_sub(delta))
            } else {
                pockets::Column::Balance.gte(i64::MIN.saturating_sub(delta))
            };
            let result = pockets::Entity::update_many()
                .col_expr(
                    pockets::Column::Balance,
                    Expr::col(pockets::Column::Balance).add(delta),
                )
                .filter(pockets::Column::Id.eq(pocket_id.to_string()))
                .filter(in_range)
                .exec(db)
                .await?;
            if result.rows_affected == 0 {
                // Missing pocket surfaces as KeyNotFound from the read.
                self.current_balance(db, pocket_id).await?;
                return Err(balance_out_of_range());
            }
        }
        self.current_balance(db, pocket_id).await
    }

    pub(super) async fn current_balance<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
    ) -> ResultEngine<i64> {
        pockets::Entity::find_by_id(pocket_id.to_string())
            .select_only()
            .column(pockets::Column::Balance)
            .into_tuple::<i64>()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("pocket not exists".to_string()))
    }

    /// Compare-and-swap write of an edited spend. Bumps `version`.
    async fn save_spend<C: ConnectionTrait>(&self, db: &C, spend: &mut Spend) -> ResultEngine<()> {
        let loaded_version = spend.version;
        spend.version += 1;
        spend.updated_at = chrono::Utc::now();

        let result = spends::Entity::update_many()
            .col_expr(spends::Column::Name, Expr::value(spend.name.clone()))
            .col_expr(spends::Column::Price, Expr::value(spend.price))
            .col_expr(spends::Column::IsIncome, Expr::value(spend.is_income))
            .col_expr(
                spends::Column::CategoryId,
                Expr::value(spend.category_id.map(|id| id.to_string())),
            )
            .col_expr(
                spends::Column::SpendType,
                Expr::value(spend.spend_type.as_i16()),
            )
            .col_expr(spends::Column::Date, Expr::value(spend.date))
            .col_expr(
                spends::Column::BalanceSnapshot,
                Expr::value(spend.balance_snapshot),
            )
            .col_expr(spends::Column::Version, Expr::value(spend.version))
            .col_expr(spends::Column::UpdatedAt, Expr::value(spend.updated_at))
            .filter(spends::Column::Id.eq(spend.id.to_string()))
            .filter(spends::Column::Version.eq(loaded_version))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "spend was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }

    /// Tell everyone on the pocket except the actor.
    fn notify_members(&self, pocket: &Pocket, actor_id: &str, title: &str, body: String) {
        let recipients: Vec<String> = pocket
            .member_ids()
            .into_iter()
            .filter(|id| id != actor_id)
            .collect();
        self.notify(recipients, title, body);
    }
}
