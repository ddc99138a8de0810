use sea_orm::{QueryFilter, QuerySelect, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{ResultEngine, pockets, signed_price, spends, util::balance_out_of_range};

use super::{Engine, with_tx};

impl Engine {
    /// Recompute the pocket balance from its spends and store it.
    ///
    /// Safe to repeat: a second call finds nothing to fix.
    pub async fn sync_balance(&self, user_id: &str, pocket_id: Uuid) -> ResultEngine<i64> {
        let (stored, computed) = with_tx!(self, |db_tx| {
            let pocket = self
                .require_pocket_write(&db_tx, pocket_id, user_id)
                .await?;

            let rows: Vec<(i64, bool)> = spends::Entity::find()
                .select_only()
                .column(spends::Column::Price)
                .column(spends::Column::IsIncome)
                .filter(spends::Column::PocketId.eq(pocket_id.to_string()))
                .into_tuple()
                .all(&db_tx)
                .await?;
            let computed = rows
                .into_iter()
                .map(|(price, is_income)| signed_price(price, is_income))
                .try_fold(0i64, i64::checked_add)
                .ok_or_else(balance_out_of_range)?;

            pockets::Entity::update_many()
                .col_expr(pockets::Column::Balance, Expr::value(computed))
                .filter(pockets::Column::Id.eq(pocket_id.to_string()))
                .exec(&db_tx)
                .await?;
            Ok((pocket.balance, computed))
        })?;

        if stored != computed {
            tracing::warn!(%pocket_id, stored, computed, "pocket balance drift corrected");
        }
        Ok(computed)
    }
}
