use chrono::Utc;
use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Spend, SpendType, Transfer, TransferCmd, access, spends,
    util::{normalize_spend_name, validate_price},
};

use super::super::{Engine, with_tx};

impl Engine {
    /// Move `price` from one pocket to another as a linked expense/income
    /// pair, both tagged [`SpendType::Transfer`].
    ///
    /// The caller needs write access on the source and read access on the
    /// destination. Either both legs and both balance moves land, or nothing.
    pub async fn transfer_to_pocket_as_spend(
        &self,
        user_id: &str,
        cmd: TransferCmd,
    ) -> ResultEngine<Transfer> {
        if cmd.from_pocket_id == cmd.to_pocket_id {
            return Err(EngineError::Validation(
                "cannot transfer to the same pocket".to_string(),
            ));
        }
        if cmd.price <= 0 {
            return Err(EngineError::Validation(
                "transfer price must be > 0".to_string(),
            ));
        }
        validate_price(cmd.price)?;
        let custom_name = cmd
            .name
            .as_deref()
            .map(normalize_spend_name)
            .transpose()?;

        let (transfer, to_pocket) = with_tx!(self, |db_tx| {
            let from = self
                .require_pocket_write(&db_tx, cmd.from_pocket_id, user_id)
                .await?;
            let to = self.load_pocket(&db_tx, cmd.to_pocket_id).await?;
            access::require_read(&to, user_id)?;
            if from.currency != to.currency {
                return Err(EngineError::Validation(format!(
                    "currency mismatch: {} vs {}",
                    from.currency, to.currency
                )));
            }

            let outgoing_name = match &custom_name {
                Some(name) => name.clone(),
                None => normalize_spend_name(&format!("transfer to {}", to.name))?,
            };
            let incoming_name = match custom_name {
                Some(name) => name,
                None => normalize_spend_name(&format!("transfer from {}", from.name))?,
            };

            let outgoing_id = self.next_id();
            let incoming_id = self.next_id();
            let from_balance = self
                .apply_balance_delta(&db_tx, from.id, -cmd.price)
                .await?;
            let to_balance = self
                .apply_balance_delta(&db_tx, to.id, cmd.price)
                .await?;

            let now = Utc::now();
            let leg = |id: Uuid,
                       pocket_id: Uuid,
                       name: String,
                       is_income: bool,
                       balance_snapshot: i64,
                       linked: Uuid| Spend {
                id,
                user_id: user_id.to_string(),
                pocket_id,
                category_id: None,
                name,
                price: cmd.price,
                is_income,
                spend_type: SpendType::Transfer,
                date: cmd.date,
                balance_snapshot,
                linked_spend_id: Some(linked),
                version: 1,
                created_at: now,
                updated_at: now,
            };
            let outgoing = leg(
                outgoing_id,
                from.id,
                outgoing_name,
                false,
                from_balance,
                incoming_id,
            );
            let incoming = leg(
                incoming_id,
                to.id,
                incoming_name,
                true,
                to_balance,
                outgoing_id,
            );

            spends::Entity::insert_many([
                spends::ActiveModel::from(&outgoing),
                spends::ActiveModel::from(&incoming),
            ])
            .exec_without_returning(&db_tx)
            .await?;

            Ok((Transfer { outgoing, incoming }, to))
        })?;

        tracing::info!(
            from = %cmd.from_pocket_id,
            to = %cmd.to_pocket_id,
            price = cmd.price,
            "pocket transfer"
        );
        self.notify_members(
            &to_pocket,
            user_id,
            "Incoming transfer",
            format!("{} received {}", to_pocket.name, cmd.price),
        );
        Ok(transfer)
    }
}
