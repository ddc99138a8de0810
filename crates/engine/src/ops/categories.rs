use chrono::Utc;
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryPatch, EngineError, NewCategory, ResultEngine, categories, spends,
    util::{normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    async fn load_category<C: ConnectionTrait>(
        &self,
        db: &C,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Category names are unique per pocket, ignoring case.
    async fn ensure_category_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket_id: Uuid,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::PocketId.eq(pocket_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(except) = except {
            query = query.filter(categories::Column::Id.ne(except.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "category '{name}' already exists"
            )));
        }
        Ok(())
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        pocket_id: Uuid,
        cmd: NewCategory,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_pocket_write(&db_tx, pocket_id, user_id)
                .await?;
            self.ensure_category_name_free(&db_tx, pocket_id, &name, None)
                .await?;

            let now = Utc::now();
            let category = Category {
                id: self.next_id(),
                pocket_id,
                name,
                icon: normalize_optional_text(cmd.icon.as_deref()).unwrap_or_default(),
                is_income: cmd.is_income,
                default_spend_type: cmd.default_spend_type,
                created_at: now,
                updated_at: now,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            Ok(category)
        })
    }

    pub async fn edit_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        if patch.is_empty() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "category"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut category = self.load_category(&db_tx, category_id).await?;
            self.require_pocket_write(&db_tx, category.pocket_id, user_id)
                .await?;

            if let Some(name) = name {
                self.ensure_category_name_free(
                    &db_tx,
                    category.pocket_id,
                    &name,
                    Some(category_id),
                )
                .await?;
                category.name = name;
            }
            if let Some(icon) = patch.icon.as_deref() {
                category.icon = icon.trim().to_string();
            }
            if let Some(spend_type) = patch.default_spend_type {
                category.default_spend_type = spend_type;
            }
            category.updated_at = Utc::now();

            categories::ActiveModel::from(&category)
                .update(&db_tx)
                .await?;
            Ok(category)
        })
    }

    /// Delete a category. Its spends stay, uncategorized.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let category = self.load_category(&db_tx, category_id).await?;
            self.require_pocket_write(&db_tx, category.pocket_id, user_id)
                .await?;

            spends::Entity::update_many()
                .col_expr(spends::Column::CategoryId, Expr::value(Option::<String>::None))
                .filter(spends::Column::CategoryId.eq(category_id.to_string()))
                .exec(&db_tx)
                .await?;
            let deleted = categories::Entity::delete_by_id(category_id.to_string())
                .exec(&db_tx)
                .await?;
            if deleted.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    "category not exists".to_string(),
                ));
            }
            Ok(())
        })
    }

    /// Categories of a pocket, by name. `is_income` narrows to one side.
    pub async fn find_all_category(
        &self,
        user_id: &str,
        pocket_id: Uuid,
        is_income: Option<bool>,
    ) -> ResultEngine<Vec<Category>> {
        let db = &self.database;
        self.require_pocket_read(db, pocket_id, user_id).await?;
        let mut query = categories::Entity::find()
            .filter(categories::Column::PocketId.eq(pocket_id.to_string()));
        if let Some(is_income) = is_income {
            query = query.filter(categories::Column::IsIncome.eq(is_income));
        }
        query
            .order_by_asc(categories::Column::Name)
            .order_by_asc(categories::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }
}
