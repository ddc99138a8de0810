use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    Category, CursorKey, CursorPage, CursorRequest, CursorRow, EngineError, Member, NewPocket,
    Page, PageRequest, Pocket, PocketDetail, PocketFilter, PocketPatch, ResultEngine, access,
    categories::{self, DEFAULT_CATEGORIES},
    cursor::{CursorPagination, keyset_condition},
    pocket_members,
    pockets::{self, DEFAULT_LEVEL, encode_ids},
    spends, users,
    util::{contains_pattern, normalize_optional_text, normalize_required_name},
};

use super::{Engine, with_tx};

/// Sort tokens accepted by [`Engine::find_all_pocket`]; the first is the default.
const POCKET_SORTS: &[&str] = &[
    "-created_at",
    "created_at",
    "-updated_at",
    "updated_at",
    "-name",
    "name",
];

/// Cursor types accepted by [`Engine::find_all_pocket_by_cursor`].
pub const POCKET_CURSOR_TYPES: &[&str] = &["-updated_at", "updated_at", "-id", "id"];

fn pocket_column(column: &str) -> pockets::Column {
    match column {
        "created_at" => pockets::Column::CreatedAt,
        "updated_at" => pockets::Column::UpdatedAt,
        "name" => pockets::Column::Name,
        _ => pockets::Column::Id,
    }
}

impl CursorRow for Pocket {
    fn cursor_key(&self, column: &str) -> CursorKey {
        match column {
            "updated_at" => CursorKey::from_timestamp(self.updated_at, self.id),
            _ => CursorKey::from_id(self.id),
        }
    }
}

/// Pockets `user_id` belongs to, optionally narrowed by name.
fn visible_pockets(user_id: &str, filter: &PocketFilter) -> Select<pockets::Entity> {
    let mut query = pockets::Entity::find()
        .join(JoinType::InnerJoin, pockets::Relation::Members.def())
        .filter(pocket_members::Column::UserId.eq(user_id.to_string()));
    if let Some(name) = normalize_optional_text(filter.name.as_deref()) {
        query = query.filter(
            Expr::expr(Func::lower(Expr::col((
                pockets::Entity,
                pockets::Column::Name,
            ))))
            .like(contains_pattern(&name.to_lowercase())),
        );
    }
    query
}

pub(super) fn member_rows(pocket: &Pocket) -> Vec<pocket_members::ActiveModel> {
    pocket
        .member_ids()
        .into_iter()
        .map(|user_id| pocket_members::ActiveModel {
            pocket_id: sea_orm::ActiveValue::Set(pocket.id.to_string()),
            user_id: sea_orm::ActiveValue::Set(user_id),
        })
        .collect()
}

fn default_categories(
    pocket_id: Uuid,
    ids: impl Fn() -> Uuid,
    now: DateTime<Utc>,
) -> Vec<categories::ActiveModel> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, icon, is_income, spend_type)| {
            let category = Category {
                id: ids(),
                pocket_id,
                name: (*name).to_string(),
                icon: (*icon).to_string(),
                is_income: *is_income,
                default_spend_type: *spend_type,
                created_at: now,
                updated_at: now,
            };
            (&category).into()
        })
        .collect()
}

impl Engine {
    /// Create a pocket owned by `creator_id`.
    ///
    /// Empty editor or watcher lists default to the creator. The pocket, its
    /// default categories and its membership rows are written together.
    pub async fn create_pocket(&self, creator_id: &str, cmd: NewPocket) -> ResultEngine<Pocket> {
        let name = normalize_required_name(&cmd.name, "pocket")?;
        let icon = normalize_optional_text(cmd.icon.as_deref()).unwrap_or_default();

        let pocket = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, creator_id).await?;

            let supplied: BTreeSet<&String> =
                cmd.editor_ids.iter().chain(cmd.watcher_ids.iter()).collect();
            let known = users::find_names(&db_tx, supplied.iter().copied()).await?;
            let unknown: Vec<&str> = supplied
                .iter()
                .filter(|id| !known.contains_key(id.as_str()))
                .map(|id| id.as_str())
                .collect();
            if !unknown.is_empty() {
                return Err(EngineError::Validation(format!(
                    "unknown user ids: {}",
                    unknown.join(", ")
                )));
            }

            let or_creator = |ids: &BTreeSet<String>| {
                if ids.is_empty() {
                    BTreeSet::from([creator_id.to_string()])
                } else {
                    ids.clone()
                }
            };
            let now = Utc::now();
            let pocket = Pocket {
                id: self.next_id(),
                owner_id: creator_id.to_string(),
                editor_ids: or_creator(&cmd.editor_ids),
                watcher_ids: or_creator(&cmd.watcher_ids),
                name,
                currency: cmd.currency,
                icon,
                balance: 0,
                level: DEFAULT_LEVEL,
                version: 1,
                created_at: now,
                updated_at: now,
            };

            pockets::ActiveModel::try_from(&pocket)?
                .insert(&db_tx)
                .await?;
            categories::Entity::insert_many(default_categories(
                pocket.id,
                || self.next_id(),
                now,
            ))
            .exec_without_returning(&db_tx)
            .await?;
            pocket_members::Entity::insert_many(member_rows(&pocket))
                .exec_without_returning(&db_tx)
                .await?;

            Ok(pocket)
        })?;

        tracing::info!(pocket_id = %pocket.id, owner = %pocket.owner_id, "pocket created");
        Ok(pocket)
    }

    /// Update name, icon or currency.
    ///
    /// The write only lands if the pocket version is still the one read in
    /// this transaction, and, when given, `expected_version`.
    pub async fn edit_pocket(
        &self,
        user_id: &str,
        pocket_id: Uuid,
        patch: PocketPatch,
    ) -> ResultEngine<Pocket> {
        if patch.is_empty() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "pocket"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut pocket = self
                .require_pocket_write(&db_tx, pocket_id, user_id)
                .await?;
            if let Some(expected) = patch.expected_version
                && expected != pocket.version
            {
                return Err(EngineError::Conflict(format!(
                    "pocket version is {}, expected {expected}",
                    pocket.version
                )));
            }

            if let Some(currency) = patch.currency
                && currency != pocket.currency
            {
                let has_spends = spends::Entity::find()
                    .filter(spends::Column::PocketId.eq(pocket_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if has_spends {
                    return Err(EngineError::Validation(
                        "currency cannot change once the pocket has spends".to_string(),
                    ));
                }
                pocket.currency = currency;
            }
            if let Some(name) = name {
                pocket.name = name;
            }
            if let Some(icon) = patch.icon.as_deref() {
                pocket.icon = icon.trim().to_string();
            }

            self.save_pocket(&db_tx, &mut pocket).await?;
            Ok(pocket)
        })
    }

    /// Compare-and-swap write of the pocket metadata and member lists.
    ///
    /// Bumps `version`; the balance column is left alone since it only moves
    /// through additive deltas.
    pub(super) async fn save_pocket<C: ConnectionTrait>(
        &self,
        db: &C,
        pocket: &mut Pocket,
    ) -> ResultEngine<()> {
        let loaded_version = pocket.version;
        pocket.version += 1;
        pocket.updated_at = Utc::now();

        let result = pockets::Entity::update_many()
            .col_expr(pockets::Column::Name, Expr::value(pocket.name.clone()))
            .col_expr(pockets::Column::Icon, Expr::value(pocket.icon.clone()))
            .col_expr(
                pockets::Column::Currency,
                Expr::value(pocket.currency.code().to_string()),
            )
            .col_expr(
                pockets::Column::EditorIds,
                Expr::value(encode_ids(&pocket.editor_ids)?),
            )
            .col_expr(
                pockets::Column::WatcherIds,
                Expr::value(encode_ids(&pocket.watcher_ids)?),
            )
            .col_expr(pockets::Column::Version, Expr::value(pocket.version))
            .col_expr(pockets::Column::UpdatedAt, Expr::value(pocket.updated_at))
            .filter(pockets::Column::Id.eq(pocket.id.to_string()))
            .filter(pockets::Column::Version.eq(loaded_version))
            .exec(db)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(
                "pocket was modified concurrently".to_string(),
            ));
        }
        Ok(())
    }

    /// The pocket with member names resolved and the caller's role.
    pub async fn pocket_detail(&self, user_id: &str, pocket_id: Uuid) -> ResultEngine<PocketDetail> {
        let db = &self.database;
        let pocket = self.require_pocket_read(db, pocket_id, user_id).await?;
        let member_ids = pocket.member_ids();
        let names = users::find_names(db, &member_ids).await?;
        let member = |id: &String| Member {
            user_id: id.clone(),
            name: names.get(id).cloned().unwrap_or_default(),
        };

        Ok(PocketDetail {
            owner: member(&pocket.owner_id),
            editors: pocket.editor_ids.iter().map(member).collect(),
            watchers: pocket.watcher_ids.iter().map(member).collect(),
            role: access::role_of(&pocket, user_id),
            pocket,
        })
    }

    /// Pockets the user belongs to, page by page.
    pub async fn find_all_pocket(
        &self,
        user_id: &str,
        filter: &PocketFilter,
        page: &PageRequest,
    ) -> ResultEngine<Page<Pocket>> {
        let spec = page.resolve(POCKET_SORTS)?;
        let db = &self.database;
        let query = visible_pockets(user_id, filter);
        let total = query.clone().count(db).await?;
        let models = query
            .order_by(pocket_column(spec.column), spec.direction.order())
            .order_by(pockets::Column::Id, spec.direction.order())
            .offset(spec.offset())
            .limit(spec.page_size)
            .all(db)
            .await?;
        let items = models
            .into_iter()
            .map(Pocket::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Page::new(items, &spec, total))
    }

    /// Pockets the user belongs to, by keyset cursor.
    pub async fn find_all_pocket_by_cursor(
        &self,
        user_id: &str,
        filter: &PocketFilter,
        request: &CursorRequest,
    ) -> ResultEngine<CursorPage<Pocket>> {
        let page = CursorPagination::new(POCKET_CURSOR_TYPES, request)?;
        let mut query = visible_pockets(user_id, filter);
        if let Some(key) = page.after() {
            let condition = match page.column() {
                "updated_at" => keyset_condition(
                    pockets::Column::UpdatedAt,
                    pockets::Column::Id,
                    key.timestamp()?,
                    key.id.clone(),
                    page.direction(),
                ),
                _ => keyset_condition(
                    pockets::Column::Id,
                    pockets::Column::Id,
                    key.id.clone(),
                    key.id.clone(),
                    page.direction(),
                ),
            };
            query = query.filter(condition);
        }
        let models = query
            .order_by(pocket_column(page.column()), page.direction().order())
            .order_by(pockets::Column::Id, page.direction().order())
            .limit(page.fetch_limit())
            .all(&self.database)
            .await?;
        let items = models
            .into_iter()
            .map(Pocket::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        page.finish(items)
    }
}
