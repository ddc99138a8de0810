use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, prelude::*,
};

use crate::{
    CursorKey, CursorPage, CursorRequest, CursorRow, EngineError, MultiPocketSpendFilter, Page,
    PageRequest, Pocket, ResultEngine, Spend, SpendFilter, access,
    cursor::{CursorPagination, keyset_condition},
    pockets, resolve_date_range, spends,
    util::{contains_pattern, normalize_spend_name},
};

use super::super::Engine;

/// Sort tokens accepted by [`Engine::find_all_spend`]; the first is the default.
const SPEND_SORTS: &[&str] = &["-date", "date", "-price", "price", "-created_at", "created_at"];

/// Cursor types accepted by the cursor-based spend lists.
pub const SPEND_CURSOR_TYPES: &[&str] = &["-date", "date", "-id", "id"];

fn spend_column(column: &str) -> spends::Column {
    match column {
        "date" => spends::Column::Date,
        "price" => spends::Column::Price,
        "created_at" => spends::Column::CreatedAt,
        _ => spends::Column::Id,
    }
}

impl CursorRow for Spend {
    fn cursor_key(&self, column: &str) -> CursorKey {
        match column {
            "date" => CursorKey::from_timestamp(self.date, self.id),
            _ => CursorKey::from_id(self.id),
        }
    }
}

fn validate_date_bounds(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ResultEngine<()> {
    if let (Some(start), Some(end)) = (start, end)
        && start >= end
    {
        return Err(EngineError::Validation(
            "invalid range: date_start must be < date_end".to_string(),
        ));
    }
    Ok(())
}

trait ApplySpendFilters: QueryFilter + Sized {
    fn apply_date_bounds(self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self;
    fn apply_name(self, name: Option<&str>) -> Self;
    fn apply_spend_filter(self, filter: &SpendFilter) -> Self;
    fn apply_multi_filter(self, filter: &MultiPocketSpendFilter) -> Self;
}

impl<T> ApplySpendFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_date_bounds(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        if let Some(start) = start {
            self = self.filter(spends::Column::Date.gte(start));
        }
        if let Some(end) = end {
            self = self.filter(spends::Column::Date.lt(end));
        }
        self
    }

    /// Stored names are normalized, so normalizing the needle makes the
    /// match case-insensitive.
    fn apply_name(self, name: Option<&str>) -> Self {
        match name.and_then(|name| normalize_spend_name(name).ok()) {
            Some(needle) => {
                self.filter(spends::Column::Name.like(contains_pattern(&needle)))
            }
            None => self,
        }
    }

    fn apply_spend_filter(mut self, filter: &SpendFilter) -> Self {
        self = self.filter(spends::Column::PocketId.eq(filter.pocket_id.to_string()));
        if let Some(user_id) = &filter.user_id {
            self = self.filter(spends::Column::UserId.eq(user_id.clone()));
        }
        if let Some(category_id) = filter.category_id {
            self = self.filter(spends::Column::CategoryId.eq(category_id.to_string()));
        }
        if let Some(is_income) = filter.is_income {
            self = self.filter(spends::Column::IsIncome.eq(is_income));
        }
        if let Some(spend_type) = filter.spend_type {
            self = self.filter(spends::Column::SpendType.eq(spend_type.as_i16()));
        }
        self.apply_date_bounds(filter.date_start, filter.date_end)
            .apply_name(filter.name.as_deref())
    }

    fn apply_multi_filter(mut self, filter: &MultiPocketSpendFilter) -> Self {
        if !filter.user_ids.is_empty() {
            self = self.filter(spends::Column::UserId.is_in(filter.user_ids.clone()));
        }
        if !filter.category_ids.is_empty() {
            let ids: Vec<String> = filter.category_ids.iter().map(ToString::to_string).collect();
            self = self.filter(spends::Column::CategoryId.is_in(ids));
        }
        if !filter.spend_types.is_empty() {
            let types: Vec<i16> = filter.spend_types.iter().map(|t| t.as_i16()).collect();
            self = self.filter(spends::Column::SpendType.is_in(types));
        }
        if let Some(is_income) = filter.is_income {
            self = self.filter(spends::Column::IsIncome.eq(is_income));
        }
        self.apply_date_bounds(filter.date_start, filter.date_end)
            .apply_name(filter.name.as_deref())
    }
}

/// Fetch one keyset page of `query` in the order `page` asks for.
async fn fetch_cursor_page<C: ConnectionTrait>(
    db: &C,
    mut query: Select<spends::Entity>,
    page: &CursorPagination,
) -> ResultEngine<CursorPage<Spend>> {
    if let Some(key) = page.after() {
        let condition = match page.column() {
            "date" => keyset_condition(
                spends::Column::Date,
                spends::Column::Id,
                key.timestamp()?,
                key.id.clone(),
                page.direction(),
            ),
            _ => keyset_condition(
                spends::Column::Id,
                spends::Column::Id,
                key.id.clone(),
                key.id.clone(),
                page.direction(),
            ),
        };
        query = query.filter(condition);
    }
    let models = query
        .order_by(spend_column(page.column()), page.direction().order())
        .order_by(spends::Column::Id, page.direction().order())
        .limit(page.fetch_limit())
        .all(db)
        .await?;
    let items = models
        .into_iter()
        .map(Spend::try_from)
        .collect::<ResultEngine<Vec<_>>>()?;
    page.finish(items)
}

impl Engine {
    /// Spends of one pocket, page by page.
    pub async fn find_all_spend(
        &self,
        user_id: &str,
        filter: &SpendFilter,
        page: &PageRequest,
    ) -> ResultEngine<Page<Spend>> {
        let spec = page.resolve(SPEND_SORTS)?;
        validate_date_bounds(filter.date_start, filter.date_end)?;
        let db = &self.database;
        self.require_pocket_read(db, filter.pocket_id, user_id)
            .await?;

        let query = spends::Entity::find().apply_spend_filter(filter);
        let total = query.clone().count(db).await?;
        let models = query
            .order_by(spend_column(spec.column), spec.direction.order())
            .order_by(spends::Column::Id, spec.direction.order())
            .offset(spec.offset())
            .limit(spec.page_size)
            .all(db)
            .await?;
        let items = models
            .into_iter()
            .map(Spend::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;
        Ok(Page::new(items, &spec, total))
    }

    /// Spends of one pocket, by keyset cursor.
    pub async fn find_all_spend_by_cursor(
        &self,
        user_id: &str,
        filter: &SpendFilter,
        request: &CursorRequest,
    ) -> ResultEngine<CursorPage<Spend>> {
        let page = CursorPagination::new(SPEND_CURSOR_TYPES, request)?;
        validate_date_bounds(filter.date_start, filter.date_end)?;
        let db = &self.database;
        self.require_pocket_read(db, filter.pocket_id, user_id)
            .await?;

        let query = spends::Entity::find().apply_spend_filter(filter);
        fetch_cursor_page(db, query, &page).await
    }

    /// Spends across pockets, by keyset cursor.
    ///
    /// Pockets the caller cannot read, or that do not exist, are left out
    /// rather than failing the request. An empty `pocket_ids` searches every
    /// pocket the caller belongs to.
    pub async fn find_all_spend_multi_pocket_by_cursor(
        &self,
        user_id: &str,
        filter: &MultiPocketSpendFilter,
        request: &CursorRequest,
    ) -> ResultEngine<CursorPage<Spend>> {
        let page = CursorPagination::new(SPEND_CURSOR_TYPES, request)?;
        validate_date_bounds(filter.date_start, filter.date_end)?;
        let db = &self.database;

        let candidates: Vec<String> = if filter.pocket_ids.is_empty() {
            self.member_pocket_ids(db, user_id)
                .await?
                .into_iter()
                .collect()
        } else {
            filter.pocket_ids.iter().map(ToString::to_string).collect()
        };
        let mut readable = Vec::with_capacity(candidates.len());
        for model in pockets::Entity::find()
            .filter(pockets::Column::Id.is_in(candidates))
            .all(db)
            .await?
        {
            let pocket = Pocket::try_from(model)?;
            if access::can_read(&pocket, user_id) {
                readable.push(pocket.id.to_string());
            }
        }
        if readable.is_empty() {
            return page.finish(Vec::new());
        }

        let query = spends::Entity::find()
            .filter(spends::Column::PocketId.is_in(readable))
            .apply_multi_filter(filter);
        fetch_cursor_page(db, query, &page).await
    }

    /// Like [`Engine::find_all_spend_by_cursor`], with the date bounds taken
    /// from a range token (`last-7-days`, `2024-3`) read in `time_zone`.
    pub async fn find_all_spend_by_cursor_auto_date_range(
        &self,
        user_id: &str,
        filter: &SpendFilter,
        range_token: &str,
        time_zone: &str,
        request: &CursorRequest,
    ) -> ResultEngine<CursorPage<Spend>> {
        let range = resolve_date_range(range_token, time_zone, Utc::now())?;
        let mut filter = filter.clone();
        filter.date_start = Some(range.start);
        filter.date_end = Some(range.end);
        self.find_all_spend_by_cursor(user_id, &filter, request)
            .await
    }
}
