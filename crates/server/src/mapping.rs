//! Conversions between engine types and the JSON wire types.

use api_types::{
    Currency as ApiCurrency, SpendType as ApiSpendType,
    category::CategoryView,
    join_request::{JoinRequestStatus as ApiStatus, JoinRequestView},
    page::{CursorMeta, CursorPage, Page},
    pocket::{MemberView, PocketDetailView, PocketView, Role as ApiRole},
    spend::SpendView,
};
use uuid::Uuid;

use crate::ServerError;

pub(crate) fn map_currency(currency: engine::Currency) -> ApiCurrency {
    match currency {
        engine::Currency::Idr => ApiCurrency::Idr,
        engine::Currency::Usd => ApiCurrency::Usd,
        engine::Currency::Eur => ApiCurrency::Eur,
        engine::Currency::Gbp => ApiCurrency::Gbp,
        engine::Currency::Jpy => ApiCurrency::Jpy,
        engine::Currency::Sgd => ApiCurrency::Sgd,
    }
}

pub(crate) fn currency_from_api(currency: ApiCurrency) -> engine::Currency {
    match currency {
        ApiCurrency::Idr => engine::Currency::Idr,
        ApiCurrency::Usd => engine::Currency::Usd,
        ApiCurrency::Eur => engine::Currency::Eur,
        ApiCurrency::Gbp => engine::Currency::Gbp,
        ApiCurrency::Jpy => engine::Currency::Jpy,
        ApiCurrency::Sgd => engine::Currency::Sgd,
    }
}

pub(crate) fn map_spend_type(spend_type: engine::SpendType) -> ApiSpendType {
    match spend_type {
        engine::SpendType::General => ApiSpendType::General,
        engine::SpendType::Need => ApiSpendType::Need,
        engine::SpendType::Want => ApiSpendType::Want,
        engine::SpendType::Saving => ApiSpendType::Saving,
        engine::SpendType::Transfer => ApiSpendType::Transfer,
    }
}

pub(crate) fn spend_type_from_api(spend_type: ApiSpendType) -> engine::SpendType {
    match spend_type {
        ApiSpendType::General => engine::SpendType::General,
        ApiSpendType::Need => engine::SpendType::Need,
        ApiSpendType::Want => engine::SpendType::Want,
        ApiSpendType::Saving => engine::SpendType::Saving,
        ApiSpendType::Transfer => engine::SpendType::Transfer,
    }
}

pub(crate) fn parse_spend_type(value: &str) -> Result<engine::SpendType, ServerError> {
    match value {
        "general" => Ok(engine::SpendType::General),
        "need" => Ok(engine::SpendType::Need),
        "want" => Ok(engine::SpendType::Want),
        "saving" => Ok(engine::SpendType::Saving),
        "transfer" => Ok(engine::SpendType::Transfer),
        other => Err(ServerError::Generic(format!("invalid spend type: {other}"))),
    }
}

fn map_role(role: engine::Role) -> ApiRole {
    match role {
        engine::Role::Owner => ApiRole::Owner,
        engine::Role::Editor => ApiRole::Editor,
        engine::Role::Watcher => ApiRole::Watcher,
        engine::Role::None => ApiRole::None,
    }
}

pub(crate) fn map_pocket(pocket: engine::Pocket) -> PocketView {
    PocketView {
        id: pocket.id,
        owner_id: pocket.owner_id,
        editor_ids: pocket.editor_ids.into_iter().collect(),
        watcher_ids: pocket.watcher_ids.into_iter().collect(),
        name: pocket.name,
        currency: map_currency(pocket.currency),
        icon: pocket.icon,
        balance: pocket.balance,
        level: pocket.level,
        version: pocket.version,
        created_at: pocket.created_at,
        updated_at: pocket.updated_at,
    }
}

fn map_member(member: engine::Member) -> MemberView {
    MemberView {
        user_id: member.user_id,
        name: member.name,
    }
}

pub(crate) fn map_pocket_detail(detail: engine::PocketDetail) -> PocketDetailView {
    PocketDetailView {
        pocket: map_pocket(detail.pocket),
        owner: map_member(detail.owner),
        editors: detail.editors.into_iter().map(map_member).collect(),
        watchers: detail.watchers.into_iter().map(map_member).collect(),
        role: map_role(detail.role),
    }
}

pub(crate) fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        pocket_id: category.pocket_id,
        name: category.name,
        icon: category.icon,
        is_income: category.is_income,
        default_spend_type: category.default_spend_type.map(map_spend_type),
    }
}

pub(crate) fn map_spend(spend: engine::Spend) -> SpendView {
    SpendView {
        id: spend.id,
        user_id: spend.user_id,
        pocket_id: spend.pocket_id,
        category_id: spend.category_id,
        name: spend.name,
        price: spend.price,
        is_income: spend.is_income,
        spend_type: map_spend_type(spend.spend_type),
        date: spend.date,
        balance_snapshot: spend.balance_snapshot,
        linked_spend_id: spend.linked_spend_id,
        version: spend.version,
        created_at: spend.created_at,
        updated_at: spend.updated_at,
    }
}

fn map_status(status: engine::JoinRequestStatus) -> ApiStatus {
    match status {
        engine::JoinRequestStatus::Pending => ApiStatus::Pending,
        engine::JoinRequestStatus::Approved => ApiStatus::Approved,
        engine::JoinRequestStatus::Rejected => ApiStatus::Rejected,
    }
}

pub(crate) fn status_from_api(status: ApiStatus) -> engine::JoinRequestStatus {
    match status {
        ApiStatus::Pending => engine::JoinRequestStatus::Pending,
        ApiStatus::Approved => engine::JoinRequestStatus::Approved,
        ApiStatus::Rejected => engine::JoinRequestStatus::Rejected,
    }
}

pub(crate) fn map_join_request(request: engine::JoinRequest) -> JoinRequestView {
    JoinRequestView {
        status: map_status(request.status()),
        id: request.id,
        requester_id: request.requester_id,
        pocket_id: request.pocket_id,
        pocket_name: request.pocket_name,
        approver_id: request.approver_id,
        created_at: request.created_at,
        updated_at: request.updated_at,
    }
}

pub(crate) fn map_page<T, U>(page: engine::Page<T>, f: impl FnMut(T) -> U) -> Page<U> {
    let total_pages = page.total_pages();
    Page {
        items: page.items.into_iter().map(f).collect(),
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages,
    }
}

/// Converts a cursor page, filling the page links from `request_url`.
pub(crate) fn map_cursor_page<T, U>(
    page: engine::CursorPage<T>,
    request_url: &str,
    f: impl FnMut(T) -> U,
) -> CursorPage<U> {
    let page = page.map(f);
    let meta = page.meta.with_links(request_url);
    CursorPage {
        items: page.items,
        meta: CursorMeta {
            current_cursor: meta.current_cursor,
            cursor_type: meta.cursor_type,
            page_size: meta.page_size,
            next_cursor: meta.next_cursor,
            next_page: meta.next_page,
            reverse_cursor: meta.reverse_cursor,
            reverse_cursor_type: meta.reverse_cursor_type,
            reverse_page: meta.reverse_page,
        },
    }
}

/// Split a comma-separated query value, dropping empty parts.
pub(crate) fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

pub(crate) fn parse_uuid_list(value: Option<&str>, label: &str) -> Result<Vec<Uuid>, ServerError> {
    split_list(value)
        .into_iter()
        .map(|part| {
            Uuid::parse_str(part)
                .map_err(|_| ServerError::Generic(format!("invalid {label}: {part}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_values_are_trimmed_and_compacted() {
        assert_eq!(split_list(Some(" a, ,b ,")), vec!["a", "b"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn bad_uuid_in_list_is_a_bad_request() {
        let result = parse_uuid_list(Some("not-a-uuid"), "pocket id");
        assert!(matches!(result, Err(ServerError::Generic(_))));
    }

    #[test]
    fn spend_types_parse_from_wire_names() {
        assert!(matches!(
            parse_spend_type("saving"),
            Ok(engine::SpendType::Saving)
        ));
        assert!(matches!(
            parse_spend_type("Saving"),
            Err(ServerError::Generic(_))
        ));
    }
}
