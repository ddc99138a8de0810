//! Spend API endpoints.

use api_types::{
    page::{CursorPage, Page},
    spend::{
        SpendCursorQuery, SpendListQuery, SpendNew, SpendSearchQuery, SpendUpdate, SpendView,
        TransferNew, TransferView,
    },
};
use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
};
use engine::{
    CursorRequest, MultiPocketSpendFilter, NewSpend, PageRequest, SpendFilter, SpendPatch,
    TransferCmd,
};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{
        map_cursor_page, map_page, map_spend, parse_spend_type, parse_uuid_list, split_list,
        spend_type_from_api,
    },
    server::{CurrentUser, ServerState},
};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<SpendNew>,
) -> Result<(StatusCode, Json<SpendView>), ServerError> {
    let cmd = NewSpend {
        pocket_id: payload.pocket_id,
        category_id: payload.category_id,
        name: payload.name,
        price: payload.price,
        is_income: payload.is_income,
        spend_type: payload
            .spend_type
            .map(spend_type_from_api)
            .unwrap_or_default(),
        date: payload.date,
    };
    let spend = state.engine.create_spend(&user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_spend(spend))))
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<SpendListQuery>,
) -> Result<Json<Page<SpendView>>, ServerError> {
    let filter = SpendFilter {
        pocket_id: query.pocket_id,
        user_id: query.user_id,
        category_id: query.category_id,
        is_income: query.is_income,
        spend_type: query.spend_type.map(spend_type_from_api),
        date_start: query.date_start,
        date_end: query.date_end,
        name: query.name,
    };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
        sort: query.sort,
    };
    let spends = state
        .engine
        .find_all_spend(&user.id, &filter, &page)
        .await?;
    Ok(Json(map_page(spends, map_spend)))
}

/// Keyset listing for one pocket. A `date_range` token replaces the
/// explicit date bounds.
pub async fn list_by_cursor(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SpendCursorQuery>,
) -> Result<Json<CursorPage<SpendView>>, ServerError> {
    let filter = SpendFilter {
        pocket_id: query.pocket_id,
        user_id: query.user_id,
        category_id: query.category_id,
        is_income: query.is_income,
        spend_type: query.spend_type.map(spend_type_from_api),
        date_start: query.date_start,
        date_end: query.date_end,
        name: query.name,
    };
    let request = CursorRequest {
        cursor: query.cursor,
        cursor_type: query.cursor_type,
        page_size: query.page_size,
    };

    let spends = match query.date_range.as_deref() {
        Some(range) => {
            let time_zone = query.time_zone.as_deref().unwrap_or("UTC");
            state
                .engine
                .find_all_spend_by_cursor_auto_date_range(
                    &user.id, &filter, range, time_zone, &request,
                )
                .await?
        }
        None => {
            state
                .engine
                .find_all_spend_by_cursor(&user.id, &filter, &request)
                .await?
        }
    };
    Ok(Json(map_cursor_page(spends, &uri.to_string(), map_spend)))
}

/// Keyset search across pockets.
pub async fn search(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SpendSearchQuery>,
) -> Result<Json<CursorPage<SpendView>>, ServerError> {
    let filter = MultiPocketSpendFilter {
        pocket_ids: parse_uuid_list(query.pocket_ids.as_deref(), "pocket id")?,
        user_ids: split_list(query.user_ids.as_deref())
            .into_iter()
            .map(ToString::to_string)
            .collect(),
        category_ids: parse_uuid_list(query.category_ids.as_deref(), "category id")?,
        spend_types: split_list(query.spend_types.as_deref())
            .into_iter()
            .map(parse_spend_type)
            .collect::<Result<_, _>>()?,
        is_income: query.is_income,
        date_start: query.date_start,
        date_end: query.date_end,
        name: query.name,
    };
    let request = CursorRequest {
        cursor: query.cursor,
        cursor_type: query.cursor_type,
        page_size: query.page_size,
    };
    let spends = state
        .engine
        .find_all_spend_multi_pocket_by_cursor(&user.id, &filter, &request)
        .await?;
    Ok(Json(map_cursor_page(spends, &uri.to_string(), map_spend)))
}

pub async fn transfer(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let cmd = TransferCmd {
        from_pocket_id: payload.from_pocket_id,
        to_pocket_id: payload.to_pocket_id,
        price: payload.price,
        date: payload.date,
        name: payload.name,
    };
    let transfer = state
        .engine
        .transfer_to_pocket_as_spend(&user.id, cmd)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferView {
            outgoing: map_spend(transfer.outgoing),
            incoming: map_spend(transfer.incoming),
        }),
    ))
}

pub async fn detail(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(spend_id): Path<Uuid>,
) -> Result<Json<SpendView>, ServerError> {
    let spend = state.engine.spend_detail(&user.id, spend_id).await?;
    Ok(Json(map_spend(spend)))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(spend_id): Path<Uuid>,
    Json(payload): Json<SpendUpdate>,
) -> Result<Json<SpendView>, ServerError> {
    let patch = SpendPatch {
        name: payload.name,
        price: payload.price,
        is_income: payload.is_income,
        category_id: payload.category_id,
        spend_type: payload.spend_type.map(spend_type_from_api),
        date: payload.date,
        expected_version: payload.version,
    };
    let spend = state
        .engine
        .update_partial_spend(&user.id, spend_id, patch)
        .await?;
    Ok(Json(map_spend(spend)))
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(spend_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_spend(&user.id, spend_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
