//! Pocket API endpoints.

use api_types::{
    page::{CursorPage, Page},
    pocket::{
        BalanceView, MemberAdd, PocketCursorQuery, PocketDetailView, PocketListQuery, PocketNew,
        PocketUpdate, PocketView,
    },
};
use axum::{
    Extension, Json,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
};
use engine::{CursorRequest, NewPocket, PageRequest, PocketFilter, PocketPatch};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{currency_from_api, map_cursor_page, map_page, map_pocket, map_pocket_detail},
    server::{CurrentUser, ServerState},
};

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<PocketNew>,
) -> Result<(StatusCode, Json<PocketView>), ServerError> {
    let mut cmd = NewPocket::new(
        payload.name,
        payload.currency.map(currency_from_api).unwrap_or_default(),
    );
    if let Some(icon) = payload.icon {
        cmd = cmd.icon(icon);
    }
    cmd.editor_ids.extend(payload.editor_ids);
    cmd.watcher_ids.extend(payload.watcher_ids);

    let pocket = state.engine.create_pocket(&user.id, cmd).await?;
    Ok((StatusCode::CREATED, Json(map_pocket(pocket))))
}

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<PocketListQuery>,
) -> Result<Json<Page<PocketView>>, ServerError> {
    let filter = PocketFilter { name: query.name };
    let page = PageRequest {
        page: query.page,
        page_size: query.page_size,
        sort: query.sort,
    };
    let pockets = state
        .engine
        .find_all_pocket(&user.id, &filter, &page)
        .await?;
    Ok(Json(map_page(pockets, map_pocket)))
}

pub async fn list_by_cursor(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<PocketCursorQuery>,
) -> Result<Json<CursorPage<PocketView>>, ServerError> {
    let filter = PocketFilter { name: query.name };
    let request = CursorRequest {
        cursor: query.cursor,
        cursor_type: query.cursor_type,
        page_size: query.page_size,
    };
    let pockets = state
        .engine
        .find_all_pocket_by_cursor(&user.id, &filter, &request)
        .await?;
    Ok(Json(map_cursor_page(pockets, &uri.to_string(), map_pocket)))
}

pub async fn detail(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
) -> Result<Json<PocketDetailView>, ServerError> {
    let detail = state.engine.pocket_detail(&user.id, pocket_id).await?;
    Ok(Json(map_pocket_detail(detail)))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
    Json(payload): Json<PocketUpdate>,
) -> Result<Json<PocketView>, ServerError> {
    if payload.name.is_none() && payload.icon.is_none() && payload.currency.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name, icon or currency".to_string(),
        ));
    }

    let patch = PocketPatch {
        name: payload.name,
        icon: payload.icon,
        currency: payload.currency.map(currency_from_api),
        expected_version: payload.version,
    };
    let pocket = state
        .engine
        .edit_pocket(&user.id, pocket_id, patch)
        .await?;
    Ok(Json(map_pocket(pocket)))
}

pub async fn add_member(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
    Json(payload): Json<MemberAdd>,
) -> Result<Json<PocketView>, ServerError> {
    let pocket = state
        .engine
        .add_person(&user.id, pocket_id, &payload.user_id, payload.read_only)
        .await?;
    Ok(Json(map_pocket(pocket)))
}

pub async fn remove_member(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path((pocket_id, member_id)): Path<(Uuid, String)>,
) -> Result<Json<PocketView>, ServerError> {
    let pocket = state
        .engine
        .remove_person(&user.id, pocket_id, &member_id)
        .await?;
    Ok(Json(map_pocket(pocket)))
}

pub async fn sync_balance(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
) -> Result<Json<BalanceView>, ServerError> {
    let balance = state.engine.sync_balance(&user.id, pocket_id).await?;
    Ok(Json(BalanceView { pocket_id, balance }))
}
