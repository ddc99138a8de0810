//! Join request API endpoints.

use api_types::{
    join_request::{JoinRequestDecision, JoinRequestListQuery, JoinRequestNew, JoinRequestView},
    page::Page,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{JoinRequestFilter, PageRequest};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{map_join_request, map_page, status_from_api},
    server::{CurrentUser, ServerState},
};

fn split_query(query: JoinRequestListQuery) -> (JoinRequestFilter, PageRequest) {
    (
        JoinRequestFilter {
            status: query.status.map(status_from_api),
        },
        PageRequest {
            page: query.page,
            page_size: query.page_size,
            sort: query.sort,
        },
    )
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<JoinRequestNew>,
) -> Result<(StatusCode, Json<JoinRequestView>), ServerError> {
    let request = state
        .engine
        .create_join_request(&user.id, payload.pocket_id)
        .await?;
    Ok((StatusCode::CREATED, Json(map_join_request(request))))
}

/// Requests waiting on the caller.
pub async fn incoming(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<JoinRequestListQuery>,
) -> Result<Json<Page<JoinRequestView>>, ServerError> {
    let (filter, page) = split_query(query);
    let requests = state
        .engine
        .find_all_join_request_by_approver(&user.id, &filter, &page)
        .await?;
    Ok(Json(map_page(requests, map_join_request)))
}

/// Requests the caller has sent.
pub async fn outgoing(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Query(query): Query<JoinRequestListQuery>,
) -> Result<Json<Page<JoinRequestView>>, ServerError> {
    let (filter, page) = split_query(query);
    let requests = state
        .engine
        .find_all_join_request_by_requester(&user.id, &filter, &page)
        .await?;
    Ok(Json(map_page(requests, map_join_request)))
}

pub async fn decide(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<JoinRequestDecision>,
) -> Result<Json<JoinRequestView>, ServerError> {
    let request = state
        .engine
        .approve_or_reject(&user.id, request_id, payload.approve)
        .await?;
    Ok(Json(map_join_request(request)))
}
