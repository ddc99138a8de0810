//! Categories API endpoints.

use api_types::category::{
    CategoryListQuery, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{CategoryPatch, NewCategory};
use uuid::Uuid;

use crate::{
    ServerError,
    mapping::{map_category, spend_type_from_api},
    server::{CurrentUser, ServerState},
};

pub async fn list(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let categories = state
        .engine
        .find_all_category(&user.id, pocket_id, query.is_income)
        .await?
        .into_iter()
        .map(map_category)
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(pocket_id): Path<Uuid>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let cmd = NewCategory {
        name: payload.name,
        icon: payload.icon,
        is_income: payload.is_income,
        default_spend_type: payload.default_spend_type.map(spend_type_from_api),
    };
    let category = state
        .engine
        .create_category(&user.id, pocket_id, cmd)
        .await?;
    Ok((StatusCode::CREATED, Json(map_category(category))))
}

pub async fn update(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    if payload.name.is_none() && payload.icon.is_none() && payload.default_spend_type.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name, icon or default_spend_type".to_string(),
        ));
    }

    let patch = CategoryPatch {
        name: payload.name,
        icon: payload.icon,
        default_spend_type: payload
            .default_spend_type
            .map(|value| value.map(spend_type_from_api)),
    };
    let category = state
        .engine
        .edit_category(&user.id, category_id, patch)
        .await?;
    Ok(Json(map_category(category)))
}

pub async fn delete(
    Extension(user): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(&user.id, category_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
