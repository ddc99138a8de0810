use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{CurrentUser, ServerState, router, run, run_with_listener, spawn_with_listener};

mod categories;
mod idempotency;
mod join_requests;
mod mapping;
mod pockets;
mod server;
mod spends;

pub use idempotency::{IDEMPOTENCY_KEY_HEADER, IDEMPOTENT_REPLAYED_HEADER};

pub mod types {
    pub use api_types::{Currency, SpendType};

    pub mod page {
        pub use api_types::page::{CursorMeta, CursorPage, Page};
    }

    pub mod pocket {
        pub use api_types::pocket::{
            BalanceView, MemberAdd, MemberView, PocketCursorQuery, PocketDetailView,
            PocketListQuery, PocketNew, PocketUpdate, PocketView, Role,
        };
    }

    pub mod category {
        pub use api_types::category::{
            CategoryListQuery, CategoryListResponse, CategoryNew, CategoryUpdate, CategoryView,
        };
    }

    pub mod spend {
        pub use api_types::spend::{
            SpendCursorQuery, SpendListQuery, SpendNew, SpendSearchQuery, SpendUpdate, SpendView,
            TransferNew, TransferView,
        };
    }

    pub mod join_request {
        pub use api_types::join_request::{
            JoinRequestDecision, JoinRequestListQuery, JoinRequestNew, JoinRequestStatus,
            JoinRequestView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized,
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Forbidden(reason) => {
            tracing::debug!(%reason, "forbidden");
            "forbidden".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
