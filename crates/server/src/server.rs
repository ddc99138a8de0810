use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};

use std::sync::Arc;

use crate::{ServerError, categories, idempotency, join_requests, pockets, spends};
use engine::{CachedResponse, Engine, IdempotencyCache};

static USER_ID_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-user-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub idempotency: Arc<IdempotencyCache<CachedResponse>>,
}

impl ServerState {
    pub fn new(engine: Engine, idempotency_capacity: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            idempotency: Arc::new(IdempotencyCache::with_capacity(idempotency_capacity)),
        }
    }
}

/// The caller, resolved from the user directory.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
}

/// `TypedHeader` for the caller identity.
///
/// Authentication happens upstream; requests reach us with the verified user
/// id in "x-user-id".
#[derive(Debug)]
struct UserIdHeader(String);

impl Header for UserIdHeader {
    fn name() -> &'static axum::http::HeaderName {
        &USER_ID_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(UserIdHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-user-id header"),
        }
    }
}

async fn auth(
    user_header: Option<TypedHeader<UserIdHeader>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(UserIdHeader(user_id))) = user_header else {
        return Err(ServerError::Unauthorized);
    };

    let Some(name) = state.engine.user_name(&user_id).await? else {
        tracing::debug!(%user_id, "unknown caller");
        return Err(ServerError::Unauthorized);
    };

    request
        .extensions_mut()
        .insert(CurrentUser { id: user_id, name });
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/pockets", post(pockets::create).get(pockets::list))
        .route("/pockets/cursor", get(pockets::list_by_cursor))
        .route("/pockets/{id}", get(pockets::detail).patch(pockets::update))
        .route("/pockets/{id}/members", post(pockets::add_member))
        .route(
            "/pockets/{id}/members/{user_id}",
            axum::routing::delete(pockets::remove_member),
        )
        .route("/pockets/{id}/sync-balance", post(pockets::sync_balance))
        .route(
            "/pockets/{id}/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route("/spends", post(spends::create).get(spends::list))
        .route("/spends/cursor", get(spends::list_by_cursor))
        .route("/spends/search", get(spends::search))
        .route("/spends/transfer", post(spends::transfer))
        .route(
            "/spends/{id}",
            get(spends::detail)
                .patch(spends::update)
                .delete(spends::delete),
        )
        .route("/join-requests", post(join_requests::create))
        .route("/join-requests/in", get(join_requests::incoming))
        .route("/join-requests/out", get(join_requests::outgoing))
        .route(
            "/join-requests/{id}/decision",
            post(join_requests::decide),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            idempotency::replay,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(state: ServerState, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
