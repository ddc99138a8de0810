//! `Idempotency-Key` replay for state-changing requests.

use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use engine::{CachedResponse, IdempotencyKey};

use crate::server::{CurrentUser, ServerState};

pub static IDEMPOTENCY_KEY_HEADER: HeaderName = HeaderName::from_static("idempotency-key");
pub static IDEMPOTENT_REPLAYED_HEADER: HeaderName =
    HeaderName::from_static("idempotent-replayed");

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PATCH | Method::PUT | Method::DELETE
    )
}

async fn capture(response: Response) -> CachedResponse {
    let (parts, body) = response.into_parts();
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => CachedResponse {
            status: parts.status.as_u16(),
            headers,
            body: bytes.to_vec(),
        },
        Err(err) => {
            tracing::error!("failed to buffer response body: {err}");
            CachedResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                headers: Vec::new(),
                body: Vec::new(),
            }
        }
    }
}

fn rebuild(cached: CachedResponse, replayed: bool) -> Response {
    let status = StatusCode::from_u16(cached.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Body::from(cached.body)).into_response();
    let headers = response.headers_mut();
    for (name, value) in &cached.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            headers.append(name, value);
        }
    }
    if replayed {
        headers.insert(
            IDEMPOTENT_REPLAYED_HEADER.clone(),
            HeaderValue::from_static("true"),
        );
    }
    response
}

/// Replays the first successful response for a repeated
/// `(caller, path, Idempotency-Key)` triple instead of running the handler
/// again. Runs inside `auth`, so the caller is known.
pub(crate) async fn replay(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }
    let key = request
        .headers()
        .get(&IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ToString::to_string);
    let Some(key) = key else {
        return next.run(request).await;
    };
    let Some(user_id) = request
        .extensions()
        .get::<CurrentUser>()
        .map(|user| user.id.clone())
    else {
        return next.run(request).await;
    };

    let key = IdempotencyKey::new(user_id, request.uri().path(), key);
    let outcome = state
        .idempotency
        .replay_or_execute(key, CachedResponse::is_success, move || async move {
            capture(next.run(request).await).await
        })
        .await;
    let replayed = outcome.is_hit();
    rebuild(outcome.into_inner(), replayed)
}
