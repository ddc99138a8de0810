use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{IDEMPOTENCY_KEY_HEADER, IDEMPOTENT_REPLAYED_HEADER, ServerState, router};

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.register_user("alice", "Alice").await.unwrap();
    engine.register_user("bob", "Bob").await.unwrap();
    router(ServerState::new(engine, 64))
}

fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_pocket(app: &Router, owner: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        request("POST", "/pockets", Some(owner), Some(json!({ "name": name }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn spend_body(pocket_id: &str, price: i64, day: u32) -> Value {
    json!({
        "pocket_id": pocket_id,
        "name": "lunch",
        "price": price,
        "date": format!("2024-03-{day:02}T12:00:00Z"),
    })
}

#[tokio::test]
async fn callers_must_be_known_users() {
    let app = app().await;

    let (status, body) = send(&app, request("GET", "/pockets", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(&app, request("GET", "/pockets", Some("mallory"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, request("GET", "/pockets", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn created_pocket_is_owned_by_the_caller() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let (status, body) = send(
        &app,
        request("GET", &format!("/pockets/{pocket_id}"), Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["owner"]["name"], "Alice");
    assert_eq!(body["pocket"]["currency"], "IDR");

    let (status, _) = send(
        &app,
        request("GET", &format!("/pockets/{pocket_id}"), Some("bob"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn watcher_cannot_record_spends() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/pockets/{pocket_id}/members"),
            Some("alice"),
            Some(json!({ "user_id": "bob", "read_only": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["watcher_ids"], json!(["alice", "bob"]));

    let (status, body) = send(
        &app,
        request("POST", "/spends", Some("bob"), Some(spend_body(&pocket_id, 1000, 1))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));
}

#[tokio::test]
async fn engine_errors_map_to_statuses() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let (status, _) = send(
        &app,
        request("POST", "/spends", Some("alice"), Some(spend_body(&pocket_id, -5, 1))),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        request(
            "GET",
            "/pockets/00000000-0000-0000-0000-000000000000",
            Some("alice"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request(
            "PATCH",
            &format!("/pockets/{pocket_id}"),
            Some("alice"),
            Some(json!({ "name": "Cash", "version": 7 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        request("PATCH", &format!("/pockets/{pocket_id}"), Some("alice"), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn idempotent_retry_replays_the_first_response() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let post = || {
        let mut req = request(
            "POST",
            "/spends",
            Some("alice"),
            Some(spend_body(&pocket_id, 50_000, 1)),
        );
        req.headers_mut()
            .insert(IDEMPOTENCY_KEY_HEADER.clone(), "retry-1".parse().unwrap());
        req
    };

    let first = app.clone().oneshot(post()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    assert!(first.headers().get(&IDEMPOTENT_REPLAYED_HEADER).is_none());
    let first_body = first.into_body().collect().await.unwrap().to_bytes();

    let second = app.clone().oneshot(post()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    assert_eq!(
        second.headers().get(&IDEMPOTENT_REPLAYED_HEADER).unwrap(),
        "true"
    );
    let second_body = second.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(first_body, second_body);

    let (_, detail) = send(
        &app,
        request("GET", &format!("/pockets/{pocket_id}"), Some("alice"), None),
    )
    .await;
    assert_eq!(detail["pocket"]["balance"], -50_000);
}

#[tokio::test]
async fn idempotency_keys_are_scoped_to_the_caller() {
    let app = app().await;
    let alice_pocket = create_pocket(&app, "alice", "Wallet").await;
    let bob_pocket = create_pocket(&app, "bob", "Wallet").await;

    let post = |user: &str, pocket_id: &str| {
        let mut req = request(
            "POST",
            "/spends",
            Some(user),
            Some(spend_body(pocket_id, 2_000, 1)),
        );
        req.headers_mut()
            .insert(IDEMPOTENCY_KEY_HEADER.clone(), "shared".parse().unwrap());
        req
    };

    let first = app.clone().oneshot(post("alice", &alice_pocket)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.clone().oneshot(post("bob", &bob_pocket)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CREATED);
    assert!(second.headers().get(&IDEMPOTENT_REPLAYED_HEADER).is_none());
    let bytes = second.into_body().collect().await.unwrap().to_bytes();
    let spend: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(spend["pocket_id"], bob_pocket.as_str());
    assert_eq!(spend["user_id"], "bob");

    let (_, detail) = send(
        &app,
        request("GET", &format!("/pockets/{bob_pocket}"), Some("bob"), None),
    )
    .await;
    assert_eq!(detail["pocket"]["balance"], -2_000);
}

#[tokio::test]
async fn failed_requests_are_not_replayed() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let post = |price: i64| {
        let mut req = request(
            "POST",
            "/spends",
            Some("alice"),
            Some(spend_body(&pocket_id, price, 1)),
        );
        req.headers_mut()
            .insert(IDEMPOTENCY_KEY_HEADER.clone(), "retry-2".parse().unwrap());
        req
    };

    let failed = app.clone().oneshot(post(-1)).await.unwrap();
    assert_eq!(failed.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let retried = app.clone().oneshot(post(1_000)).await.unwrap();
    assert_eq!(retried.status(), StatusCode::CREATED);
    assert!(retried.headers().get(&IDEMPOTENT_REPLAYED_HEADER).is_none());
}

#[tokio::test]
async fn cursor_pages_link_to_the_next_page() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;
    for day in 1..=3 {
        let (status, _) = send(
            &app,
            request("POST", "/spends", Some("alice"), Some(spend_body(&pocket_id, 100, day))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = send(
        &app,
        request(
            "GET",
            &format!("/spends/cursor?pocket_id={pocket_id}&page_size=2"),
            Some("alice"),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    let next_page = first["meta"]["next_page"].as_str().unwrap().to_string();
    assert!(next_page.starts_with(&format!("/spends/cursor?pocket_id={pocket_id}&")));
    assert!(next_page.ends_with("&page_size=2"));

    let (status, second) = send(&app, request("GET", &next_page, Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    let items = second["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["date"], "2024-03-01T12:00:00Z");
    assert!(second["meta"]["next_page"].is_null());
}

#[tokio::test]
async fn search_rejects_malformed_lists() {
    let app = app().await;

    let (status, _) = send(
        &app,
        request("GET", "/spends/search?pocket_ids=nope", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        request("GET", "/spends/search?spend_types=need,want", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn join_request_round_trip_over_http() {
    let app = app().await;
    let pocket_id = create_pocket(&app, "alice", "Wallet").await;

    let (status, request_body) = send(
        &app,
        request(
            "POST",
            "/join-requests",
            Some("bob"),
            Some(json!({ "pocket_id": pocket_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request_body["status"], "pending");
    let request_id = request_body["id"].as_str().unwrap().to_string();

    let (_, incoming) = send(
        &app,
        request("GET", "/join-requests/in?status=pending", Some("alice"), None),
    )
    .await;
    assert_eq!(incoming["total"], 1);

    let (status, _) = send(
        &app,
        request(
            "POST",
            &format!("/join-requests/{request_id}/decision"),
            Some("bob"),
            Some(json!({ "approve": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, decided) = send(
        &app,
        request(
            "POST",
            &format!("/join-requests/{request_id}/decision"),
            Some("alice"),
            Some(json!({ "approve": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");

    let (_, detail) = send(
        &app,
        request("GET", &format!("/pockets/{pocket_id}"), Some("bob"), None),
    )
    .await;
    assert_eq!(detail["role"], "editor");
}
