use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::router::auth_routes;
use shared_database::{Collection, InMemoryStore};
use shared_utils::test_utils::{JwtTestUtils, MockRecords, TestConfig};

fn app(store: InMemoryStore) -> Router {
    auth_routes(TestConfig::default().to_state(store))
}

fn token_for(email: &str) -> String {
    JwtTestUtils::create_test_token(email, &TestConfig::default().jwt_secret, None)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn seeded_store() -> InMemoryStore {
    InMemoryStore::new().with_records(
        Collection::Users,
        vec![
            json!({ "_id": "admin-1", "email": "admin@x.com", "role": "admin" }),
            json!({ "_id": "user-1", "email": "user@x.com" }),
        ],
    )
}

#[tokio::test]
async fn test_jwt_issued_for_registered_email() {
    let (status, body) = send(
        app(seeded_store()),
        Request::builder().uri("/jwt?email=user@x.com").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accessToken"].as_str().unwrap().split('.').count(), 3);
}

#[tokio::test]
async fn test_jwt_refused_for_unknown_email() {
    let (status, body) = send(
        app(seeded_store()),
        Request::builder().uri("/jwt?email=ghost@x.com").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["accessToken"], "");
}

#[tokio::test]
async fn test_check_admin_flag() {
    let (_, admin) = send(
        app(seeded_store()),
        Request::builder().uri("/users/admin/admin@x.com").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(admin["isAdmin"], true);

    let (_, regular) = send(
        app(seeded_store()),
        Request::builder().uri("/users/admin/user@x.com").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(regular["isAdmin"], false);
}

#[tokio::test]
async fn test_signup_then_list() {
    let app = app(InMemoryStore::new());

    let (status, created) = send(
        app.clone(),
        Request::builder()
            .method("POST")
            .uri("/users")
            .header("Content-Type", "application/json")
            .body(Body::from(MockRecords::user("new@x.com").to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["acknowledged"], true);
    assert!(created["insertedId"].is_string());

    let (_, users) = send(app, Request::builder().uri("/users").body(Body::empty()).unwrap()).await;
    assert_eq!(users.as_array().unwrap().len(), 1);
    assert_eq!(users[0]["email"], "new@x.com");
}

#[tokio::test]
async fn test_promote_requires_token() {
    let (status, _) = send(
        app(seeded_store()),
        Request::builder().method("PUT").uri("/users/admin/user-1").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_method_on_admin_path_is_405() {
    let (status, _) = send(
        app(seeded_store()),
        Request::builder().method("DELETE").uri("/users/admin/user-1").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_promote_rejects_invalid_token() {
    let (status, _) = send(
        app(seeded_store()),
        Request::builder()
            .method("PUT")
            .uri("/users/admin/user-1")
            .header(AUTHORIZATION, JwtTestUtils::bearer(&JwtTestUtils::create_invalid_signature_token("admin@x.com")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_promote_forbidden_for_regular_user() {
    let (status, _) = send(
        app(seeded_store()),
        Request::builder()
            .method("PUT")
            .uri("/users/admin/user-1")
            .header(AUTHORIZATION, JwtTestUtils::bearer(&token_for("user@x.com")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_promotes_user() {
    let app = app(seeded_store());

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .method("PUT")
            .uri("/users/admin/user-1")
            .header(AUTHORIZATION, JwtTestUtils::bearer(&token_for("admin@x.com")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modifiedCount"], 1);

    let (_, check) = send(
        app,
        Request::builder().uri("/users/admin/user@x.com").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(check["isAdmin"], true);
}

#[tokio::test]
async fn test_promote_unknown_user_is_not_found() {
    let (status, _) = send(
        app(seeded_store()),
        Request::builder()
            .method("PUT")
            .uri("/users/admin/nobody")
            .header(AUTHORIZATION, JwtTestUtils::bearer(&token_for("admin@x.com")))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
