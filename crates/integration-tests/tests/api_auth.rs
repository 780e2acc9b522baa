mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_then_fetch_profile() {
    let app = TestApp::new();
    let (status, body) = app
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "username": "alice", "password": "wonderland", "full_name": "Alice Liddell" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap();

    let (status, me) = app.get("/api/users/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["full_name"], "Alice Liddell");
    assert_eq!(me["is_admin"], false);
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_username_is_bad_request() {
    let app = TestApp::new();
    app.register("bob").await;
    let (status, body) = app
        .call(Method::POST, "/api/register", None, Some(json!({ "username": "bob", "password": "another1" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "Username already registered");
}

#[tokio::test]
async fn login_accepts_json_and_form() {
    let app = TestApp::new();
    app.register("carol").await;

    let (status, body) = app
        .call(Method::POST, "/api/token", None, Some(json!({ "username": "carol", "password": "password123" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());

    let form = Request::builder()
        .method(Method::POST)
        .uri("/api/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("grant_type=password&username=carol&password=password123"))
        .unwrap();
    let (status, body) = app.send(form).await;
    assert_eq!(status, StatusCode::OK);
    let (status, me) = app.get("/api/users/me", body["access_token"].as_str().unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "carol");
}

#[tokio::test]
async fn bad_credentials_do_not_reveal_which_part_was_wrong() {
    let app = TestApp::new();
    app.register("dave").await;

    let wrong_password = Request::builder()
        .method(Method::POST)
        .uri("/api/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username":"dave","password":"nope"}"#))
        .unwrap();
    let response = {
        use tower::ServiceExt;
        app.router.clone().oneshot(wrong_password).await.unwrap()
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

    let (_, wrong_pw_body) = app
        .call(Method::POST, "/api/token", None, Some(json!({ "username": "dave", "password": "nope" })))
        .await;
    let (status, unknown_body) = app
        .call(Method::POST, "/api/token", None, Some(json!({ "username": "nobody", "password": "nope" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);
    assert_eq!(unknown_body["message"], "Incorrect username or password");
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app.get("/api/users/me", "not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::POST, "/api/register", None, Some(json!({ "username": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn health_metrics_and_request_id() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    insta::assert_json_snapshot!(body, @r###"
    {
      "message": "TruthBot backend is running"
    }
    "###);

    let response = {
        use tower::ServiceExt;
        app.router.clone().oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap()
    };
    assert!(response.headers().contains_key("x-request-id"));

    let (status, metrics) = app.call(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = metrics.as_str().unwrap();
    assert!(text.contains(r#"http_requests_total{method="GET",status="200"}"#));
}
