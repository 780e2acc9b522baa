mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_and_list_own_discussions() {
    let app = TestApp::new();
    let token = app.register("alice").await;

    let (status, created) = app.post("/api/discussions", &token, json!({ "title": "Moon landing" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Moon landing");
    assert_eq!(created["analyses_count"], 0);
    assert!(created["user_id"].is_string());

    app.discussion(&token, None).await;

    let (status, page) = app.get("/api/discussions", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["next"], serde_json::Value::Null);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn strangers_are_forbidden_admins_see_everything() {
    let app = TestApp::new();
    let owner = app.register("owner").await;
    let stranger = app.register("stranger").await;
    let admin = app.register("admin").await;
    app.promote("admin").await;

    let id = app.discussion(&owner, Some("Private")).await;
    let uri = format!("/api/discussions/{id}");

    let (status, body) = app.get(&uri, &stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    let (status, _) = app.delete(&uri, &stranger).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, theirs) = app.get("/api/discussions", &stranger).await;
    assert_eq!(theirs["count"], 0);

    let (status, detail) = app.get(&uri, &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Private");
    assert_eq!(detail["analyses"], json!([]));
    let (_, all) = app.get("/api/discussions", &admin).await;
    assert_eq!(all["count"], 1);
}

#[tokio::test]
async fn patch_title_sets_clears_and_ignores_absent() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.discussion(&token, Some("Old")).await;
    let uri = format!("/api/discussions/{id}");

    let (status, renamed) = app.patch(&uri, &token, json!({ "title": "New" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "New");

    let (_, untouched) = app.patch(&uri, &token, json!({})).await;
    assert_eq!(untouched["title"], "New");

    let (_, cleared) = app.patch(&uri, &token, json!({ "title": null })).await;
    assert_eq!(cleared["title"], serde_json::Value::Null);
}

#[tokio::test]
async fn delete_then_not_found() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.discussion(&token, None).await;
    let uri = format!("/api/discussions/{id}");

    let (status, body) = app.delete(&uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (status, _) = app.get(&uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/discussions/not-a-uuid", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_title_uses_first_analysis() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.discussion(&token, None).await;
    let uri = format!("/api/discussions/{id}/generate-title");

    let (status, body) = app.post(&uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let analyses = format!("/api/discussions/{id}/analyses");
    app.post(&analyses, &token, json!({ "content": "Is the earth flat? Many say no." })).await;
    app.post(&analyses, &token, json!({ "content": "Later claim. Ignored." })).await;

    let (status, titled) = app.post(&uri, &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titled["title"], "Is the earth flat?");
    assert_eq!(titled["analyses_count"], 2);
}

#[tokio::test]
async fn generate_title_shortens_long_plain_text() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    let id = app.discussion(&token, None).await;

    let content = "x".repeat(60);
    app.post(&format!("/api/discussions/{id}/analyses"), &token, json!({ "content": content })).await;

    let (status, titled) = app.post(&format!("/api/discussions/{id}/generate-title"), &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titled["title"], format!("{}...", "x".repeat(47)));
}

#[tokio::test]
async fn search_ordering_and_pagination() {
    let app = TestApp::new();
    let token = app.register("alice").await;
    for title in ["Vaccines", "Moon landing", "Moon cheese"] {
        app.discussion(&token, Some(title)).await;
    }

    let (_, found) = app.get("/api/discussions?search=moon", &token).await;
    assert_eq!(found["count"], 2);

    let (_, oldest_first) = app.get("/api/discussions?ordering=created_at", &token).await;
    assert_eq!(oldest_first["results"][0]["title"], "Vaccines");

    let (status, body) = app.get("/api/discussions?ordering=title", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, first) = app.get("/api/discussions?page_size=2", &token).await;
    assert_eq!(first["next"], 2);
    assert_eq!(first["previous"], serde_json::Value::Null);
    let (_, second) = app.get("/api/discussions?page_size=2&page=2", &token).await;
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
    assert_eq!(second["previous"], 1);

    let (status, _) = app.get("/api/discussions?page=9", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/discussions?page_size=500", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
