#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{build_router, AppState, HttpMetrics};
use auth_adapters::JwtTokenService;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::{
    AnalysisRepository, DiscussionRepository, GatewayError, MockLanguageModel, MockPasswordHasher, UserRepository,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use services::{AnalysisService, AuthService, DiscussionService, Gateway};
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub const SCORE_REPLY: &str = r#"{"score": 82.456, "explanation": "Matches scientific consensus."}"#;

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

/// Plain-text "hash" so tests do not pay for Argon2.
fn fast_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().returning(|password| Ok(format!("hashed:{password}")));
    hasher.expect_verify().returning(|password, hash| hash == format!("hashed:{password}"));
    hasher
}

pub fn model_replying(reply: &'static str) -> MockLanguageModel {
    let mut model = MockLanguageModel::new();
    model.expect_complete().returning(move |_| Ok(reply.to_string()));
    model
}

pub fn model_failing(error: GatewayError) -> MockLanguageModel {
    let mut model = MockLanguageModel::new();
    model.expect_complete().returning(move |_| Err(error.clone()));
    model
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(model_replying(SCORE_REPLY))
    }

    pub fn with_model(model: MockLanguageModel) -> Self {
        let store = MemoryStore::new();
        let users: Arc<dyn UserRepository> = Arc::new(store.clone());
        let discussions: Arc<dyn DiscussionRepository> = Arc::new(store.clone());
        let analyses: Arc<dyn AnalysisRepository> = Arc::new(store.clone());
        let tokens = JwtTokenService::new(
            &SecretString::from("integration-test-secret".to_string()),
            chrono::Duration::minutes(30),
        );
        let gateway = Gateway::new(Arc::new(model));

        let state = AppState {
            auth: Arc::new(AuthService::new(users, Arc::new(fast_hasher()), Arc::new(tokens))),
            discussions: Arc::new(DiscussionService::new(discussions.clone(), analyses.clone())),
            analyses: Arc::new(AnalysisService::new(discussions, analyses, gateway.clone())),
            gateway,
            metrics: Arc::new(HttpMetrics::new()),
        };
        Self { router: build_router(state, "/api"), store }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers `username` with password `"password123"` and returns its token.
    pub async fn register(&self, username: &str) -> String {
        self.register_named(username, None).await
    }

    pub async fn register_named(&self, username: &str, full_name: Option<&str>) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register",
                None,
                Some(json!({ "username": username, "password": "password123", "full_name": full_name })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn promote(&self, username: &str) {
        let user = self.store.find_by_username(username).await.unwrap().unwrap();
        self.store.set_admin(user.id, true).await.unwrap();
    }

    /// Creates a discussion and returns its id.
    pub async fn discussion(&self, token: &str, title: Option<&str>) -> String {
        let (status, body) = self.post("/api/discussions", token, json!({ "title": title })).await;
        assert_eq!(status, StatusCode::CREATED, "create discussion failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}
