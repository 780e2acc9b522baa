//! Route table and middleware stack.
//!
//! ```text
//! GET    /                                            health
//! GET    /metrics                                     Prometheus text
//! POST   {prefix}/register
//! POST   {prefix}/token                               JSON or form
//! GET    {prefix}/users/me
//! POST   {prefix}/chat                                auth optional
//! POST   {prefix}/quiz
//! GET    {prefix}/discussions                         POST creates
//! GET    {prefix}/discussions/{id}                    PATCH, DELETE
//! POST   {prefix}/discussions/{id}/generate-title
//! GET    {prefix}/discussions/{id}/analyses           POST creates
//! GET    {prefix}/discussions/{id}/analyses/{aid}     PATCH, DELETE
//! ```

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::handlers::{analyses, assistant, auth, discussions, system};
use crate::metrics::{expose, track_requests};
use crate::state::AppState;

const REQUEST_ID: &str = "x-request-id";

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::login))
        .route("/users/me", get(auth::me))
        .route("/chat", post(assistant::chat))
        .route("/quiz", post(assistant::quiz))
        .route("/discussions", get(discussions::list).post(discussions::create))
        .route(
            "/discussions/{id}",
            get(discussions::get).patch(discussions::update).delete(discussions::delete),
        )
        .route("/discussions/{id}/generate-title", post(discussions::generate_title))
        .route("/discussions/{id}/analyses", get(analyses::list).post(analyses::create))
        .route(
            "/discussions/{id}/analyses/{analysis_id}",
            get(analyses::get).patch(analyses::update).delete(analyses::delete),
        )
}

/// Builds the full application. `api_prefix` is `""` or a path such as `/api`.
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let prefix = api_prefix.trim_end_matches('/');
    let root = Router::new().route("/", get(system::health)).route("/metrics", get(expose));
    let app = if prefix.is_empty() {
        root.merge(api_routes())
    } else {
        root.nest(prefix, api_routes())
    };

    let request_id = HeaderName::from_static(REQUEST_ID);
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    app.layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let request_id = req.headers().get(REQUEST_ID).and_then(|v| v.to_str().ok()).unwrap_or("-");
                    info_span!("http", method = %req.method(), uri = %req.uri(), request_id)
                }))
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors),
        )
        .with_state(state)
}
