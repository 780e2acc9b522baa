use axum::Json;
use serde_json::{json, Value};

/// GET /
pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "message": "TruthBot backend is running" }))
}
