use std::sync::Arc;

use services::{AnalysisService, AuthService, DiscussionService, Gateway};

use crate::metrics::HttpMetrics;

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub discussions: Arc<DiscussionService>,
    pub analyses: Arc<AnalysisService>,
    pub gateway: Gateway,
    pub metrics: Arc<HttpMetrics>,
}
