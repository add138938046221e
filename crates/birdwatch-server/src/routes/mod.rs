pub mod credentials;
pub mod health;
pub mod report;
pub mod ui;

use std::sync::Arc;

use axum::{middleware, Router};
use birdwatch_pipeline::ReportPipeline;
use tower_http::trace::TraceLayer;

use crate::session::{session_middleware, SessionStore};

pub struct InnerAppState {
    pub pipeline: ReportPipeline,
    pub sessions: Arc<SessionStore>,
    /// Largest accepted multipart body for `POST /report`.
    pub max_upload_bytes: usize,
}

pub type AppState = Arc<InnerAppState>;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new().merge(health::routes());

    let session = Router::new()
        .merge(ui::routes())
        .merge(credentials::routes())
        .merge(report::routes(state.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    public
        .merge(session)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
