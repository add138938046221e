use axum::{
    extract::State,
    response::Html,
    routing::post,
    Extension, Form, Router,
};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::render::{render_page, Notice};
use crate::session::SessionId;

pub fn routes() -> Router<AppState> {
    Router::new().route("/credentials", post(update_credentials))
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsForm {
    #[serde(default)]
    model_api_key: Option<String>,
    #[serde(default)]
    search_api_key: Option<String>,
}

async fn update_credentials(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    Form(form): Form<CredentialsForm>,
) -> Html<String> {
    let (update, session) = state.sessions.update(&id, |session| {
        let update = session
            .credentials
            .apply(form.model_api_key.as_deref(), form.search_api_key.as_deref());
        (update, session.clone())
    });

    let mut notices = Vec::new();
    if update.model_key {
        notices.push(Notice::success("OpenAI API key updated!"));
    }
    if update.search_key {
        notices.push(Notice::success("Serp API key updated!"));
    }
    if update.any() {
        info!(
            model_key = update.model_key,
            search_key = update.search_key,
            "session credentials updated"
        );
    }
    Html(render_page(&session, &notices, &[]))
}
