use axum::{
    extract::State,
    response::Html,
    routing::get,
    Extension, Router,
};

use super::AppState;
use crate::render::render_page;
use crate::session::SessionId;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

async fn index(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Html<String> {
    let session = state.sessions.snapshot(&id);
    Html(render_page(&session, &[], &[]))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::session::SESSION_COOKIE;
    use crate::test_helpers::{body_text, test_router};

    #[tokio::test]
    async fn first_visit_sets_session_cookie() {
        let response = test_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with(&format!("{SESSION_COOKIE}=")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let html = body_text(response).await;
        assert!(html.contains("Bird Watch Companion Bot"));
        assert!(html.contains("🐦 Generate Bird Report"));
    }
}
