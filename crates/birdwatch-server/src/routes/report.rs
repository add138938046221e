use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError},
        DefaultBodyLimit, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use birdwatch_core::{BirdImage, BirdProfile, ImageError, REPORT_FILENAME, REPORT_MIME};
use tracing::{error, info, warn};

use super::AppState;
use crate::render::{render_page, Notice};
use crate::session::SessionId;

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/report",
            post(generate_report).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/report/download", get(download_report))
        .route("/report/image", get(report_image))
}

/// A file part as it arrived, before type checks.
struct Upload {
    bytes: Bytes,
    content_type: Option<String>,
    filename: Option<String>,
}

#[derive(Default)]
struct Submission {
    image: Option<Upload>,
    region: String,
    behavior: String,
}

async fn read_submission(multipart: &mut Multipart) -> Result<Submission, MultipartError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().map(str::to_string);
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    submission.image = Some(Upload {
                        bytes,
                        content_type,
                        filename,
                    });
                }
            }
            "region" => submission.region = field.text().await?,
            "behavior" => submission.behavior = field.text().await?,
            _ => {}
        }
    }
    Ok(submission)
}

/// Re-render the page with an inline error; the cached report is left as is.
fn reject(state: &AppState, id: &str, status: StatusCode, message: impl Into<String>) -> Response {
    let session = state.sessions.snapshot(id);
    (
        status,
        Html(render_page(&session, &[], &[Notice::error(message)])),
    )
        .into_response()
}

async fn generate_report(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
    mut multipart: Multipart,
) -> Response {
    let submission = match read_submission(&mut multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            warn!("rejected upload: {e}");
            return reject(
                &state,
                &id,
                e.status(),
                format!("Could not read the upload: {}", e.body_text()),
            );
        }
    };

    let session = state.sessions.snapshot(&id);
    let image = match submission.image {
        None => None,
        Some(upload) => match BirdImage::from_upload(
            upload.bytes,
            upload.content_type.as_deref(),
            upload.filename.as_deref(),
        ) {
            Ok(image) => Some(image),
            Err(ImageError::Empty) => None,
            Err(e) => {
                // Missing keys still take precedence over a bad file.
                let message = match session.check_credentials() {
                    Err(missing) => missing.to_string(),
                    Ok(()) => e.to_string(),
                };
                warn!("rejected submission: {message}");
                return reject(&state, &id, StatusCode::BAD_REQUEST, message);
            }
        },
    };

    let image = match session.check_submission(image) {
        Ok(image) => image,
        Err(missing) => {
            warn!("rejected submission: {missing}");
            return reject(&state, &id, StatusCode::BAD_REQUEST, missing.to_string());
        }
    };

    let profile = BirdProfile::new(image, &submission.region, &submission.behavior);
    info!(
        region = %profile.region,
        image_bytes = profile.image.len(),
        "generating report"
    );

    match state
        .pipeline
        .generate_report(&profile, &session.credentials)
        .await
    {
        Ok(report) => {
            state
                .sessions
                .update(&id, |s| s.replace_report(report, profile.image));
            Redirect::to("/").into_response()
        }
        Err(e) => {
            error!("report generation failed: {e}");
            reject(
                &state,
                &id,
                StatusCode::BAD_GATEWAY,
                format!("Report generation failed: {e}"),
            )
        }
    }
}

async fn download_report(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Response {
    match state.sessions.snapshot(&id).current {
        Some(cached) => (
            [
                (header::CONTENT_TYPE, REPORT_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{REPORT_FILENAME}\""),
                ),
            ],
            cached.report.into_string(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No report has been generated yet.").into_response(),
    }
}

async fn report_image(
    State(state): State<AppState>,
    Extension(SessionId(id)): Extension<SessionId>,
) -> Response {
    match state.sessions.snapshot(&id).current {
        Some(cached) => (
            [
                (header::CONTENT_TYPE, cached.image.mime_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            cached.image.bytes,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "No report has been generated yet.").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, Router};
    use birdwatch_pipeline::{backend::MockChat, search::MockSearch, MockConnector};
    use birdwatch_prompts::SEARCH_TOOL_NAME;
    use tower::ServiceExt;

    use super::*;
    use crate::test_helpers::{body_bytes, body_text, multipart_body, test_state_with, MULTIPART_BOUNDARY};

    const IDENTIFICATION: &str = "**Common Name**: Barn Swallow\n\
        **Scientific Name**: *Hirundo rustica*\n\
        **Confidence**: 92%";
    const LINKS: &str = "- https://www.audubon.org/field-guide/bird/barn-swallow\n\
        - https://www.allaboutbirds.org/guide/Barn_Swallow";
    const REPORT: &str = "## 🐦 Bird Identification\n\n**Common Name**: Barn Swallow\n\n\
        ## 🌍 Observation & Care Guide\n\n### 🍽️ Feeding Habits\n- Aerial insectivore\n";
    const JPEG: &[u8] = b"\xff\xd8\xff\xe0swallow-photo";

    fn swallow_chat() -> MockChat {
        MockChat::new()
            .then_text(IDENTIFICATION)
            .then_tool_call("call_1", SEARCH_TOOL_NAME, r#"{"query":"Barn Swallow habitat"}"#)
            .then_text(LINKS)
            .then_text(REPORT)
    }

    /// A router over `chat`, plus a session id that already has both keys.
    fn keyed_session(chat: MockChat) -> (Router, AppState, Arc<MockConnector>, String) {
        let connector = Arc::new(MockConnector::new(
            chat,
            MockSearch::with_links(&["https://www.audubon.org/field-guide/bird/barn-swallow"]),
        ));
        let (router, state) = test_state_with(connector.clone());
        let (id, _) = state.sessions.resolve(None);
        state
            .sessions
            .update(&id, |s| s.credentials.apply(Some("sk-model"), Some("serp-key")));
        (router, state, connector, id)
    }

    fn submit(id: &str, image: Option<(&str, &str, &[u8])>) -> Request<Body> {
        Request::post("/report")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .header(header::COOKIE, format!("birdwatch_session={id}"))
            .body(Body::from(multipart_body("Central Park, NY", "", image)))
            .unwrap()
    }

    fn get(path: &str, id: &str) -> Request<Body> {
        Request::get(path)
            .header(header::COOKIE, format!("birdwatch_session={id}"))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn missing_model_key_blocks_submission() {
        let connector = Arc::new(MockConnector::new(swallow_chat(), MockSearch::with_links(&[])));
        let (router, state) = test_state_with(connector.clone());
        let (id, _) = state.sessions.resolve(None);

        let response = router
            .oneshot(submit(&id, Some(("bird.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Please provide your OpenAI API key in the sidebar."));
        assert_eq!(connector.chat.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_search_key_blocks_submission() {
        let connector = Arc::new(MockConnector::new(swallow_chat(), MockSearch::with_links(&[])));
        let (router, state) = test_state_with(connector.clone());
        let (id, _) = state.sessions.resolve(None);
        state
            .sessions
            .update(&id, |s| s.credentials.apply(Some("sk-model"), None));

        let response = router
            .oneshot(submit(&id, Some(("bird.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Please provide your SerpAPI key in the sidebar."));
        assert_eq!(connector.chat.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_image_blocks_submission() {
        let (router, _, connector, id) = keyed_session(swallow_chat());

        let response = router.oneshot(submit(&id, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Please upload a bird image before generating the report."));
        assert_eq!(connector.chat.call_count(), 0);
        assert!(connector.keys_seen().is_empty());
    }

    #[tokio::test]
    async fn unsupported_image_type_is_rejected() {
        let (router, _, connector, id) = keyed_session(swallow_chat());

        let response = router
            .oneshot(submit(&id, Some(("bird.gif", "image/gif", &b"GIF89a"[..]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("unsupported image type: image/gif"));
        assert_eq!(connector.chat.call_count(), 0);
    }

    #[tokio::test]
    async fn barn_swallow_report_is_cached_and_downloadable() {
        let (router, state, connector, id) = keyed_session(swallow_chat());

        let response = router
            .clone()
            .oneshot(submit(&id, Some(("swallow.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(connector.chat.call_count(), 4);
        assert_eq!(connector.keys_seen(), vec!["sk-model", "serp-key"]);

        let cached = state.sessions.snapshot(&id).current.unwrap();
        assert_eq!(cached.report.as_str(), REPORT);

        let page = router.clone().oneshot(get("/", &id)).await.unwrap();
        let html = body_text(page).await;
        assert!(html.contains("🖼️ Uploaded Bird Image"));
        assert!(html.contains("Download Bird Report"));

        let image = router.clone().oneshot(get("/report/image", &id)).await.unwrap();
        assert_eq!(image.status(), StatusCode::OK);
        assert_eq!(image.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(body_bytes(image).await, JPEG);

        let download = router.oneshot(get("/report/download", &id)).await.unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(
            download.headers()[header::CONTENT_TYPE],
            "text/markdown; charset=utf-8"
        );
        assert_eq!(
            download.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"birdwatch_report.md\""
        );
        assert_eq!(body_bytes(download).await, REPORT.as_bytes());
    }

    #[tokio::test]
    async fn research_auth_failure_keeps_previous_report() {
        let chat = swallow_chat()
            .then_text(IDENTIFICATION)
            .then_error(401, "Incorrect API key provided");
        let (router, state, connector, id) = keyed_session(chat);

        let first = router
            .clone()
            .oneshot(submit(&id, Some(("swallow.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::SEE_OTHER);

        let second = router
            .clone()
            .oneshot(submit(&id, Some(("robin.png", "image/png", &b"\x89PNGrobin"[..]))))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::BAD_GATEWAY);
        let html = body_text(second).await;
        assert!(html.contains("Report generation failed:"));
        assert!(html.contains("Incorrect API key provided"));
        // The earlier report is still on the page.
        assert!(html.contains("Aerial insectivore"));
        assert_eq!(connector.chat.call_count(), 6);

        let cached = state.sessions.snapshot(&id).current.unwrap();
        assert_eq!(cached.report.as_str(), REPORT);
        assert_eq!(cached.image.bytes, Bytes::from_static(JPEG));

        let image = router.oneshot(get("/report/image", &id)).await.unwrap();
        assert_eq!(body_bytes(image).await, JPEG);
    }

    #[tokio::test]
    async fn download_and_image_are_404_without_report() {
        let (router, _, _, id) = keyed_session(MockChat::new());

        let download = router
            .clone()
            .oneshot(get("/report/download", &id))
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::NOT_FOUND);

        let image = router.oneshot(get("/report/image", &id)).await.unwrap();
        assert_eq!(image.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sessions_do_not_share_reports() {
        let (router, state, _, id) = keyed_session(swallow_chat());
        router
            .clone()
            .oneshot(submit(&id, Some(("swallow.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();

        let (other, _) = state.sessions.resolve(None);
        let download = router.oneshot(get("/report/download", &other)).await.unwrap();
        assert_eq!(download.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_before_any_call() {
        let (router, state, connector, id) = keyed_session(swallow_chat());
        let limit = state.max_upload_bytes;
        let big = vec![0xffu8; 2 * limit];

        let response = router
            .oneshot(submit(&id, Some(("huge.jpg", "image/jpeg", &big[..]))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let html = body_text(response).await;
        assert!(html.contains("Could not read the upload"));
        assert!(html.contains("🐦 Generate Bird Report"));
        assert_eq!(connector.chat.call_count(), 0);
        assert!(state.sessions.snapshot(&id).current.is_none());
    }

    #[tokio::test]
    async fn second_report_replaces_image_and_download() {
        const ROBIN_REPORT: &str = "## 🐦 Bird Identification\n\n**Common Name**: American Robin\n";
        const PNG: &[u8] = b"\x89PNG\r\n\x1a\nrobin-photo";
        let chat = swallow_chat()
            .then_text("**Common Name**: American Robin")
            .then_tool_call("call_2", SEARCH_TOOL_NAME, r#"{"query":"American Robin habitat"}"#)
            .then_text("- https://www.allaboutbirds.org/guide/American_Robin")
            .then_text(ROBIN_REPORT);
        let (router, _, connector, id) = keyed_session(chat);

        let first = router
            .clone()
            .oneshot(submit(&id, Some(("swallow.jpg", "image/jpeg", JPEG))))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::SEE_OTHER);
        let second = router
            .clone()
            .oneshot(submit(&id, Some(("robin.png", "image/png", PNG))))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::SEE_OTHER);
        assert_eq!(connector.chat.call_count(), 8);

        let image = router.clone().oneshot(get("/report/image", &id)).await.unwrap();
        assert_eq!(image.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(image).await, PNG);

        let download = router.oneshot(get("/report/download", &id)).await.unwrap();
        assert_eq!(body_bytes(download).await, ROBIN_REPORT.as_bytes());
    }
}
