use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use birdwatch_core::SessionContext;
use chrono::Utc;
use tracing::{debug, info};

use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "birdwatch_session";

/// Session id attached to each request by [`session_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionId(pub String);

/// In-memory sessions keyed by cookie value.
///
/// The lock is only ever held for short synchronous sections; handlers copy
/// what they need out before awaiting remote calls.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionContext>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve a cookie value to a live session, creating a new one when the
    /// cookie is absent or unknown. Returns the id and whether it is new.
    pub fn resolve(&self, cookie: Option<&str>) -> (String, bool) {
        let mut sessions = self.lock();
        if let Some(id) = cookie {
            if let Some(session) = sessions.get_mut(id) {
                session.touch();
                return (id.to_string(), false);
            }
        }
        let id = generate_session_id();
        sessions.insert(id.clone(), SessionContext::default());
        (id, true)
    }

    /// Run `f` against the session, creating it if it was evicted meanwhile.
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let mut sessions = self.lock();
        let session = sessions.entry(id.to_string()).or_default();
        f(session)
    }

    /// A copy of the session's current state.
    pub fn snapshot(&self, id: &str) -> SessionContext {
        self.lock().get(id).cloned().unwrap_or_default()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    pub fn evict_idle(&self, ttl: chrono::Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_idle(now, ttl));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Generate a session id: 32 chars of base62-encoded random bytes.
pub fn generate_session_id() -> String {
    use rand::Rng;
    const BASE62: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| BASE62[rng.gen_range(0..BASE62.len())] as char)
        .collect()
}

/// Extract the session cookie value from request headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Axum middleware that attaches a [`SessionId`] to every request and sets
/// the session cookie when a new session was created.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (id, is_new) = state.sessions.resolve(session_cookie(request.headers()));
    if is_new {
        debug!("created session");
    }
    request.extensions_mut().insert(SessionId(id.clone()));

    let mut response = next.run(request).await;
    if is_new {
        let cookie = format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Background task that ends idle sessions, clearing their keys and reports.
pub async fn run_sweeper(store: Arc<SessionStore>, ttl: chrono::Duration, scan_interval: Duration) {
    let mut ticker = tokio::time::interval(scan_interval);
    loop {
        ticker.tick().await;
        let removed = store.evict_idle(ttl);
        if removed > 0 {
            info!("session sweeper: ended {removed} idle sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birdwatch_core::BirdReport;

    #[test]
    fn resolve_creates_then_reuses() {
        let store = SessionStore::new();
        let (id, is_new) = store.resolve(None);
        assert!(is_new);
        assert_eq!(id.len(), 32);

        let (again, is_new) = store.resolve(Some(&id));
        assert!(!is_new);
        assert_eq!(again, id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_cookie_gets_fresh_session() {
        let store = SessionStore::new();
        let (id, is_new) = store.resolve(Some("stale"));
        assert!(is_new);
        assert_ne!(id, "stale");
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (a, _) = store.resolve(None);
        let (b, _) = store.resolve(None);
        store.update(&a, |s| {
            s.credentials.apply(Some("sk-a"), None);
        });
        assert_eq!(store.snapshot(&a).credentials.model_key(), Some("sk-a"));
        assert_eq!(store.snapshot(&b).credentials.model_key(), None);
    }

    #[test]
    fn evict_idle_removes_old_sessions() {
        let store = SessionStore::new();
        let (old, _) = store.resolve(None);
        let (fresh, _) = store.resolve(None);
        store.update(&old, |s| {
            s.current = None;
            s.last_seen = Utc::now() - chrono::Duration::hours(2);
        });

        assert_eq!(store.evict_idle(chrono::Duration::minutes(60)), 1);
        assert_eq!(store.len(), 1);
        assert!(store.snapshot(&fresh).current.is_none());
        // The evicted session comes back empty.
        let (id, is_new) = store.resolve(Some(&old));
        assert!(is_new);
        assert_ne!(id, old);
    }

    #[test]
    fn update_recreates_evicted_session() {
        let store = SessionStore::new();
        store.update("gone", |s| {
            s.current = Some(birdwatch_core::CachedReport {
                report: BirdReport::new("r"),
                image: birdwatch_core::BirdImage::from_upload(
                    bytes::Bytes::from_static(b"x"),
                    Some("image/png"),
                    None,
                )
                .unwrap(),
                generated_at: Utc::now(),
            });
        });
        assert!(store.snapshot("gone").current.is_some());
    }

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; birdwatch_session=abc123; other=1"),
        );
        assert_eq!(session_cookie(&headers), Some("abc123"));

        let empty = HeaderMap::new();
        assert_eq!(session_cookie(&empty), None);
    }

    #[test]
    fn session_ids_are_unique_base62() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
