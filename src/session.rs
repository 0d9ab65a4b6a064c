use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use mediagrab_core::models::media::{DownloadResult, Metadata};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "mediagrab_session";

#[derive(Debug, Clone)]
pub struct AnalyzedMedia {
    pub metadata: Metadata,
    pub analyzed_at: DateTime<Utc>,
    /// Bumped on every successful analysis; a prepared file is only kept
    /// while it matches.
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct PreparedFile {
    pub result: DownloadResult,
    pub prepared_at: DateTime<Utc>,
    pub generation: u64,
}

/// Last results of each action. Each slot is replaced wholesale, never merged.
#[derive(Debug, Default)]
pub struct SessionState {
    pub analyzed: Option<AnalyzedMedia>,
    pub file: Option<PreparedFile>,
    last_generation: u64,
}

impl SessionState {
    pub fn current_generation(&self) -> Option<u64> {
        self.analyzed.as_ref().map(|a| a.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Analyze,
    Download,
}

pub struct Session {
    id: Uuid,
    state: Mutex<SessionState>,
    analyze_gate: Arc<Mutex<()>>,
    download_gate: Arc<Mutex<()>>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState::default()),
            analyze_gate: Arc::new(Mutex::new(())),
            download_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Single-flight: `None` while the same action is still running.
    pub fn try_begin(&self, action: Action) -> Option<OwnedMutexGuard<()>> {
        let gate = match action {
            Action::Analyze => &self.analyze_gate,
            Action::Download => &self.download_gate,
        };
        gate.clone().try_lock_owned().ok()
    }

    pub async fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// A new analysis makes any prepared file stale, so it is dropped too.
    pub async fn store_metadata(&self, metadata: Metadata) -> AnalyzedMedia {
        let mut state = self.state.lock().await;
        state.last_generation += 1;
        let analyzed = AnalyzedMedia {
            metadata,
            analyzed_at: Utc::now(),
            generation: state.last_generation,
        };
        state.analyzed = Some(analyzed.clone());
        state.file = None;
        analyzed
    }

    /// Stores a file made for analysis `generation`. Returns `None` and keeps
    /// nothing when another link was analyzed while it was being fetched.
    pub async fn store_file(&self, result: DownloadResult, generation: u64) -> Option<PreparedFile> {
        let mut state = self.state.lock().await;
        if state.current_generation() != Some(generation) {
            tracing::info!(
                "Dropping {} for session {}: a newer link was analyzed",
                result.file_name,
                self.id
            );
            return None;
        }

        let prepared = PreparedFile {
            result,
            prepared_at: Utc::now(),
            generation,
        };
        state.file = Some(prepared.clone());
        Some(prepared)
    }
}

struct Entry {
    session: Arc<Session>,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<std::sync::Mutex<HashMap<Uuid, Entry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Entry>> {
        let now = Instant::now();
        let mut map = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let idle_timeout = self.idle_timeout;
        map.retain(|_, entry| {
            Arc::strong_count(&entry.session) > 1 || now.duration_since(entry.last_seen) < idle_timeout
        });
        map
    }

    /// The caller's existing session, if its cookie names a live one. Never
    /// creates a session.
    pub fn lookup(&self, headers: &HeaderMap) -> Option<Arc<Session>> {
        let id = session_id_from(headers)?;
        let mut map = self.entries();
        let entry = map.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Finds the caller's session from its cookie, creating one if needed.
    /// The flag is true when the session was just created.
    pub fn resolve(&self, headers: &HeaderMap) -> (Arc<Session>, bool) {
        if let Some(session) = self.lookup(headers) {
            return (session, false);
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Session::new(id));
        self.entries().insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("Created session {}", id);
        (session, true)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }
}

pub fn session_id_from(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use mediagrab_core::core::metadata::normalize;

    fn sample_result() -> DownloadResult {
        DownloadResult {
            file_name: "clip.mp4".into(),
            bytes: vec![1u8, 2, 3].into(),
            mime_type: "video/mp4",
        }
    }

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn reads_session_cookie_among_others() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("theme=dark; {}={}; lang=he", SESSION_COOKIE, id));
        assert_eq!(session_id_from(&headers), Some(id));
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        let headers = headers_with_cookie(&format!("{}=not-a-uuid", SESSION_COOKIE));
        assert_eq!(session_id_from(&headers), None);
    }

    #[test]
    fn resolve_reuses_known_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (first, created) = store.resolve(&HeaderMap::new());
        assert!(created);

        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, first.id()));
        let (second, created) = store.resolve(&headers);
        assert!(!created);
        assert_eq!(first.id(), second.id());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_cookie_gets_fresh_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, Uuid::new_v4()));
        let (_, created) = store.resolve(&headers);
        assert!(created);
    }

    #[test]
    fn idle_sessions_are_evicted() {
        let store = SessionStore::new(Duration::ZERO);
        let id = store.resolve(&HeaderMap::new()).0.id();

        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, id));
        let (session, created) = store.resolve(&headers);
        assert!(created);
        assert_ne!(session.id(), id);
    }

    #[test]
    fn sessions_in_use_survive_eviction() {
        let store = SessionStore::new(Duration::ZERO);
        let (held, _) = store.resolve(&HeaderMap::new());

        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, held.id()));
        let (again, created) = store.resolve(&headers);
        assert!(!created);
        assert_eq!(again.id(), held.id());
    }

    #[test]
    fn cookie_attributes() {
        let id = Uuid::nil();
        assert_eq!(
            session_cookie(id),
            "mediagrab_session=00000000-0000-0000-0000-000000000000; Path=/; HttpOnly; SameSite=Lax"
        );
    }

    #[tokio::test]
    async fn single_flight_per_action() {
        let session = Session::new(Uuid::new_v4());
        let guard = session.try_begin(Action::Download).unwrap();
        assert!(session.try_begin(Action::Download).is_none());
        assert!(session.try_begin(Action::Analyze).is_some());
        drop(guard);
        assert!(session.try_begin(Action::Download).is_some());
    }

    #[tokio::test]
    async fn new_analysis_replaces_metadata_and_clears_file() {
        let session = Session::new(Uuid::new_v4());
        let first = normalize(&serde_json::json!({ "title": "first" }), "https://youtu.be/a");
        let second = normalize(&serde_json::json!({ "title": "second" }), "https://youtu.be/b");

        let first = session.store_metadata(first).await;
        assert!(session.store_file(sample_result(), first.generation).await.is_some());
        assert!(session.state().await.file.is_some());

        session.store_metadata(second).await;
        let state = session.state().await;
        assert_eq!(state.analyzed.as_ref().unwrap().metadata.title, "second");
        assert!(state.file.is_none());
    }

    #[tokio::test]
    async fn file_for_replaced_analysis_is_dropped() {
        let session = Session::new(Uuid::new_v4());
        let first = session
            .store_metadata(normalize(&serde_json::json!({ "title": "A" }), "https://youtu.be/AAA"))
            .await;
        session
            .store_metadata(normalize(&serde_json::json!({ "title": "B" }), "https://youtu.be/BBB"))
            .await;

        assert!(session.store_file(sample_result(), first.generation).await.is_none());
        let state = session.state().await;
        assert!(state.file.is_none());
        assert_eq!(state.analyzed.as_ref().unwrap().metadata.title, "B");
    }

    #[test]
    fn lookup_never_creates() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.lookup(&HeaderMap::new()).is_none());

        let headers = headers_with_cookie(&format!("{}={}", SESSION_COOKIE, Uuid::new_v4()));
        assert!(store.lookup(&headers).is_none());
        assert_eq!(store.len(), 0);
    }
}
