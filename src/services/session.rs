use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

/// Hidden items kept per viewer before the oldest are forgotten
pub const DEFAULT_MAX_HIDDEN: usize = 500;

/// Idle time after which a viewer's session is dropped
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct ViewerSession {
    /// Oldest first
    hidden: VecDeque<Uuid>,
    last_seen: Instant,
}

/// Per-viewer state that lives only as long as the session
///
/// Holds the items each viewer hid. Hidden items are excluded from that
/// viewer's later feeds but never written to the shared store. Each viewer
/// keeps at most `max_hidden` items, and a session idle for `ttl` is dropped.
#[derive(Clone)]
pub struct ViewerSessions {
    sessions: Arc<RwLock<HashMap<Uuid, ViewerSession>>>,
    max_hidden: usize,
    ttl: Duration,
}

impl Default for ViewerSessions {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_HIDDEN, DEFAULT_SESSION_TTL)
    }
}

impl ViewerSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(max_hidden: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_hidden,
            ttl,
        }
    }

    /// Hides an item for a viewer. Returns true if it was not hidden yet.
    pub async fn hide(&self, viewer_id: Uuid, content_id: Uuid) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, session| !self.is_expired(session, now));

        let session = sessions.entry(viewer_id).or_insert_with(|| ViewerSession {
            hidden: VecDeque::new(),
            last_seen: now,
        });
        session.last_seen = now;

        if session.hidden.contains(&content_id) {
            return false;
        }

        session.hidden.push_back(content_id);
        while session.hidden.len() > self.max_hidden {
            session.hidden.pop_front();
        }
        true
    }

    /// Items the viewer has hidden, oldest first
    pub async fn hidden_for(&self, viewer_id: Uuid) -> Vec<Uuid> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get_mut(&viewer_id) else {
            return Vec::new();
        };
        if self.is_expired(session, now) {
            sessions.remove(&viewer_id);
            return Vec::new();
        }

        session.last_seen = now;
        session.hidden.iter().copied().collect()
    }

    /// Caller-supplied exclusions plus the viewer's hidden items
    pub async fn exclusions(&self, viewer_id: Option<Uuid>, requested: &[Uuid]) -> Vec<Uuid> {
        let mut exclude = requested.to_vec();
        if let Some(viewer_id) = viewer_id {
            for id in self.hidden_for(viewer_id).await {
                if !exclude.contains(&id) {
                    exclude.push(id);
                }
            }
        }
        exclude
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, session: &ViewerSession, now: Instant) -> bool {
        now.saturating_duration_since(session.last_seen) >= self.ttl
    }
}
