//! Session-scoped conversational memory
//!
//! Holds per-conversation message history in memory, bounded to the last
//! five messages per session and keyed by an opaque UUID. Sessions are
//! process-lifetime state: nothing is persisted across restarts, which is
//! an intentional ephemeral-cache design. If durability were ever needed,
//! this interface stays unchanged while the backing map is swapped for a
//! persistent key-value layer.
//!
//! Expiry is a lazily-evaluated predicate on `last_activity`, used only
//! for reporting: the store never deletes a session on timeout alone.
//! Removal happens through `delete_session` or `cleanup_older_than`.
//!
//! Every operation takes the single session-table lock, so read-modify-
//! write races on message trimming or expiry checks are not observable.
//! All operations are fast in-memory work; nothing suspends while the
//! lock is held.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use uuid::Uuid;

/// Maximum messages retained per session
///
/// Sized for generation-context limits, not user-configurable per call.
pub const MAX_MESSAGES_PER_SESSION: usize = 5;

/// Default inactivity window after which a session is reported inactive
pub const DEFAULT_SESSION_TIMEOUT_HOURS: i64 = 24;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message written by the end user
    User,
    /// Message produced by the assistant
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation turn, immutable once appended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
    /// Free-form per-message metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Externally visible snapshot of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Opaque session handle
    pub session_id: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the most recent append (or creation)
    pub last_activity: DateTime<Utc>,
    /// Number of retained messages
    pub message_count: usize,
    /// Whether the session is within the activity timeout
    pub is_active: bool,
}

/// Aggregate statistics over the whole store
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Total sessions held in memory
    pub total_sessions: usize,
    /// Sessions within the activity timeout
    pub active_sessions: usize,
    /// Sum of retained messages across all sessions
    pub total_messages: usize,
    /// The fixed per-session message cap
    pub max_messages_per_session: usize,
}

/// One session's state; owned exclusively by the store
#[derive(Debug)]
struct Session {
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    messages: VecDeque<Message>,
}

/// Bounded, expiring, concurrently-accessed short-term history per
/// conversation
///
/// # Examples
///
/// ```
/// use kbchat::session::{Role, SessionStore};
///
/// let store = SessionStore::new();
/// let id = store.create_session();
/// assert!(store.append(id, Role::User, "Hello", Default::default()));
/// assert_eq!(store.history(id, None).len(), 1);
/// ```
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
    session_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a store with the default 24h activity timeout
    pub fn new() -> Self {
        Self::with_timeout(Duration::hours(DEFAULT_SESSION_TIMEOUT_HOURS))
    }

    /// Create a store with a custom activity timeout
    ///
    /// The timeout only affects the `is_active` predicate reported by
    /// `list_sessions`, `session_info`, and `stats`; it never triggers
    /// deletion by itself.
    pub fn with_timeout(session_timeout: Duration) -> Self {
        tracing::info!(
            "Session store initialized (cap {}, timeout {}h)",
            MAX_MESSAGES_PER_SESSION,
            session_timeout.num_hours()
        );
        Self {
            sessions: Mutex::new(HashMap::new()),
            session_timeout,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Session>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a new session and return its id
    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.lock().insert(
            id,
            Session {
                created_at: now,
                last_activity: now,
                messages: VecDeque::new(),
            },
        );
        tracing::info!("Created chat session {}", id);
        id
    }

    /// Append a message to a session
    ///
    /// Returns `false` when the session is unknown, leaving the store
    /// untouched. Otherwise appends, refreshes `last_activity`, and trims
    /// the oldest messages until the cap holds. An expired-but-present
    /// session is still appendable.
    pub fn append(
        &self,
        session_id: Uuid,
        role: Role,
        content: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> bool {
        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(&session_id) else {
            tracing::warn!("Append to unknown session {}", session_id);
            return false;
        };

        let now = Utc::now();
        session.messages.push_back(Message {
            role,
            content: content.into(),
            timestamp: now,
            metadata,
        });
        session.last_activity = now;

        while session.messages.len() > MAX_MESSAGES_PER_SESSION {
            session.messages.pop_front();
        }

        tracing::debug!(
            "Appended {} message to session {} (retained {})",
            role,
            session_id,
            session.messages.len()
        );
        true
    }

    /// Return the most recent messages of a session in chronological order
    ///
    /// Unknown sessions yield an empty vector. `limit` defaults to the
    /// per-session cap.
    pub fn history(&self, session_id: Uuid, limit: Option<usize>) -> Vec<Message> {
        let sessions = self.lock();
        let Some(session) = sessions.get(&session_id) else {
            tracing::warn!("History requested for unknown session {}", session_id);
            return Vec::new();
        };

        let limit = limit.unwrap_or(MAX_MESSAGES_PER_SESSION);
        let skip = session.messages.len().saturating_sub(limit);
        session.messages.iter().skip(skip).cloned().collect()
    }

    /// Snapshot a single session, if present
    pub fn session_info(&self, session_id: Uuid) -> Option<SessionSummary> {
        let sessions = self.lock();
        let now = Utc::now();
        sessions
            .get(&session_id)
            .map(|s| self.summarize(session_id, s, now))
    }

    /// List sessions sorted by `last_activity`, most recent first
    pub fn list_sessions(&self, limit: usize) -> Vec<SessionSummary> {
        let sessions = self.lock();
        let now = Utc::now();
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, s)| self.summarize(*id, s, now))
            .collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        summaries.truncate(limit);
        summaries
    }

    /// Delete a session; returns `false` when it was absent
    pub fn delete_session(&self, session_id: Uuid) -> bool {
        let removed = self.lock().remove(&session_id).is_some();
        if removed {
            tracing::info!("Deleted session {}", session_id);
        } else {
            tracing::warn!("Delete requested for unknown session {}", session_id);
        }
        removed
    }

    /// Remove every session inactive for longer than `retention`
    ///
    /// Returns the number of sessions removed. Independent of the activity
    /// timeout used for `is_active` reporting.
    pub fn cleanup_older_than(&self, retention: Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_activity >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!("Cleaned up {} old sessions", removed);
        }
        removed
    }

    /// Aggregate statistics about the store
    pub fn stats(&self) -> MemoryStats {
        let sessions = self.lock();
        let now = Utc::now();
        let total_sessions = sessions.len();
        let total_messages = sessions.values().map(|s| s.messages.len()).sum();
        let active_sessions = sessions
            .values()
            .filter(|s| self.is_active(s, now))
            .count();

        MemoryStats {
            total_sessions,
            active_sessions,
            total_messages,
            max_messages_per_session: MAX_MESSAGES_PER_SESSION,
        }
    }

    fn is_active(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_activity <= self.session_timeout
    }

    fn summarize(&self, id: Uuid, session: &Session, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            session_id: id,
            created_at: session.created_at,
            last_activity: session.last_activity,
            message_count: session.messages.len(),
            is_active: self.is_active(session, now),
        }
    }
}
