//! In-memory conversation store.
//!
//! Maps a session id to a bounded, insertion-ordered history of exchanges.
//! Histories are capped per session (oldest dropped first) and whole
//! sessions are evicted least-recently-used once the session capacity is
//! reached. Nothing here is persisted; a restart forgets every session.

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use vani_common::config::ConversationConfig;

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_question: String,
    pub assistant_response: String,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    /// Create an exchange stamped with the current time.
    pub fn new(user_question: impl Into<String>, assistant_response: impl Into<String>) -> Self {
        Self::at(user_question, assistant_response, Utc::now())
    }

    /// Create an exchange with an explicit timestamp.
    pub fn at(
        user_question: impl Into<String>,
        assistant_response: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_question: user_question.into(),
            assistant_response: assistant_response.into(),
            timestamp,
        }
    }
}

/// Limits applied by [`ConversationStore`].
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    /// Maximum exchanges kept per session.
    pub history_cap: NonZeroUsize,
    /// Maximum number of sessions kept before LRU eviction.
    pub max_sessions: NonZeroUsize,
}

impl StoreLimits {
    /// Build limits from config, clamping zero values to one.
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            history_cap: NonZeroUsize::new(config.history_cap).unwrap_or(NonZeroUsize::MIN),
            max_sessions: NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default())
    }
}

/// Session-keyed exchange history.
///
/// All operations take one short-lived lock over the session map and never
/// hold it across an `.await`, so concurrent appends to the same session
/// are applied one after another and never interleave.
pub struct ConversationStore {
    sessions: Mutex<LruCache<String, VecDeque<Exchange>>>,
    history_cap: usize,
}

impl ConversationStore {
    /// Create an empty store.
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            sessions: Mutex::new(LruCache::new(limits.max_sessions)),
            history_cap: limits.history_cap.get(),
        }
    }

    /// Create an empty store sized from config.
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(StoreLimits::from_config(config))
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, VecDeque<Exchange>>> {
        // Every mutation completes before the guard drops, so a poisoned
        // map is still consistent.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The last `max_exchanges` exchanges for a session, oldest first.
    ///
    /// Unknown sessions yield an empty list.
    pub fn get_recent(&self, session_id: &str, max_exchanges: usize) -> Vec<Exchange> {
        let mut sessions = self.lock();
        let Some(history) = sessions.get(session_id) else {
            return Vec::new();
        };

        let skip = history.len().saturating_sub(max_exchanges);
        history.iter().skip(skip).cloned().collect()
    }

    /// Append an exchange, creating the session if needed and dropping the
    /// oldest exchanges beyond the cap.
    pub fn append(&self, session_id: &str, exchange: Exchange) {
        let mut sessions = self.lock();

        if let Some(history) = sessions.get_mut(session_id) {
            history.push_back(exchange);
            while history.len() > self.history_cap {
                history.pop_front();
            }
            return;
        }

        let mut history = VecDeque::with_capacity(self.history_cap.min(32));
        history.push_back(exchange);
        if let Some((evicted, _)) = sessions.push(session_id.to_string(), history) {
            tracing::debug!(session_id = %evicted, "Evicted least recently used session");
        }
    }

    /// Number of exchanges stored for a session.
    pub fn history_len(&self, session_id: &str) -> usize {
        self.lock().peek(session_id).map_or(0, VecDeque::len)
    }

    /// Drop a session's history. Returns whether it existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.lock().pop(session_id).is_some()
    }

    /// Number of sessions currently held.
    pub fn session_count(&self) -> usize {
        self.lock().len()
    }

    /// Maximum exchanges kept per session.
    pub fn history_cap(&self) -> usize {
        self.history_cap
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}
