/*!
 * Session storage.
 *
 * Sessions are volatile and live for the lifetime of the process. The
 * `SessionStore` trait keeps the conversation logic independent of the storage
 * so tests can inject their own store.
 */

use std::collections::HashMap;
use std::fmt::Debug;

use parking_lot::RwLock;

use super::models::{ChatId, Session};

/// Key-value access to sessions by conversation identifier.
///
/// Implementations must be safe to share across tasks; operations on one key
/// never affect another.
pub trait SessionStore: Send + Sync + Debug {
    /// Snapshot of the session for `chat`
    fn get(&self, chat: ChatId) -> Option<Session>;

    /// Insert or replace the session for `chat`
    fn set(&self, chat: ChatId, session: Session);

    /// Remove and return the session for `chat`
    fn delete(&self, chat: ChatId) -> Option<Session>;

    /// Mutate the session for `chat` in place. Returns `false` if there is none.
    fn update(&self, chat: ChatId, apply: &mut dyn FnMut(&mut Session)) -> bool;

    /// Whether a session exists for `chat`
    fn contains(&self, chat: ChatId) -> bool {
        self.get(chat).is_some()
    }
}

/// Process-lifetime session store backed by a locked hash map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, chat: ChatId) -> Option<Session> {
        self.sessions.read().get(&chat).cloned()
    }

    fn set(&self, chat: ChatId, session: Session) {
        self.sessions.write().insert(chat, session);
    }

    fn delete(&self, chat: ChatId) -> Option<Session> {
        self.sessions.write().remove(&chat)
    }

    fn update(&self, chat: ChatId, apply: &mut dyn FnMut(&mut Session)) -> bool {
        match self.sessions.write().get_mut(&chat) {
            Some(session) => {
                apply(session);
                true
            }
            None => false,
        }
    }

    fn contains(&self, chat: ChatId) -> bool {
        self.sessions.read().contains_key(&chat)
    }
}
