//! Session registry owned by the transport adapter

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::engine::Session;
use crate::types::SessionStatus;

use super::error::{HubError, HubResult};

/// Shared handle to one session's engine state
pub type SessionHandle = Arc<AsyncMutex<Session>>;

#[derive(Default)]
struct SessionEntry {
    status: SessionStatus,
    /// A turn or reset is in flight
    busy: bool,
    session: Option<SessionHandle>,
}

/// Status and engine state per session id
///
/// Every check-and-set happens under one lock so two events for the same
/// session can never both pass a gate.
#[derive(Default)]
pub struct SessionStore {
    entries: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; returns false if it already existed
    pub fn open(&self, session_id: &str) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(session_id) {
            return false;
        }
        entries.insert(session_id.to_string(), SessionEntry::default());
        true
    }

    /// Forget a session, handing back its engine state for teardown
    pub fn remove(&self, session_id: &str) -> Option<SessionHandle> {
        self.entries
            .lock()
            .remove(session_id)
            .and_then(|entry| entry.session)
    }

    /// Remove every session
    pub fn drain(&self) -> Vec<(String, SessionHandle)> {
        self.entries
            .lock()
            .drain()
            .filter_map(|(id, entry)| entry.session.map(|s| (id, s)))
            .collect()
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.entries.lock().contains_key(session_id)
    }

    pub fn status(&self, session_id: &str) -> Option<SessionStatus> {
        self.entries.lock().get(session_id).map(|e| e.status)
    }

    pub fn is_busy(&self, session_id: &str) -> bool {
        self.entries
            .lock()
            .get(session_id)
            .map(|e| e.busy)
            .unwrap_or(false)
    }

    /// Set the status; no-op for unknown sessions
    pub fn set_status(&self, session_id: &str, status: SessionStatus) {
        if let Some(entry) = self.entries.lock().get_mut(session_id) {
            entry.status = status;
        }
    }

    /// Gate and enter `initializing`
    ///
    /// Reuses the existing engine state if there is one, otherwise installs
    /// the one built by `create`.
    pub fn begin_initialize(
        &self,
        session_id: &str,
        create: impl FnOnce() -> Session,
    ) -> HubResult<SessionHandle> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(session_id)
            .ok_or_else(|| HubError::UnknownSession(session_id.to_string()))?;

        if entry.status == SessionStatus::Initializing {
            return Err(HubError::AlreadyInitializing);
        }
        if entry.busy {
            return Err(HubError::Busy);
        }

        let session = entry
            .session
            .get_or_insert_with(|| Arc::new(AsyncMutex::new(create())))
            .clone();
        entry.status = SessionStatus::Initializing;
        Ok(session)
    }

    /// Gate and mark a turn in flight; requires `connected`
    pub fn begin_turn(&self, session_id: &str) -> HubResult<SessionHandle> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(session_id)
            .ok_or_else(|| HubError::UnknownSession(session_id.to_string()))?;

        let session = match (&entry.status, &entry.session) {
            (SessionStatus::Connected, Some(session)) => session.clone(),
            _ => return Err(HubError::NotConnected),
        };
        if entry.busy {
            return Err(HubError::Busy);
        }
        entry.busy = true;
        Ok(session)
    }

    /// Clear the in-flight mark set by [`begin_turn`](Self::begin_turn)
    ///
    /// Only the turn that holds the registered engine state may clear it; a
    /// turn left over from an earlier connection under the same id returns
    /// false and leaves the newer session alone.
    pub fn end_turn(&self, session_id: &str, session: &SessionHandle) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(session_id) {
            Some(entry) if entry.session.as_ref().is_some_and(|s| Arc::ptr_eq(s, session)) => {
                entry.busy = false;
                true
            }
            _ => false,
        }
    }

    /// Whether `session` is still the engine state registered under `session_id`
    pub fn is_current(&self, session_id: &str, session: &SessionHandle) -> bool {
        self.entries
            .lock()
            .get(session_id)
            .and_then(|e| e.session.as_ref())
            .map(|s| Arc::ptr_eq(s, session))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
