use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelscope_common::{ReelscopeError, SessionId};

use crate::gateway::{with_timeout, Dialogue, GatewayError, ModelGateway, Turn};
use crate::media::MediaPayload;

/// Conversation state behind one session id.
#[derive(Clone, Debug)]
pub struct Session {
    pub id: SessionId,
    pub dialogue: Dialogue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(SessionId),
}

impl From<SessionError> for ReelscopeError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(id) => ReelscopeError::SessionNotFound(id.to_string()),
        }
    }
}

/// Failure of a follow-up turn run inside the store.
#[derive(Debug, thiserror::Error)]
pub enum FollowUpError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

type SessionSlot = Arc<tokio::sync::Mutex<Session>>;

/// In-memory map of follow-up sessions.
///
/// The map lock is only held to look up or insert a slot, never across an
/// `.await`. Each session has its own async lock, so follow-ups on different
/// ids run independently and follow-ups on the same id are serialized.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionSlot>>,
    capacity: Option<usize>,
}

impl SessionStore {
    /// Unbounded store: sessions live until removed or the process exits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounded store: creating a session beyond `capacity` evicts the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: Some(capacity.max(1)),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Store a session seeded with one exchange. An existing entry with the
    /// same id is replaced.
    pub fn create(
        &self,
        id: SessionId,
        media: MediaPayload,
        seed_prompt: &str,
        seed_response: &str,
    ) {
        let session = Session {
            id: id.clone(),
            dialogue: Dialogue::start(media, seed_prompt, seed_response),
            created_at: Utc::now(),
        };

        let mut sessions = self.write_map();

        if let Some(capacity) = self.capacity {
            while sessions.len() >= capacity && !sessions.contains_key(&id) {
                if !evict_oldest(&mut sessions) {
                    break;
                }
            }
        }

        if sessions
            .insert(id.clone(), Arc::new(tokio::sync::Mutex::new(session)))
            .is_some()
        {
            tracing::warn!(session_id = %id, "Session id collision, replaced existing session");
        }

        metrics::counter!("sessions.created").increment(1);
        tracing::debug!(session_id = %id, sessions = sessions.len(), "Session created");
    }

    /// Snapshot of a session.
    pub async fn get(&self, id: &SessionId) -> Result<Session, SessionError> {
        let slot = self.slot(id)?;
        let session = slot.lock().await;
        Ok(session.clone())
    }

    /// The session's turns, seed exchange first.
    pub async fn history(&self, id: &SessionId) -> Result<Vec<Turn>, SessionError> {
        let slot = self.slot(id)?;
        let session = slot.lock().await;
        Ok(session.dialogue.turns().to_vec())
    }

    /// Record a completed (question, answer) pair.
    pub async fn append_exchange(
        &self,
        id: &SessionId,
        question: &str,
        answer: &str,
    ) -> Result<(), SessionError> {
        let slot = self.slot(id)?;
        slot.lock().await.dialogue.record_exchange(question, answer);
        Ok(())
    }

    /// Ask a follow-up with the session's full history and record the
    /// exchange on success. A failed or timed-out call records nothing.
    ///
    /// The session stays locked for the whole call, so a second question on
    /// the same id waits for this answer to be recorded first.
    pub async fn follow_up(
        &self,
        id: &SessionId,
        gateway: &dyn ModelGateway,
        question: &str,
        budget: Duration,
    ) -> Result<String, FollowUpError> {
        let slot = self.slot(id)?;
        let mut session = slot.lock().await;

        let answer = with_timeout(budget, session.dialogue.ask(gateway, question)).await?;
        session.dialogue.record_exchange(question, answer.clone());
        Ok(answer)
    }

    pub fn remove(&self, id: &SessionId) -> bool {
        self.write_map().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.read_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.read_map().contains_key(id)
    }

    fn slot(&self, id: &SessionId) -> Result<SessionSlot, SessionError> {
        self.read_map()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    // Map writes are single inserts/removes, so a poisoned map is still whole.
    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, HashMap<SessionId, SessionSlot>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_map(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<SessionId, SessionSlot>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Evict the session created first. Sessions busy with a follow-up are
/// skipped. Returns whether anything was evicted.
fn evict_oldest(sessions: &mut HashMap<SessionId, SessionSlot>) -> bool {
    let oldest = sessions
        .iter()
        .filter_map(|(id, slot)| {
            slot.try_lock()
                .ok()
                .map(|session| (id.clone(), session.created_at))
        })
        .min_by_key(|(_, created_at)| *created_at)
        .map(|(id, _)| id);

    match oldest {
        Some(id) => {
            sessions.remove(&id);
            metrics::counter!("sessions.evicted").increment(1);
            tracing::info!(session_id = %id, "Evicted oldest session");
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
