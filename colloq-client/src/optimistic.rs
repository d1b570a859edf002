//! Optimistic per-room question lists.
//!
//! [`OptimisticQuestions`] shows a submitted question immediately: `submit`
//! inserts a pending entry at the front of the room's list before the network
//! call starts, then reconciles the entry in place once the server answers,
//! or restores the pre-submission snapshot on failure.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use colloq_core::error::Result;
use colloq_core::model::Question;

/// The answering operation the cache reconciles against.
///
/// Implemented by [`ColloqApi`](crate::ColloqApi) over HTTP and by fakes in
/// tests.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Submit a question to a room and return the persisted result.
    async fn ask(&self, room_id: Uuid, question: &str) -> Result<Question>;
}

/// Reconciliation state of one local entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Inserted locally; the server has not answered yet.
    Pending,
    /// The server answered; `answer` holds the authoritative value.
    Confirmed,
}

/// One question as the client displays it.
///
/// Entries keep their locally generated identifier across confirmation; only
/// `answer` and `state` change on reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEntry {
    /// Locally generated identifier (server identifier for primed entries).
    pub id: Uuid,
    /// The question text as submitted.
    pub question: String,
    /// The answer, once confirmed (possibly still `None` after confirmation).
    pub answer: Option<String>,
    /// Local creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Reconciliation state.
    pub state: EntryState,
}

impl QuestionEntry {
    fn pending(question: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            question,
            answer: None,
            created_at: Utc::now(),
            state: EntryState::Pending,
        }
    }

    fn confirmed(question: Question) -> Self {
        Self {
            id: question.id,
            question: question.question,
            answer: question.answer,
            created_at: question.created_at,
            state: EntryState::Confirmed,
        }
    }
}

/// How one submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The server persisted the question; the local entry was updated in
    /// place.
    Confirmed(Question),
    /// The submission failed; the room list was restored to its
    /// pre-submission snapshot.
    RolledBack,
}

/// Handle returned by [`OptimisticQuestions::submit`].
pub struct SubmitHandle {
    /// Identifier of the locally inserted entry.
    pub local_id: Uuid,
    /// Resolves once reconciliation (or rollback) has been applied.
    pub outcome: JoinHandle<SubmitOutcome>,
}

/// Per-room question lists with optimistic submission.
///
/// Cheap to clone; clones share the same lists. All list reads and writes go
/// through one `std::sync::RwLock`, so no mutation ever awaits.
#[derive(Clone)]
pub struct OptimisticQuestions {
    rooms: Arc<RwLock<HashMap<Uuid, Vec<QuestionEntry>>>>,
    backend: Arc<dyn AnswerBackend>,
}

impl OptimisticQuestions {
    /// Create a cache that reconciles through the given backend.
    pub fn new(backend: Arc<dyn AnswerBackend>) -> Self {
        Self { rooms: Arc::new(RwLock::new(HashMap::new())), backend }
    }

    /// Seed a room's list from a server fetch.
    ///
    /// Replaces any existing local entries for the room with confirmed
    /// entries in the given order.
    pub fn prime(&self, room_id: Uuid, questions: Vec<Question>) {
        let entries = questions.into_iter().map(QuestionEntry::confirmed).collect();
        self.write().insert(room_id, entries);
    }

    /// Return a room's entries, newest first. Unknown rooms yield an empty
    /// list.
    pub fn questions(&self, room_id: Uuid) -> Vec<QuestionEntry> {
        self.read().get(&room_id).cloned().unwrap_or_default()
    }

    /// Submit a question to a room.
    ///
    /// Synchronously inserts a pending entry at the front of the room's list
    /// (visible to [`questions`](OptimisticQuestions::questions) before the
    /// network call resolves), then reconciles on a spawned task:
    ///
    /// - success: the entry matching the local identifier gets the server's
    ///   answer and turns `Confirmed`, in place
    /// - failure: the room list is restored to the snapshot taken before this
    ///   insert; entries submitted after this one are dropped by that
    ///   rollback
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, room_id: Uuid, question: impl Into<String>) -> SubmitHandle {
        let question = question.into();
        let entry = QuestionEntry::pending(question.clone());
        let local_id = entry.id;

        let snapshot = {
            let mut rooms = self.write();
            let list = rooms.entry(room_id).or_default();
            let snapshot = list.clone();
            list.insert(0, entry);
            snapshot
        };

        let cache = self.clone();
        let outcome = tokio::spawn(async move {
            match cache.backend.ask(room_id, &question).await {
                Ok(persisted) => {
                    cache.confirm(room_id, local_id, &persisted);
                    SubmitOutcome::Confirmed(persisted)
                }
                Err(e) => {
                    warn!(room_id = %room_id, error = %e, "question submission failed; rolling back");
                    cache.write().insert(room_id, snapshot);
                    SubmitOutcome::RolledBack
                }
            }
        });

        SubmitHandle { local_id, outcome }
    }

    fn confirm(&self, room_id: Uuid, local_id: Uuid, persisted: &Question) {
        let mut rooms = self.write();
        // The entry may already be gone if a concurrent rollback replaced the
        // list; confirmation is then a no-op.
        if let Some(entry) = rooms
            .get_mut(&room_id)
            .and_then(|list| list.iter_mut().find(|entry| entry.id == local_id))
        {
            entry.answer = persisted.answer.clone();
            entry.state = EntryState::Confirmed;
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Vec<QuestionEntry>>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Vec<QuestionEntry>>> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }
}
