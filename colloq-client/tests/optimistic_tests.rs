use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::oneshot;
use uuid::Uuid;

use colloq_client::{AnswerBackend, EntryState, OptimisticQuestions, SubmitOutcome};
use colloq_core::error::{ColloqError, Result};
use colloq_core::model::Question;

/// Replies keyed by question text; each reply waits for its gate before
/// resolving, so tests control reconciliation order exactly.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<HashMap<String, (oneshot::Receiver<()>, Result<Question>)>>,
}

impl ScriptedBackend {
    fn script(&self, question: &str, result: Result<Question>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().insert(question.to_string(), (rx, result));
        tx
    }
}

#[async_trait]
impl AnswerBackend for ScriptedBackend {
    async fn ask(&self, _room_id: Uuid, question: &str) -> Result<Question> {
        let (gate, result) = {
            let mut replies = self.replies.lock().unwrap();
            replies.remove(question).expect("unscripted question")
        };
        let _ = gate.await;
        result
    }
}

fn persisted(room_id: Uuid, text: &str, answer: Option<&str>) -> Question {
    Question {
        id: Uuid::new_v4(),
        room_id,
        question: text.to_string(),
        answer: answer.map(str::to_string),
        created_at: Utc::now(),
    }
}

fn submission_failure() -> ColloqError {
    ColloqError::ExternalService {
        provider: "colloq-server".to_string(),
        message: "connection refused".to_string(),
    }
}

#[tokio::test]
async fn submitted_question_is_visible_before_the_server_answers() {
    let backend = Arc::new(ScriptedBackend::default());
    let cache = OptimisticQuestions::new(backend.clone());
    let room_id = Uuid::new_v4();

    let gate = backend.script(
        "What was decided?",
        Ok(persisted(room_id, "What was decided?", Some("Budget approved."))),
    );

    let handle = cache.submit(room_id, "What was decided?");

    let entries = cache.questions(room_id);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, handle.local_id);
    assert_eq!(entries[0].question, "What was decided?");
    assert_eq!(entries[0].state, EntryState::Pending);
    assert!(entries[0].answer.is_none());

    gate.send(()).unwrap();
    let outcome = handle.outcome.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Confirmed(_)));

    let entries = cache.questions(room_id);
    assert_eq!(entries[0].answer.as_deref(), Some("Budget approved."));
    assert_eq!(entries[0].state, EntryState::Confirmed);
}

#[tokio::test]
async fn confirmation_updates_the_entry_in_place() {
    let backend = Arc::new(ScriptedBackend::default());
    let cache = OptimisticQuestions::new(backend.clone());
    let room_id = Uuid::new_v4();

    cache.prime(
        room_id,
        vec![
            persisted(room_id, "Who is presenting?", Some("Dana.")),
            persisted(room_id, "When do we ship?", None),
        ],
    );
    let before = cache.questions(room_id);

    let gate = backend.script(
        "What was decided?",
        Ok(persisted(room_id, "What was decided?", Some("Budget approved."))),
    );
    let handle = cache.submit(room_id, "What was decided?");
    gate.send(()).unwrap();
    let outcome = handle.outcome.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Confirmed(_)));

    let after = cache.questions(room_id);
    assert_eq!(after.len(), 3);
    assert_eq!(after[0].id, handle.local_id);
    assert_eq!(after[0].answer.as_deref(), Some("Budget approved."));
    assert_eq!(after[0].state, EntryState::Confirmed);
    // The primed entries are untouched, in their original order.
    assert_eq!(&after[1..], &before[..]);
}

#[tokio::test]
async fn failure_restores_the_pre_submission_snapshot() {
    let backend = Arc::new(ScriptedBackend::default());
    let cache = OptimisticQuestions::new(backend.clone());
    let room_id = Uuid::new_v4();

    cache.prime(
        room_id,
        vec![
            persisted(room_id, "Who is presenting?", Some("Dana.")),
            persisted(room_id, "When do we ship?", None),
        ],
    );
    let before = cache.questions(room_id);

    let gate = backend.script("Will this fail?", Err(submission_failure()));
    let handle = cache.submit(room_id, "Will this fail?");
    assert_eq!(cache.questions(room_id).len(), 3);

    gate.send(()).unwrap();
    let outcome = handle.outcome.await.unwrap();
    assert_eq!(outcome, SubmitOutcome::RolledBack);

    assert_eq!(cache.questions(room_id), before);
}

#[tokio::test]
async fn confirmed_null_answer_stays_null() {
    let backend = Arc::new(ScriptedBackend::default());
    let cache = OptimisticQuestions::new(backend.clone());
    let room_id = Uuid::new_v4();

    let gate =
        backend.script("Anything relevant?", Ok(persisted(room_id, "Anything relevant?", None)));
    let handle = cache.submit(room_id, "Anything relevant?");
    gate.send(()).unwrap();

    let outcome = handle.outcome.await.unwrap();
    match outcome {
        SubmitOutcome::Confirmed(question) => assert!(question.answer.is_none()),
        SubmitOutcome::RolledBack => panic!("submission should confirm"),
    }

    let entries = cache.questions(room_id);
    assert!(entries[0].answer.is_none());
    assert_eq!(entries[0].state, EntryState::Confirmed);
}

// Two submissions in flight: the first one's rollback restores a snapshot
// that predates the second insert, so the second entry disappears from the
// list even though its own submission later confirms.
#[tokio::test]
async fn rollback_drops_entries_submitted_after_the_failed_one() {
    let backend = Arc::new(ScriptedBackend::default());
    let cache = OptimisticQuestions::new(backend.clone());
    let room_id = Uuid::new_v4();

    let gate_a = backend.script("question a", Err(submission_failure()));
    let gate_b =
        backend.script("question b", Ok(persisted(room_id, "question b", Some("answer b"))));

    let a = cache.submit(room_id, "question a");
    let b = cache.submit(room_id, "question b");
    assert_eq!(cache.questions(room_id).len(), 2);

    gate_a.send(()).unwrap();
    assert_eq!(a.outcome.await.unwrap(), SubmitOutcome::RolledBack);
    assert!(cache.questions(room_id).is_empty());

    gate_b.send(()).unwrap();
    let outcome = b.outcome.await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Confirmed(_)));
    assert!(cache.questions(room_id).is_empty());
}
