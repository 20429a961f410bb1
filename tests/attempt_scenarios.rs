use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use examhall::{
    SyncMessage, UpdateMessage,
    backend::{MemoryBackend, QuestionStore, Receipt, ResultSink, Submission},
    config::Options,
    countdown::{self, Attempt, Command, Ending},
    error::{SessionError, StoreError, SubmissionError},
    quiz::{
        QuestionId, QuizId, UserId, answers::OptionLabel, options::RawQuestion,
        question::Question,
    },
    session::{Phase, QuizSession, SubmitOutcome, TickOutcome},
    tunnel::Tunnel,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn label(letter: &str) -> OptionLabel {
    letter.parse().unwrap()
}

fn five_questions() -> Vec<Question> {
    (1..=5)
        .map(|n| Question::new(format!("q{n}"), format!("Question {n}"), ["A", "B", "C", "D"]))
        .collect()
}

/// Result sink recording every call, delegating to a memory backend
#[derive(Clone, Default)]
struct RecordingSink {
    inner: MemoryBackend,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn submit_answers(&self, submission: &Submission) -> Result<Receipt, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.submit_answers(submission).await
    }
}

#[derive(Clone, Default)]
struct RecordingTunnel {
    updates: Arc<Mutex<Vec<UpdateMessage>>>,
    states: Arc<Mutex<Vec<SyncMessage>>>,
}

impl Tunnel for RecordingTunnel {
    fn send_message(&self, message: &UpdateMessage) {
        self.updates.lock().unwrap().push(message.clone());
    }

    fn send_state(&self, state: &SyncMessage) {
        self.states.lock().unwrap().push(state.clone());
    }

    fn close(self) {}
}

#[tokio::test]
async fn happy_path() {
    init_logger();
    let backend = MemoryBackend::default();
    backend.insert_quiz(QuizId::from("quiz1"), five_questions());
    let sink = RecordingSink {
        inner: backend.clone(),
        ..RecordingSink::default()
    };

    let mut session = QuizSession::new(UserId::from("CS23A001"));
    session
        .load(&backend, QuizId::from("quiz1"), 30)
        .await
        .unwrap();
    assert_eq!(session.phase(), Phase::InProgress);
    assert_eq!(session.remaining_seconds(), 1800);
    assert_eq!(session.cursor(), 0);

    session.set_answer(QuestionId::from("q1"), label("A"));
    session.set_cursor(4);
    let outcome = session.submit(&sink).await;

    assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    let submissions = backend.submissions();
    assert_eq!(submissions[0].answers.len(), 1);
    assert_eq!(
        submissions[0].answers.get(&QuestionId::from("q1")),
        Some(label("A"))
    );
}

#[tokio::test]
async fn timeout_auto_submit() {
    init_logger();
    let backend = MemoryBackend::default();
    backend.insert_quiz(QuizId::from("quiz2"), five_questions());
    let sink = RecordingSink {
        inner: backend.clone(),
        ..RecordingSink::default()
    };

    let mut session = QuizSession::new(UserId::from("CS23A002"));
    session
        .load(&backend, QuizId::from("quiz2"), 1)
        .await
        .unwrap();

    let mut outcomes = Vec::new();
    for _ in 0..60 {
        outcomes.push(session.tick(&sink).await);
    }

    assert!(matches!(outcomes.last(), Some(TickOutcome::Expired(_))));
    assert_ne!(session.phase(), Phase::InProgress);
    assert_eq!(session.phase(), Phase::Complete);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    assert!(backend.submissions()[0].answers.is_empty());

    session.submit(&sink).await;
    session.tick(&sink).await;
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn not_found() {
    init_logger();
    let backend = MemoryBackend::default();
    let mut session = QuizSession::new(UserId::from("CS23A003"));

    let result = session.load(&backend, QuizId::from("nonexistent"), 10).await;

    assert_eq!(
        result,
        Err(SessionError::NotFound(QuizId::from("nonexistent")))
    );
    assert_eq!(session.phase(), Phase::Error);
    assert_eq!(session.tick(&backend).await, TickOutcome::Idle);
    assert_eq!(session.remaining_seconds(), 0);
}

#[tokio::test]
async fn store_failure_is_not_a_not_found() {
    struct BrokenStore;

    #[async_trait]
    impl QuestionStore for BrokenStore {
        async fn fetch_questions(&self, _: &QuizId) -> Result<Vec<Question>, StoreError> {
            Err(StoreError::Backend("timeout".to_string()))
        }
    }

    init_logger();
    let mut session = QuizSession::new(UserId::from("CS23A004"));
    let result = session.load(&BrokenStore, QuizId::from("quiz1"), 10).await;

    assert_eq!(
        result,
        Err(SessionError::Store(StoreError::Backend("timeout".to_string())))
    );
    assert_eq!(session.phase(), Phase::Error);
}

#[tokio::test(start_paused = true)]
async fn driven_attempt_scores_raw_question_bank() {
    init_logger();
    let backend = MemoryBackend::default();
    let rows: Vec<RawQuestion> = serde_json::from_str(
        r#"[
            {"id": "q1", "question": "Capital of France?", "options": ["Paris", "London", "Berlin", "Madrid"], "correct_answer": "A"},
            {"id": "q2", "question": "LIFO structure?", "options": "Queue,Stack,Linked List,Tree", "correct_answer": "B"},
            {"id": "q3", "question": "Stable sort?", "options": {"A": "Merge Sort", "B": "Quick Sort", "C": "Heap Sort"}, "correct_answer": "A"}
        ]"#,
    )
    .unwrap();
    backend.insert_raw_quiz(QuizId::from("dsa"), rows).unwrap();

    let tunnel = RecordingTunnel::default();
    let attempt = Attempt::new(
        QuizSession::new(UserId::from("CS23A005")),
        backend.clone(),
        backend.clone(),
        tunnel.clone(),
        Options::default(),
    )
    .unwrap();
    let handle = countdown::spawn(attempt, QuizId::from("dsa"), 10);

    assert!(handle.send(Command::AnswerCurrent(label("A"))).await);
    assert!(handle.send(Command::Next).await);
    assert!(handle.send(Command::AnswerCurrent(label("C"))).await);
    assert!(handle.send(Command::Next).await);
    assert!(handle.send(Command::AnswerCurrent(label("A"))).await);
    assert!(handle.send(Command::Submit).await);

    let (session, ending) = handle.join().await.unwrap();

    assert_eq!(
        ending,
        Ending::Completed(Receipt {
            accepted: true,
            score: Some(2),
            total: 3
        })
    );
    assert_eq!(session.cursor(), 2);
    assert!(backend.has_submitted(&QuizId::from("dsa"), &UserId::from("CS23A005")));

    let states = tunnel.states.lock().unwrap();
    assert!(matches!(
        states.last(),
        Some(SyncMessage::Complete {
            receipt: Some(Receipt { score: Some(2), .. })
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn second_attempt_by_same_student_is_rejected() {
    init_logger();
    let backend = MemoryBackend::default();
    backend.insert_quiz(QuizId::from("quiz1"), five_questions());

    for expected_completed in [true, false] {
        let attempt = Attempt::new(
            QuizSession::new(UserId::from("CS23A006")),
            backend.clone(),
            backend.clone(),
            RecordingTunnel::default(),
            Options::default(),
        )
        .unwrap();
        let handle = countdown::spawn(attempt, QuizId::from("quiz1"), 5);
        handle.send(Command::Submit).await;
        let (session, ending) = handle.join().await.unwrap();

        assert_eq!(matches!(ending, Ending::Completed(_)), expected_completed);
        if !expected_completed {
            assert_eq!(session.phase(), Phase::Error);
            assert!(session.error_message().unwrap().contains("already submitted"));
        }
    }
    assert_eq!(backend.submissions().len(), 1);
}
