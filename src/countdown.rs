//! Driving an attempt in real time
//!
//! [`Attempt::run`] owns a [`QuizSession`] for its whole life. It loads the
//! quiz, then waits on two sources at once: a one-second interval that
//! ticks the countdown, and a channel of [`Command`]s from the view. Each
//! event is handled to completion before the next one is looked at, so the
//! final tick and a manual submit never overlap, and the session's phase
//! guard turns whichever comes second into a no-op.
//!
//! The loop stops, and with it the interval, as soon as the session leaves
//! [`Phase::InProgress`], when the view abandons the attempt, or when the
//! command channel closes because the view went away. Abandoning never
//! submits anything.

use garde::Validate;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    SyncMessage, UpdateMessage,
    backend::{QuestionStore, Receipt, ResultSink},
    config::Options,
    error::SessionError,
    quiz::{QuestionId, QuizId, answers::OptionLabel},
    session::{Phase, QuizSession, SubmitOutcome, TickOutcome, format_clock},
    tunnel::Tunnel,
};

/// Capacity of the command channel created by [`spawn`]
const COMMAND_BUFFER: usize = 32;

/// Requests from the view of an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Jump to the question at an index
    SetCursor(usize),
    /// Go to the following question
    Next,
    /// Go to the preceding question
    Previous,
    /// Choose an option for a question
    Answer {
        /// The question being answered
        question_id: QuestionId,
        /// The chosen option
        label: OptionLabel,
    },
    /// Choose an option for the question under the cursor
    AnswerCurrent(OptionLabel),
    /// Ask for the unanswered count and warning before submitting
    ReviewSubmit,
    /// Submit the answers now
    Submit,
    /// Leave the attempt without submitting
    Abandon,
}

/// How an attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    /// The quiz could not be loaded
    LoadFailed(SessionError),
    /// The answers were stored
    Completed(Receipt),
    /// Storing the answers failed
    SubmitFailed(String),
    /// The view left before the answers were submitted
    Abandoned,
}

/// One attempt together with the services it talks to
pub struct Attempt<S, R, T> {
    session: QuizSession,
    store: S,
    sink: R,
    tunnel: T,
    options: Options,
}

impl<S, R, T> Attempt<S, R, T>
where
    S: QuestionStore + Sync,
    R: ResultSink + Sync,
    T: Tunnel,
{
    /// Bundles a fresh session with its store, sink and view
    ///
    /// # Errors
    ///
    /// Returns the validation report if `options` are out of bounds, such
    /// as a zero tick interval.
    pub fn new(
        session: QuizSession,
        store: S,
        sink: R,
        tunnel: T,
        options: Options,
    ) -> Result<Self, garde::Report> {
        options.validate()?;
        Ok(Self {
            session,
            store,
            sink,
            tunnel,
            options,
        })
    }

    /// Runs the attempt until it completes, fails or is abandoned
    ///
    /// Returns the final session together with how it ended. The tunnel is
    /// closed before returning.
    pub async fn run(
        mut self,
        quiz_id: QuizId,
        time_limit_minutes: u64,
        mut commands: mpsc::Receiver<Command>,
    ) -> (QuizSession, Ending) {
        self.tunnel.send_state(&SyncMessage::Loading);

        if let Err(error) = self
            .session
            .load(&self.store, quiz_id, time_limit_minutes)
            .await
        {
            return self.finish(Ending::LoadFailed(error));
        }
        self.sync();

        let period = self.options.tick_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let ending = loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(ending) = self.handle_tick().await {
                        break ending;
                    }
                }
                command = commands.recv() => {
                    let Some(command) = command else {
                        log::warn!(
                            "attempt {} lost its view, discarding answers",
                            self.session.attempt_id()
                        );
                        break Ending::Abandoned;
                    };
                    if let Some(ending) = self.handle_command(command).await {
                        break ending;
                    }
                }
            }
        };

        self.finish(ending)
    }

    async fn handle_tick(&mut self) -> Option<Ending> {
        match self.session.tick(&self.sink).await {
            TickOutcome::Idle => None,
            TickOutcome::Running(remaining_seconds) => {
                let expiring = self.options.is_expiring(remaining_seconds);
                if expiring && !self.options.is_expiring(remaining_seconds + 1) {
                    log::debug!(
                        "attempt {} has {remaining_seconds} seconds left",
                        self.session.attempt_id()
                    );
                }
                self.tunnel.send_message(&UpdateMessage::Clock {
                    remaining_seconds,
                    display: format_clock(remaining_seconds),
                    expiring,
                });
                None
            }
            TickOutcome::Expired(outcome) => {
                self.tunnel.send_message(&UpdateMessage::Clock {
                    remaining_seconds: 0,
                    display: format_clock(0),
                    expiring: true,
                });
                self.tunnel.send_message(&UpdateMessage::TimeUp);
                Some(self.report(outcome))
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> Option<Ending> {
        match command {
            Command::SetCursor(index) => {
                let moved = self.session.set_cursor(index);
                self.report_cursor(moved);
            }
            Command::Next => {
                let moved = self.session.next();
                self.report_cursor(moved);
            }
            Command::Previous => {
                let moved = self.session.previous();
                self.report_cursor(moved);
            }
            Command::Answer { question_id, label } => {
                if self.session.set_answer(question_id.clone(), label) {
                    self.report_answer(question_id, label);
                }
            }
            Command::AnswerCurrent(label) => {
                let question_id = self.session.current_question().map(|q| q.id().clone());
                if let Some(question_id) = question_id {
                    if self.session.answer_current(label) {
                        self.report_answer(question_id, label);
                    }
                }
            }
            Command::ReviewSubmit => {
                self.tunnel.send_message(&UpdateMessage::SubmitReview {
                    unanswered: self.session.unanswered_count(),
                    warning: self.session.submit_warning(),
                });
            }
            Command::Submit => {
                let outcome = self.session.submit(&self.sink).await;
                if outcome != SubmitOutcome::Ignored {
                    return Some(self.report(outcome));
                }
            }
            Command::Abandon => {
                log::warn!(
                    "attempt {} abandoned with {} answers unsaved",
                    self.session.attempt_id(),
                    self.session.answers().len()
                );
                return Some(Ending::Abandoned);
            }
        }
        None
    }

    fn report_cursor(&self, moved: bool) {
        if moved {
            self.tunnel.send_message(&UpdateMessage::Cursor {
                index: self.session.cursor(),
                count: self.session.questions().len(),
            });
        }
    }

    fn report_answer(&self, question_id: QuestionId, label: OptionLabel) {
        self.tunnel.send_message(&UpdateMessage::Answer {
            question_id,
            label,
            unanswered: self.session.unanswered_count(),
        });
    }

    fn report(&self, outcome: SubmitOutcome) -> Ending {
        match outcome {
            SubmitOutcome::Completed(receipt) => {
                self.tunnel.send_message(&UpdateMessage::Completed(receipt));
                Ending::Completed(receipt)
            }
            SubmitOutcome::Failed(message) => {
                self.tunnel.send_message(&UpdateMessage::Failed {
                    message: message.clone(),
                });
                Ending::SubmitFailed(message)
            }
            SubmitOutcome::Ignored => Ending::SubmitFailed(format!(
                "submission ignored in phase {:?}",
                self.session.phase()
            )),
        }
    }

    fn sync(&self) {
        self.tunnel.send_state(&SyncMessage::from(&self.session));
    }

    fn finish(self, ending: Ending) -> (QuizSession, Ending) {
        match &ending {
            Ending::Abandoned => self.tunnel.send_message(&UpdateMessage::Abandoned),
            Ending::LoadFailed(error) => self.tunnel.send_message(&UpdateMessage::Failed {
                message: error.to_string(),
            }),
            Ending::Completed(_) | Ending::SubmitFailed(_) => {}
        }
        if self.session.phase() != Phase::InProgress {
            self.sync();
        }
        self.tunnel.close();
        (self.session, ending)
    }
}

/// Handle to an attempt running on its own task
///
/// Dropping the handle aborts the task, which stops the countdown without
/// submitting anything.
pub struct AttemptHandle {
    commands: mpsc::Sender<Command>,
    task: Option<JoinHandle<(QuizSession, Ending)>>,
}

impl AttemptHandle {
    /// Sends a command to the attempt
    ///
    /// Returns `false` if the attempt has already ended.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Waits for the attempt to end
    ///
    /// Returns `None` if the task was aborted or panicked.
    pub async fn join(mut self) -> Option<(QuizSession, Ending)> {
        let task = self.task.take()?;
        task.await.ok()
    }
}

impl Drop for AttemptHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Starts `attempt` on a new task
///
/// Must be called from within a tokio runtime.
pub fn spawn<S, R, T>(
    attempt: Attempt<S, R, T>,
    quiz_id: QuizId,
    time_limit_minutes: u64,
) -> AttemptHandle
where
    S: QuestionStore + Send + Sync + 'static,
    R: ResultSink + Send + Sync + 'static,
    T: Tunnel + Send + 'static,
{
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(attempt.run(quiz_id, time_limit_minutes, receiver));
    AttemptHandle {
        commands,
        task: Some(task),
    }
}
