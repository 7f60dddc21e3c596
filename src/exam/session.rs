// src/exam/session.rs

//! Exam session controller.
//!
//! Owns the cursor, the answer store and the countdown of one attempt and
//! drives it through `Idle -> Running -> Submitting -> Submitted`. Submission
//! happens at most once: the score is computed and frozen before the result
//! record is handed to storage, and every later `submit()` is a no-op.

use std::{collections::BTreeMap, fmt, sync::Arc, time::Duration};

use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::FREE_TEST_LIMIT,
    exam::{
        answers::{Answer, AnswerStore},
        error::ExamError,
        scoring::{self, BandScore},
        timer::CountdownTimer,
    },
    models::{
        exam_result::NewExamResult,
        profile::NewProfile,
        question::{ExamCategory, PublicQuestion, Question},
        session::{ResultsView, SessionView},
    },
    storage::{FreeTestClaim, SharedStorage, StorageError},
    utils::jwt::CurrentUser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Running,
    Submitting,
    Submitted,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Submitting => "submitting",
            SessionPhase::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// Who is taking the exam. Passed in explicitly instead of read from ambient state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user: CurrentUser,
}

/// What is being attempted.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub category: ExamCategory,
    pub questions: Arc<[Question]>,
    pub duration: Duration,
}

/// Frozen result of a submitted session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreOutcome {
    pub correct: usize,
    pub total: usize,
    pub band: BandScore,
    /// Seconds between start and submission.
    pub time_spent: u64,
}

pub struct ExamSession {
    id: Uuid,
    category: ExamCategory,
    questions: Arc<[Question]>,
    answers: AnswerStore,
    cursor: usize,
    phase: SessionPhase,
    timer: CountdownTimer,
    context: SessionContext,
    storage: SharedStorage,
    outcome: Option<ScoreOutcome>,
    persisted: bool,
}

impl ExamSession {
    /// Creates an idle session. `on_expiry` runs once if the countdown reaches zero.
    pub fn new<F>(
        spec: SessionSpec,
        context: SessionContext,
        storage: SharedStorage,
        on_expiry: F,
    ) -> Result<Self, ExamError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if spec.questions.is_empty() {
            return Err(ExamError::invalid("cannot start a session without questions"));
        }

        Ok(ExamSession {
            id: Uuid::new_v4(),
            category: spec.category,
            questions: spec.questions,
            answers: AnswerStore::new(),
            cursor: 0,
            phase: SessionPhase::Idle,
            timer: CountdownTimer::new(spec.duration.as_secs(), on_expiry),
            context,
            storage,
            outcome: None,
            persisted: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.context.user.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn time_remaining(&self) -> u64 {
        self.timer.remaining()
    }

    pub fn outcome(&self) -> Option<&ScoreOutcome> {
        self.outcome.as_ref()
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    fn require_running(&self, action: &'static str) -> Result<(), ExamError> {
        if self.phase == SessionPhase::Running {
            Ok(())
        } else {
            Err(ExamError::PreconditionViolation {
                action,
                phase: self.phase,
            })
        }
    }

    /// Enters `Running` and starts the countdown.
    pub fn start(&mut self) -> Result<(), ExamError> {
        if self.phase != SessionPhase::Idle {
            return Err(ExamError::PreconditionViolation {
                action: "start",
                phase: self.phase,
            });
        }

        self.phase = SessionPhase::Running;
        self.timer.start();
        tracing::info!(
            session = %self.id,
            user = %self.context.user.id,
            exam_type = %self.category,
            duration = self.timer.initial(),
            "Exam session started"
        );
        Ok(())
    }

    /// Moves to the next question; stays put on the last one.
    pub fn go_next(&mut self) -> Result<usize, ExamError> {
        self.require_running("move to the next question")?;
        if self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
        }
        Ok(self.cursor)
    }

    /// Moves to the previous question; stays put on the first one.
    pub fn go_previous(&mut self) -> Result<usize, ExamError> {
        self.require_running("move to the previous question")?;
        self.cursor = self.cursor.saturating_sub(1);
        Ok(self.cursor)
    }

    /// Jumps straight to question `index`.
    pub fn go_to(&mut self, index: usize) -> Result<usize, ExamError> {
        self.require_running("jump to a question")?;
        if index >= self.questions.len() {
            return Err(ExamError::invalid(format!(
                "question index {} is out of range (0..{})",
                index,
                self.questions.len()
            )));
        }
        self.cursor = index;
        Ok(self.cursor)
    }

    /// Stores an answer after checking the id and the answer shape.
    pub fn record_answer(&mut self, question_id: &str, value: Answer) -> Result<(), ExamError> {
        self.require_running("record an answer")?;

        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| ExamError::invalid(format!("unknown question '{}'", question_id)))?;

        if !question.correct_answer.same_shape(&value) {
            let expected = match question.correct_answer {
                Answer::Single(_) => "a single answer",
                Answer::Multi(_) => "a list of answers",
            };
            return Err(ExamError::invalid(format!(
                "question '{}' expects {}",
                question_id, expected
            )));
        }

        self.answers.set_answer(question_id, value);
        Ok(())
    }

    /// Submits from the final question.
    ///
    /// No-op returning the frozen outcome when already submitting or
    /// submitted. A persistence failure is logged and does not prevent the
    /// outcome from being returned.
    pub async fn submit(&mut self) -> Result<ScoreOutcome, ExamError> {
        if self.phase == SessionPhase::Running && self.cursor + 1 != self.questions.len() {
            return Err(ExamError::PreconditionViolation {
                action: "submit before the final question",
                phase: self.phase,
            });
        }
        self.finish().await
    }

    /// Submits from wherever the cursor is. Called when the countdown reaches zero.
    pub async fn expire(&mut self) -> Result<ScoreOutcome, ExamError> {
        self.finish().await
    }

    async fn finish(&mut self) -> Result<ScoreOutcome, ExamError> {
        match self.phase {
            SessionPhase::Idle => {
                return Err(ExamError::PreconditionViolation {
                    action: "submit",
                    phase: self.phase,
                });
            }
            SessionPhase::Submitting | SessionPhase::Submitted => {
                if let Some(outcome) = self.outcome {
                    tracing::debug!(session = %self.id, "Ignoring repeated submission");
                    return Ok(outcome);
                }
                return Err(ExamError::PreconditionViolation {
                    action: "submit",
                    phase: self.phase,
                });
            }
            SessionPhase::Running => {}
        }

        self.phase = SessionPhase::Submitting;
        self.timer.pause();

        let score = scoring::score(&self.questions, &self.answers)?;
        let outcome = ScoreOutcome {
            correct: score.correct,
            total: score.total,
            band: score.band,
            time_spent: self.timer.elapsed(),
        };
        self.outcome = Some(outcome);

        tracing::info!(
            session = %self.id,
            correct = outcome.correct,
            total = outcome.total,
            band = %outcome.band,
            time_spent = outcome.time_spent,
            "Exam session scored"
        );

        self.persist(&outcome).await;
        self.phase = SessionPhase::Submitted;
        Ok(outcome)
    }

    /// Saves the result, using up a free test of a non-premium user.
    ///
    /// The free test is claimed first so that two sessions started on the
    /// same free test cannot both be saved; it is given back if the insert fails.
    async fn persist(&mut self, outcome: &ScoreOutcome) {
        let user_id = self.context.user.id;
        let claim = match self.claim_free_test().await {
            Ok(claim) => claim,
            Err(e) => {
                let err = ExamError::PersistenceFailure(e.to_string());
                tracing::warn!(session = %self.id, "{}", err);
                return;
            }
        };
        if claim == FreeTestClaim::LimitReached {
            tracing::warn!(
                session = %self.id,
                user = %user_id,
                "Free tests used up, result not saved"
            );
            return;
        }

        let record = NewExamResult {
            user_id,
            exam_type: self.category,
            section_scores: BTreeMap::from([(self.category.to_string(), outcome.band)]),
            overall_score: outcome.band,
            time_taken: i64::try_from(outcome.time_spent).unwrap_or(i64::MAX),
            answers: self.answers.snapshot(),
        };

        match self.storage.insert_result(record).await {
            Ok(saved) => {
                self.persisted = true;
                tracing::info!(session = %self.id, result = %saved.id, "Exam result saved");
            }
            Err(e) => {
                let err = ExamError::PersistenceFailure(e.to_string());
                tracing::warn!(session = %self.id, "{}", err);
                let released = match claim {
                    FreeTestClaim::Claimed => self.storage.release_free_test(user_id).await,
                    _ => Ok(()),
                };
                if let Err(e) = released {
                    tracing::warn!(user = %user_id, "Failed to give back free test: {}", e);
                }
            }
        }
    }

    /// Claims a free test, creating the profile first if the user has none.
    async fn claim_free_test(&self) -> Result<FreeTestClaim, StorageError> {
        let user = &self.context.user;
        match self.storage.claim_free_test(user.id, FREE_TEST_LIMIT).await {
            Err(StorageError::NotFound(_)) => {
                let profile = NewProfile {
                    id: user.id,
                    email: user.email.clone(),
                    full_name: None,
                };
                match self.storage.create_profile(profile).await {
                    Ok(_) | Err(StorageError::Conflict(_)) => {}
                    Err(e) => return Err(e),
                }
                self.storage.claim_free_test(user.id, FREE_TEST_LIMIT).await
            }
            other => other,
        }
    }

    /// Stops the countdown of a session that is being torn down unsubmitted.
    pub fn abandon(&mut self) {
        self.timer.pause();
        if self.phase == SessionPhase::Running {
            tracing::info!(session = %self.id, "Exam session abandoned");
        }
    }

    pub fn view(&self) -> SessionView {
        let question = self.current_question();
        SessionView {
            id: self.id,
            exam_type: self.category,
            phase: self.phase,
            cursor: self.cursor,
            total_questions: self.questions.len(),
            answered: self.answers.answered_count(),
            answered_ids: self.answers.answered_ids().map(String::from).collect(),
            time_remaining: self.timer.remaining(),
            duration: self.timer.initial(),
            current_question: PublicQuestion::from(question),
            current_answer: self
                .answers
                .is_answered(&question.id)
                .then(|| self.answers.get_answer(&question.id).clone()),
            result: self
                .outcome
                .filter(|_| self.phase == SessionPhase::Submitted)
                .map(|o| ResultsView::new(self.category, &o, self.persisted)),
        }
    }
}
