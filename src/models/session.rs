// src/models/session.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    exam::{
        answers::Answer,
        feedback::{self, ScoreTier},
        scoring::BandScore,
        session::{ScoreOutcome, SessionPhase},
    },
    models::question::{ExamCategory, PublicQuestion},
    utils::time::format_duration,
};

/// Snapshot of a session as shown by the exam screen.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub exam_type: ExamCategory,
    pub phase: SessionPhase,
    pub cursor: usize,
    pub total_questions: usize,
    pub answered: usize,
    pub answered_ids: Vec<String>,
    /// Seconds.
    pub time_remaining: u64,
    pub duration: u64,
    pub current_question: PublicQuestion,
    pub current_answer: Option<Answer>,
    /// Present once the session is submitted.
    pub result: Option<ResultsView>,
}

/// Everything the results screen needs.
#[derive(Debug, Clone, Serialize)]
pub struct ResultsView {
    pub exam_type: ExamCategory,
    pub band: BandScore,
    pub correct: usize,
    pub incorrect: usize,
    pub total: usize,
    pub percentage: u32,
    pub time_spent: u64,
    pub time_spent_display: String,
    pub tier: ScoreTier,
    pub performance_message: &'static str,
    pub improvement_areas: Vec<&'static str>,
    /// False when the history entry could not be saved.
    pub persisted: bool,
}

impl ResultsView {
    pub fn new(exam_type: ExamCategory, outcome: &ScoreOutcome, persisted: bool) -> Self {
        let percentage = if outcome.total == 0 {
            0
        } else {
            ((outcome.correct as f64 / outcome.total as f64) * 100.0).round() as u32
        };

        ResultsView {
            exam_type,
            band: outcome.band,
            correct: outcome.correct,
            incorrect: outcome.total - outcome.correct,
            total: outcome.total,
            percentage,
            time_spent: outcome.time_spent,
            time_spent_display: format_duration(outcome.time_spent),
            tier: ScoreTier::for_band(outcome.band),
            performance_message: feedback::performance_message(outcome.band),
            improvement_areas: feedback::improvement_areas(outcome.band, exam_type),
            persisted,
        }
    }
}

/// DTO for `PUT /api/sessions/{id}/answers/{question_id}`.
#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub answer: Answer,
}

/// DTO for `PUT /api/sessions/{id}/cursor`.
#[derive(Debug, Deserialize)]
pub struct MoveCursorRequest {
    pub index: usize,
}
