// src/models/exam_result.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    exam::{answers::Answer, scoring::BandScore},
    models::question::ExamCategory,
    utils::time::format_duration,
};

/// Represents the 'exam_results' table in the database.
/// One row per completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_type: ExamCategory,
    /// Band per section, keyed by category name.
    pub section_scores: BTreeMap<String, BandScore>,
    pub overall_score: BandScore,
    /// Seconds.
    pub time_taken: i64,
    pub answers: BTreeMap<String, Answer>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Row to insert into 'exam_results'. `id` and `completed_at` are assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExamResult {
    pub user_id: Uuid,
    pub exam_type: ExamCategory,
    pub section_scores: BTreeMap<String, BandScore>,
    pub overall_score: BandScore,
    pub time_taken: i64,
    pub answers: BTreeMap<String, Answer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// Most recent first.
    #[default]
    Newest,
    Oldest,
}

/// Query parameters for listing results.
#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub limit: Option<i64>,
    pub order: Option<ResultOrder>,
}

/// Compact row for the dashboard history table.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub id: Uuid,
    pub exam_type: ExamCategory,
    pub overall_score: BandScore,
    pub time_taken: i64,
    pub time_taken_display: String,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl From<&ExamResult> for ResultSummary {
    fn from(r: &ExamResult) -> Self {
        ResultSummary {
            id: r.id,
            exam_type: r.exam_type,
            overall_score: r.overall_score,
            time_taken: r.time_taken,
            time_taken_display: format_duration(u64::try_from(r.time_taken).unwrap_or(0)),
            completed_at: r.completed_at,
        }
    }
}
