// src/exam/scoring.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    exam::{answers::AnswerStore, error::ExamError},
    models::question::Question,
};

/// IELTS band score, 0-9 in half-point steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandScore(f64);

impl BandScore {
    pub const fn new(value: f64) -> Self {
        BandScore(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for BandScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Accuracy thresholds (percent) and their bands, highest first.
/// A percentage maps to the first row whose threshold it meets.
pub const BAND_TABLE: [(u32, BandScore); 13] = [
    (90, BandScore::new(9.0)),
    (82, BandScore::new(8.5)),
    (75, BandScore::new(8.0)),
    (68, BandScore::new(7.5)),
    (60, BandScore::new(7.0)),
    (52, BandScore::new(6.5)),
    (45, BandScore::new(6.0)),
    (38, BandScore::new(5.5)),
    (30, BandScore::new(5.0)),
    (23, BandScore::new(4.5)),
    (15, BandScore::new(4.0)),
    (8, BandScore::new(3.5)),
    (0, BandScore::new(3.0)),
];

const FLOOR_BAND: BandScore = BandScore::new(3.0);

/// Band for an accuracy percentage in `[0, 100]`.
pub fn band_for_percentage(percentage: f64) -> BandScore {
    BAND_TABLE
        .iter()
        .find(|(min, _)| percentage >= f64::from(*min))
        .map(|(_, band)| *band)
        .unwrap_or(FLOOR_BAND)
}

/// Band for `correct` out of `total`, compared without floating point:
/// `correct * 100 >= min * total`.
pub fn band_for(correct: usize, total: usize) -> Result<BandScore, ExamError> {
    if total == 0 {
        return Err(ExamError::invalid("cannot compute a band for zero questions"));
    }

    let scaled = correct as u64 * 100;
    let total = total as u64;

    Ok(BAND_TABLE
        .iter()
        .find(|(min, _)| scaled >= u64::from(*min) * total)
        .map(|(_, band)| *band)
        .unwrap_or(FLOOR_BAND))
}

/// Raw score of one question set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub band: BandScore,
}

impl Score {
    /// Accuracy rounded to the nearest whole percent.
    pub fn percentage(&self) -> u32 {
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// Scores `answers` against `questions`.
///
/// Unanswered questions count as incorrect. No partial credit for multi-answer
/// questions.
pub fn score(questions: &[Question], answers: &AnswerStore) -> Result<Score, ExamError> {
    if questions.is_empty() {
        return Err(ExamError::invalid("question set is empty"));
    }

    let correct = questions
        .iter()
        .filter(|q| {
            answers.is_answered(&q.id) && q.correct_answer.matches(answers.get_answer(&q.id))
        })
        .count();
    let total = questions.len();

    Ok(Score {
        correct,
        total,
        band: band_for(correct, total)?,
    })
}
