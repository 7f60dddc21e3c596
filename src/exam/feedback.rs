// src/exam/feedback.rs

use serde::Serialize;

use crate::{exam::scoring::BandScore, models::question::ExamCategory};

/// Coarse grading of a band, used to colour the score card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Strong,
    Fair,
    Weak,
}

impl ScoreTier {
    pub fn for_band(band: BandScore) -> Self {
        match band.value() {
            b if b >= 7.0 => ScoreTier::Strong,
            b if b >= 6.0 => ScoreTier::Fair,
            _ => ScoreTier::Weak,
        }
    }
}

pub fn performance_message(band: BandScore) -> &'static str {
    match band.value() {
        b if b >= 8.0 => "Excellent! You're ready for the real exam.",
        b if b >= 7.0 => "Great job! You're on the right track.",
        b if b >= 6.0 => "Good work! Keep practicing to improve.",
        b if b >= 5.0 => "You're making progress. Focus on weak areas.",
        _ => "Keep practicing! You can improve with more preparation.",
    }
}

/// Study suggestions, only given below band 6.0.
pub fn improvement_areas(band: BandScore, category: ExamCategory) -> Vec<&'static str> {
    if band.value() >= 6.0 {
        return Vec::new();
    }

    match category {
        ExamCategory::Listening => vec![
            "Focus on different accents and speaking speeds",
            "Practice note-taking while listening",
        ],
        ExamCategory::Reading => vec![
            "Improve skimming and scanning techniques",
            "Work on vocabulary and comprehension",
        ],
        ExamCategory::Writing => vec![
            "Practice essay structure and organization",
            "Expand vocabulary and grammar range",
        ],
        ExamCategory::Speaking => vec![
            "Work on fluency and pronunciation",
            "Practice expressing ideas clearly",
        ],
        ExamCategory::Full => Vec::new(),
    }
}
