// src/exam/catalog.rs

use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use serde::Serialize;

use crate::{
    exam::{answers::Answer, error::ExamError},
    models::question::{ExamCategory, Question, QuestionKind},
};

/// One card of the exam listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub exam_type: ExamCategory,
    pub duration_minutes: u64,
    /// Number of questions in the real test section.
    pub questions: u32,
    /// Whether a practice session can be started for it.
    pub available: bool,
}

impl CatalogEntry {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_minutes * 60)
    }
}

const CATALOG: [CatalogEntry; 5] = [
    CatalogEntry {
        exam_type: ExamCategory::Listening,
        duration_minutes: 30,
        questions: 40,
        available: true,
    },
    CatalogEntry {
        exam_type: ExamCategory::Reading,
        duration_minutes: 60,
        questions: 40,
        available: true,
    },
    CatalogEntry {
        exam_type: ExamCategory::Writing,
        duration_minutes: 60,
        questions: 2,
        available: true,
    },
    CatalogEntry {
        exam_type: ExamCategory::Speaking,
        duration_minutes: 15,
        questions: 3,
        available: true,
    },
    CatalogEntry {
        exam_type: ExamCategory::Full,
        duration_minutes: 165,
        questions: 85,
        available: false,
    },
];

pub fn catalog() -> &'static [CatalogEntry] {
    &CATALOG
}

pub fn entry(category: ExamCategory) -> CatalogEntry {
    CATALOG
        .iter()
        .copied()
        .find(|e| e.exam_type == category)
        .unwrap_or(CatalogEntry {
            exam_type: category,
            duration_minutes: 0,
            questions: 0,
            available: false,
        })
}

/// Question source collaborator: the ordered question set of a category.
pub trait QuestionSource: Send + Sync {
    fn questions(&self, category: ExamCategory) -> Result<Arc<[Question]>, ExamError>;
}

/// Question sets held in memory, from the built-in fixtures or a JSON bank.
#[derive(Debug, Clone)]
pub struct StaticQuestionSource {
    sets: HashMap<ExamCategory, Arc<[Question]>>,
}

impl StaticQuestionSource {
    pub fn new(sets: HashMap<ExamCategory, Vec<Question>>) -> Self {
        StaticQuestionSource {
            sets: sets
                .into_iter()
                .map(|(category, questions)| (category, Arc::from(questions)))
                .collect(),
        }
    }

    /// Loads `{ "<category>": [Question, ...], ... }`.
    pub fn from_json_file(path: &Path) -> Result<Self, ExamError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExamError::invalid(format!("cannot read question bank {}: {}", path.display(), e))
        })?;
        let sets: HashMap<ExamCategory, Vec<Question>> = serde_json::from_str(&raw)
            .map_err(|e| ExamError::invalid(format!("malformed question bank: {}", e)))?;

        for (category, questions) in &sets {
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id.as_str())) {
                return Err(ExamError::invalid(format!(
                    "duplicate question id '{}' in {}",
                    dup.id, category
                )));
            }
        }

        tracing::info!("Loaded question bank from {}", path.display());
        Ok(Self::new(sets))
    }

    /// The sample questions shipped with the app.
    pub fn builtin() -> Self {
        let climate = "Climate change refers to long-term shifts in global temperatures and \
            weather patterns. While climate variations occur naturally, scientific evidence shows \
            that human activities have been the main driver of climate change since the 1800s.";

        let sets = HashMap::from([
            (
                ExamCategory::Listening,
                vec![
                    Question {
                        id: "1".to_string(),
                        kind: QuestionKind::SingleChoice,
                        prompt: "What is the main topic of the conversation?".to_string(),
                        options: Some(vec![
                            "Travel plans".to_string(),
                            "Work schedule".to_string(),
                            "Weather forecast".to_string(),
                            "Restaurant booking".to_string(),
                        ]),
                        correct_answer: Answer::single("Travel plans"),
                        passage: None,
                        audio: None,
                    },
                    Question {
                        id: "2".to_string(),
                        kind: QuestionKind::FreeText,
                        prompt: "The meeting is scheduled for _______ o'clock.".to_string(),
                        options: None,
                        correct_answer: Answer::single("three"),
                        passage: None,
                        audio: None,
                    },
                ],
            ),
            (
                ExamCategory::Reading,
                vec![
                    Question {
                        id: "1".to_string(),
                        kind: QuestionKind::SingleChoice,
                        prompt: "According to the passage, what is the main cause of climate change?"
                            .to_string(),
                        options: Some(vec![
                            "Natural disasters".to_string(),
                            "Human activities".to_string(),
                            "Solar radiation".to_string(),
                            "Ocean currents".to_string(),
                        ]),
                        correct_answer: Answer::single("Human activities"),
                        passage: Some(format!(
                            "{} The burning of fossil fuels like coal, oil, and gas produces \
                             greenhouse gases that trap heat in Earth's atmosphere.",
                            climate
                        )),
                        audio: None,
                    },
                    Question {
                        id: "2".to_string(),
                        kind: QuestionKind::TrueFalse,
                        prompt: "Climate variations only occur due to human activities.".to_string(),
                        options: Some(vec!["True".to_string(), "False".to_string()]),
                        correct_answer: Answer::single("False"),
                        passage: Some(climate.to_string()),
                        audio: None,
                    },
                ],
            ),
            (
                ExamCategory::Writing,
                vec![Question {
                    id: "1".to_string(),
                    kind: QuestionKind::FreeText,
                    prompt: "Task 1: The chart below shows the percentage of households in \
                             different income brackets. Summarize the information by selecting \
                             and reporting the main features."
                        .to_string(),
                    options: None,
                    correct_answer: Answer::single("essay"),
                    passage: None,
                    audio: None,
                }],
            ),
            (
                ExamCategory::Speaking,
                vec![Question {
                    id: "1".to_string(),
                    kind: QuestionKind::FreeText,
                    prompt: "Part 1: Tell me about your hometown. What do you like most about it?"
                        .to_string(),
                    options: None,
                    correct_answer: Answer::single("recording"),
                    passage: None,
                    audio: None,
                }],
            ),
        ]);

        Self::new(sets)
    }
}

impl QuestionSource for StaticQuestionSource {
    fn questions(&self, category: ExamCategory) -> Result<Arc<[Question]>, ExamError> {
        match self.sets.get(&category) {
            Some(set) if !set.is_empty() => Ok(Arc::clone(set)),
            _ => Err(ExamError::invalid(format!(
                "no questions available for {}",
                category
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_durations() {
        assert_eq!(entry(ExamCategory::Reading).duration(), Duration::from_secs(3600));
        assert_eq!(entry(ExamCategory::Speaking).duration_minutes, 15);
        assert!(!entry(ExamCategory::Full).available);
        assert_eq!(catalog().len(), ExamCategory::ALL.len());
    }

    #[test]
    fn test_builtin_covers_available_sections() {
        let source = StaticQuestionSource::builtin();
        for e in catalog().iter().filter(|e| e.available) {
            assert!(!source.questions(e.exam_type).unwrap().is_empty());
        }
        assert!(matches!(
            source.questions(ExamCategory::Full),
            Err(ExamError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_set_is_unavailable() {
        let source = StaticQuestionSource::new(HashMap::from([(ExamCategory::Reading, vec![])]));
        assert!(source.questions(ExamCategory::Reading).is_err());
    }

    #[test]
    fn test_from_json_file_rejects_duplicate_ids() {
        let path = std::env::temp_dir().join(format!("bank-{}.json", uuid::Uuid::new_v4()));
        let bank = serde_json::json!({
            "listening": [
                { "id": "1", "type": "free-text", "prompt": "a", "correct_answer": "x" },
                { "id": "1", "type": "free-text", "prompt": "b", "correct_answer": "y" }
            ]
        });
        std::fs::write(&path, bank.to_string()).unwrap();

        let err = StaticQuestionSource::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ExamError::InvalidInput(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_from_json_file_loads_sets() {
        let path = std::env::temp_dir().join(format!("bank-{}.json", uuid::Uuid::new_v4()));
        let bank = serde_json::json!({
            "reading": [
                { "id": "r1", "type": "matching", "prompt": "Pick", "options": ["A", "B", "C"],
                  "correct_answer": ["A", "C"] }
            ]
        });
        std::fs::write(&path, bank.to_string()).unwrap();

        let source = StaticQuestionSource::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let set = source.questions(ExamCategory::Reading).unwrap();
        assert_eq!(set[0].correct_answer, Answer::multi(["A", "C"]));
    }
}
