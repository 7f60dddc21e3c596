// src/models/dashboard.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{
    exam_result::{ExamResult, ResultSummary},
    question::ExamCategory,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub average_score: f64,
}

/// Aggregates over the user's recent results.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Number of results the summary was computed from.
    pub total_tests: usize,
    /// Mean overall band, 0 when there are no results.
    pub average_score: f64,
    pub by_exam_type: BTreeMap<ExamCategory, CategoryStats>,
    pub recent_results: Vec<ResultSummary>,
}

impl DashboardSummary {
    pub fn from_results(results: &[ExamResult]) -> Self {
        let total_tests = results.len();
        let average_score = if total_tests == 0 {
            0.0
        } else {
            results.iter().map(|r| r.overall_score.value()).sum::<f64>() / total_tests as f64
        };

        let mut sums: BTreeMap<ExamCategory, (usize, f64)> = BTreeMap::new();
        for r in results {
            let entry = sums.entry(r.exam_type).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += r.overall_score.value();
        }

        let by_exam_type = sums
            .into_iter()
            .map(|(category, (count, sum))| {
                (
                    category,
                    CategoryStats {
                        count,
                        average_score: sum / count as f64,
                    },
                )
            })
            .collect();

        DashboardSummary {
            total_tests,
            average_score,
            by_exam_type,
            recent_results: results.iter().map(ResultSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::scoring::BandScore;
    use uuid::Uuid;

    fn result(category: ExamCategory, band: f64) -> ExamResult {
        ExamResult {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            exam_type: category,
            section_scores: BTreeMap::from([(category.to_string(), BandScore::new(band))]),
            overall_score: BandScore::new(band),
            time_taken: 1234,
            answers: BTreeMap::new(),
            completed_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_empty_dashboard() {
        let summary = DashboardSummary::from_results(&[]);
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.by_exam_type.is_empty());
    }

    #[test]
    fn test_dashboard_averages() {
        let results = vec![
            result(ExamCategory::Reading, 7.0),
            result(ExamCategory::Reading, 6.0),
            result(ExamCategory::Listening, 8.0),
        ];
        let summary = DashboardSummary::from_results(&results);

        assert_eq!(summary.total_tests, 3);
        assert_eq!(summary.average_score, 7.0);
        assert_eq!(
            summary.by_exam_type[&ExamCategory::Reading],
            CategoryStats {
                count: 2,
                average_score: 6.5
            }
        );
        assert_eq!(summary.by_exam_type[&ExamCategory::Listening].count, 1);
        assert_eq!(summary.recent_results[0].time_taken_display, "20:34");
    }
}
