//! Final-evaluation aggregation: readiness, weighted overall score, and
//! per-category reasoning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::{InterviewFocus, ScoreBoard};
use super::stage::Category;
use super::weights::CategoryWeights;

/// Confidence reported alongside every generated summary. The engine does
/// not yet derive this from the conversation.
pub const AI_CONFIDENCE: f64 = 0.85;

/// One category's slice of the final summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub score: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    /// Weighted overall score in [0, 100], rounded to one decimal.
    pub overall_score: f64,
    pub breakdown: Vec<CategoryBreakdown>,
    pub reasoning: String,
    pub ai_confidence: f64,
    pub generated_at: DateTime<Utc>,
}

/// `NotReady` is a valid outcome, not an error: the conversation ended
/// before every enabled category earned a positive score.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Ready(EvaluationSummary),
    NotReady { missing: Vec<Category> },
}

impl EvaluationOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, EvaluationOutcome::Ready(_))
    }
}

/// Categories still blocking a final evaluation. A score of 0 counts as
/// unevaluated, so recording alone is not enough.
pub fn missing_categories(scores: &ScoreBoard, focus: &InterviewFocus) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|&category| focus.is_enabled(category))
        .filter(|&category| {
            let score = scores.get(category);
            !score.recorded || score.value <= 0.0
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn reasoning_sentence(category: Category, score: f64) -> &'static str {
    match category {
        Category::ResumeFit => {
            if score >= 80.0 {
                "Strong alignment with the job requirements."
            } else if score >= 60.0 {
                "Reasonable alignment with the job requirements."
            } else {
                "Some concerns about basic job fit."
            }
        }
        Category::HardSkills => {
            if score >= 80.0 {
                "Demonstrated solid technical capabilities."
            } else if score >= 60.0 {
                "Technical capabilities broadly match the role."
            } else {
                "Limited technical depth for this role."
            }
        }
        Category::SoftSkills => {
            if score >= 80.0 {
                "Good communication and motivation."
            } else if score >= 60.0 {
                "Adequate communication and motivation."
            } else {
                "Some concerns about communication and soft skills."
            }
        }
    }
}

/// Aggregate the recorded scores into a final summary.
///
/// Weights are renormalized so the *enabled* subset sums to 1; disabled
/// categories appear in the breakdown with score and weight 0.
pub fn evaluate(
    scores: &ScoreBoard,
    weights: &CategoryWeights,
    focus: &InterviewFocus,
) -> EvaluationOutcome {
    let missing = missing_categories(scores, focus);
    if !missing.is_empty() {
        return EvaluationOutcome::NotReady { missing };
    }

    let enabled = focus.enabled();
    let weight_total: f64 = enabled.iter().map(|&c| weights.get(c)).sum();

    let mut overall = 0.0;
    let mut breakdown = Vec::with_capacity(Category::ALL.len());
    let mut sentences = Vec::with_capacity(enabled.len());

    for category in Category::ALL {
        let score = scores.effective(category, focus);
        let weight = if focus.is_enabled(category) && weight_total > 0.0 {
            weights.get(category) / weight_total
        } else {
            0.0
        };
        overall += score * weight;
        if focus.is_enabled(category) {
            sentences.push(reasoning_sentence(category, score));
        }
        breakdown.push(CategoryBreakdown {
            category,
            score: round_one_decimal(score),
            weight: round_one_decimal(weight * 100.0) / 100.0,
        });
    }

    EvaluationOutcome::Ready(EvaluationSummary {
        overall_score: round_one_decimal(overall),
        breakdown,
        reasoning: sentences.join(" "),
        ai_confidence: AI_CONFIDENCE,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use crate::interview::weights::static_weights;

    use super::*;

    fn board(resume: f64, hard: f64, soft: f64) -> ScoreBoard {
        let mut scores = ScoreBoard::default();
        scores.record(Category::ResumeFit, resume);
        scores.record(Category::HardSkills, hard);
        scores.record(Category::SoftSkills, soft);
        scores
    }

    #[test]
    fn full_focus_weighted_sum() {
        let focus = InterviewFocus::default();
        let outcome = evaluate(&board(80.0, 90.0, 70.0), &static_weights(), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        // 80*0.3 + 90*0.4 + 70*0.3 = 81.0
        assert_eq!(summary.overall_score, 81.0);
        assert_eq!(summary.ai_confidence, AI_CONFIDENCE);
        assert_eq!(summary.breakdown.len(), 3);
    }

    #[test]
    fn static_weighted_sum_across_bands() {
        let focus = InterviewFocus::default();
        let outcome = evaluate(&board(70.0, 60.0, 50.0), &static_weights(), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        // 70*0.3 + 60*0.4 + 50*0.3 = 60.0
        assert_eq!(summary.overall_score, 60.0);
    }

    #[test]
    fn single_enabled_category_scores_itself() {
        let focus = InterviewFocus::new(true, false, false);
        let mut scores = ScoreBoard::default();
        scores.record(Category::ResumeFit, 85.0);
        let outcome = evaluate(&scores, &static_weights().masked(&focus), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        assert_eq!(summary.overall_score, 85.0);
        let resume = summary
            .breakdown
            .iter()
            .find(|b| b.category == Category::ResumeFit)
            .unwrap();
        assert_eq!(resume.weight, 1.0);
    }

    #[test]
    fn partial_focus_renormalizes_weights() {
        // Scenario B: soft skills disabled; 0.3/0.4 renormalize to 3/7 and 4/7.
        let focus = InterviewFocus::new(true, true, false);
        let mut scores = ScoreBoard::default();
        scores.record(Category::ResumeFit, 70.0);
        scores.record(Category::HardSkills, 84.0);
        let outcome = evaluate(&scores, &static_weights().masked(&focus), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        let expected = round((70.0 * 0.3 + 84.0 * 0.4) / 0.7);
        assert_eq!(summary.overall_score, expected);
        let soft = summary
            .breakdown
            .iter()
            .find(|b| b.category == Category::SoftSkills)
            .unwrap();
        assert_eq!(soft.score, 0.0);
        assert_eq!(soft.weight, 0.0);
    }

    fn round(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    #[test]
    fn unscored_enabled_category_is_not_ready() {
        let focus = InterviewFocus::default();
        let mut scores = ScoreBoard::default();
        scores.record(Category::ResumeFit, 75.0);
        scores.record(Category::HardSkills, 80.0);
        let outcome = evaluate(&scores, &static_weights(), &focus);
        assert_eq!(
            outcome,
            EvaluationOutcome::NotReady {
                missing: vec![Category::SoftSkills]
            }
        );
    }

    #[test]
    fn zero_score_counts_as_unevaluated() {
        let focus = InterviewFocus::default();
        let outcome = evaluate(&board(75.0, 0.0, 60.0), &static_weights(), &focus);
        assert_eq!(
            outcome,
            EvaluationOutcome::NotReady {
                missing: vec![Category::HardSkills]
            }
        );
    }

    #[test]
    fn disabled_category_never_blocks_readiness() {
        let focus = InterviewFocus::new(false, true, true);
        let mut scores = ScoreBoard::default();
        scores.record(Category::HardSkills, 88.0);
        scores.record(Category::SoftSkills, 66.0);
        assert!(evaluate(&scores, &static_weights().masked(&focus), &focus).is_ready());
    }

    #[test]
    fn reasoning_bands() {
        let focus = InterviewFocus::default();
        let outcome = evaluate(&board(85.0, 65.0, 40.0), &static_weights(), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        assert!(summary.reasoning.contains("Strong alignment"));
        assert!(summary.reasoning.contains("broadly match"));
        assert!(summary.reasoning.contains("concerns about communication"));
    }

    #[test]
    fn overall_rounds_to_one_decimal() {
        let focus = InterviewFocus::default();
        let outcome = evaluate(&board(71.0, 77.0, 83.0), &static_weights(), &focus);
        let EvaluationOutcome::Ready(summary) = outcome else {
            panic!("expected ready");
        };
        // 21.3 + 30.8 + 24.9 = 77.0 exactly; verify the rounding contract.
        assert_eq!(summary.overall_score, (summary.overall_score * 10.0).round() / 10.0);
    }
}
