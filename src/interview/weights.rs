//! Category weighting — static defaults or vacancy-derived dynamic weights.

use serde::{Deserialize, Serialize};

use super::model::{EmploymentCategory, InterviewFocus, VacancySnapshot, WorkArrangement};
use super::stage::Category;

/// How category weights are derived. An explicit deployment choice — the two
/// policies are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    Static,
    Dynamic,
}

/// Per-category weights. Raw values need not sum to 1; the aggregator
/// renormalizes over the enabled subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub resume_fit: f64,
    pub hard_skills: f64,
    pub soft_skills: f64,
}

impl CategoryWeights {
    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::ResumeFit => self.resume_fit,
            Category::HardSkills => self.hard_skills,
            Category::SoftSkills => self.soft_skills,
        }
    }

    fn set(&mut self, category: Category, weight: f64) {
        match category {
            Category::ResumeFit => self.resume_fit = weight,
            Category::HardSkills => self.hard_skills = weight,
            Category::SoftSkills => self.soft_skills = weight,
        }
    }

    /// Force disabled categories to weight 0.
    pub fn masked(mut self, focus: &InterviewFocus) -> Self {
        for category in Category::ALL {
            if !focus.is_enabled(category) {
                self.set(category, 0.0);
            }
        }
        self
    }
}

/// Baseline weights: resume fit 30%, hard skills 40%, soft skills 30%.
pub fn static_weights() -> CategoryWeights {
    CategoryWeights {
        resume_fit: 0.30,
        hard_skills: 0.40,
        soft_skills: 0.30,
    }
}

/// Vacancy-derived weights.
///
/// Starts from the static baseline, then applies the rules in a fixed order;
/// a later rule overrides an earlier one on the keys it sets:
/// 1. more than 5 required skills → hard-skill heavy (0.50/0.25/0.25),
/// 2. remote work → resume_fit 0.20, soft_skills 0.40,
/// 3. internship → hard_skills 0.30, soft_skills 0.40.
pub fn dynamic_weights(vacancy: &VacancySnapshot) -> CategoryWeights {
    let mut weights = static_weights();

    if vacancy.required_skills.len() > 5 {
        weights.hard_skills = 0.50;
        weights.resume_fit = 0.25;
        weights.soft_skills = 0.25;
    }

    if vacancy.work_arrangement == WorkArrangement::Remote {
        weights.resume_fit = 0.20;
        weights.soft_skills = 0.40;
    }

    if vacancy.employment_category == EmploymentCategory::Internship {
        weights.hard_skills = 0.30;
        weights.soft_skills = 0.40;
    }

    weights
}

/// Resolve weights for a vacancy under the configured policy, with disabled
/// categories masked to 0.
pub fn resolve(policy: WeightPolicy, vacancy: &VacancySnapshot) -> CategoryWeights {
    let weights = match policy {
        WeightPolicy::Static => static_weights(),
        WeightPolicy::Dynamic => dynamic_weights(vacancy),
    };
    weights.masked(&vacancy.focus)
}
