//! Domain model — interview descriptors, focus flags, and the score board.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stage::Category;

/// Work arrangement advertised by a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkArrangement {
    OnSite,
    Remote,
    Hybrid,
}

/// Employment category of a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentCategory {
    FullTime,
    PartTime,
    Internship,
    Contract,
}

/// Which evaluation stages the employer enabled for a vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewFocus {
    pub resume_fit: bool,
    pub hard_skills: bool,
    pub soft_skills: bool,
}

impl InterviewFocus {
    pub fn new(resume_fit: bool, hard_skills: bool, soft_skills: bool) -> Self {
        Self {
            resume_fit,
            hard_skills,
            soft_skills,
        }
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::ResumeFit => self.resume_fit,
            Category::HardSkills => self.hard_skills,
            Category::SoftSkills => self.soft_skills,
        }
    }

    /// Enabled categories, in stage order.
    pub fn enabled(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    pub fn any_enabled(&self) -> bool {
        self.resume_fit || self.hard_skills || self.soft_skills
    }
}

impl Default for InterviewFocus {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}

/// Vacancy descriptor, frozen into the session at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancySnapshot {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub city: Option<String>,
    pub required_skills: Vec<String>,
    pub experience_min_years: Option<u32>,
    pub salary_min: Option<u64>,
    pub salary_max: Option<u64>,
    pub work_arrangement: WorkArrangement,
    pub employment_category: EmploymentCategory,
    pub focus: InterviewFocus,
}

/// Candidate descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub id: Uuid,
    pub full_name: String,
    pub city: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub expected_salary: Option<u64>,
}

/// Extracted resume text and structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSnapshot {
    pub id: Uuid,
    pub summary: String,
    pub positions: Vec<String>,
}

/// The full descriptor bundle for one interview.
///
/// Built once by the descriptor store and immutable for the session's
/// lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewContext {
    pub vacancy: VacancySnapshot,
    pub candidate: CandidateSnapshot,
    pub resume: ResumeSnapshot,
}

impl InterviewContext {
    pub fn focus(&self) -> InterviewFocus {
        self.vacancy.focus
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Active,
    Complete,
    Closed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Who produced a persisted interview message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    Bot,
    Candidate,
}

impl MessageSender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Candidate => "candidate",
        }
    }
}

/// Kind of an interview message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Question,
    Answer,
    Info,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Info => "info",
        }
    }
}

/// One category's score slot.
///
/// `recorded` distinguishes "never scored" from a stored 0 — readiness
/// requires both the flag and a positive value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub value: f64,
    pub recorded: bool,
}

/// Per-category score storage for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    resume_fit: CategoryScore,
    hard_skills: CategoryScore,
    soft_skills: CategoryScore,
}

impl ScoreBoard {
    pub fn get(&self, category: Category) -> CategoryScore {
        match category {
            Category::ResumeFit => self.resume_fit,
            Category::HardSkills => self.hard_skills,
            Category::SoftSkills => self.soft_skills,
        }
    }

    fn slot(&mut self, category: Category) -> &mut CategoryScore {
        match category {
            Category::ResumeFit => &mut self.resume_fit,
            Category::HardSkills => &mut self.hard_skills,
            Category::SoftSkills => &mut self.soft_skills,
        }
    }

    /// Record a score, clamping into [0,100]. The latest value wins.
    pub fn record(&mut self, category: Category, value: f64) {
        let slot = self.slot(category);
        slot.value = value.clamp(0.0, 100.0);
        slot.recorded = true;
    }

    /// Score used for reporting: disabled categories are forced to 0
    /// regardless of anything the oracle reported.
    pub fn effective(&self, category: Category, focus: &InterviewFocus) -> f64 {
        if focus.is_enabled(category) {
            self.get(category).value
        } else {
            0.0
        }
    }
}
