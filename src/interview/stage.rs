//! Interview stage state machine.
//!
//! Progresses linearly through the enabled evaluation stages:
//! ResumeFit → HardSkills → SoftSkills → Finished. Disabled stages are
//! skipped entirely. An explicit stage marker from the oracle overrides the
//! linear progression and may jump in either direction; only the heuristic
//! advance is constrained to move forward.

use serde::{Deserialize, Serialize};

use super::model::InterviewFocus;

/// The phases of an interview, plus the terminal marker.
///
/// Wire values match the oracle's `<STAGE>N</STAGE>` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStage {
    ResumeFit,
    HardSkills,
    SoftSkills,
    Finished,
}

/// An evaluation category — one per non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ResumeFit,
    HardSkills,
    SoftSkills,
}

impl Category {
    /// All categories in stage order.
    pub const ALL: [Category; 3] = [Category::ResumeFit, Category::HardSkills, Category::SoftSkills];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResumeFit => "resume_fit",
            Self::HardSkills => "hard_skills",
            Self::SoftSkills => "soft_skills",
        }
    }

    /// The stage during which this category is assessed.
    pub fn stage(&self) -> InterviewStage {
        match self {
            Self::ResumeFit => InterviewStage::ResumeFit,
            Self::HardSkills => InterviewStage::HardSkills,
            Self::SoftSkills => InterviewStage::SoftSkills,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume_fit" => Ok(Self::ResumeFit),
            "hard_skills" => Ok(Self::HardSkills),
            "soft_skills" => Ok(Self::SoftSkills),
            other => Err(format!("Unknown category: {other}")),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl InterviewStage {
    /// Numeric wire value (1-based, matches the oracle marker contract).
    pub fn as_number(&self) -> u8 {
        match self {
            Self::ResumeFit => 1,
            Self::HardSkills => 2,
            Self::SoftSkills => 3,
            Self::Finished => 4,
        }
    }

    /// Parse an oracle stage marker. Out-of-range markers are rejected.
    pub fn from_marker(n: i64) -> Option<Self> {
        match n {
            1 => Some(Self::ResumeFit),
            2 => Some(Self::HardSkills),
            3 => Some(Self::SoftSkills),
            4 => Some(Self::Finished),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResumeFit => "resume_fit",
            Self::HardSkills => "hard_skills",
            Self::SoftSkills => "soft_skills",
            Self::Finished => "finished",
        }
    }

    /// Whether this stage is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The category assessed during this stage, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::ResumeFit => Some(Category::ResumeFit),
            Self::HardSkills => Some(Category::HardSkills),
            Self::SoftSkills => Some(Category::SoftSkills),
            Self::Finished => None,
        }
    }

    /// The first enabled stage for a focus configuration, or `None` when
    /// every stage is disabled.
    pub fn first_enabled(focus: &InterviewFocus) -> Option<Self> {
        Category::ALL
            .iter()
            .find(|c| focus.is_enabled(**c))
            .map(|c| c.stage())
    }

    /// The next enabled stage after `self`, or `Finished`.
    ///
    /// This is the heuristic single-step advance: disabled stages are skipped
    /// because the prompt flow never visits them.
    pub fn next_enabled(&self, focus: &InterviewFocus) -> Self {
        let mut current = *self;
        loop {
            current = match current {
                Self::ResumeFit => Self::HardSkills,
                Self::HardSkills => Self::SoftSkills,
                Self::SoftSkills | Self::Finished => return Self::Finished,
            };
            match current.category() {
                Some(cat) if focus.is_enabled(cat) => return current,
                _ => continue,
            }
        }
    }
}

impl std::fmt::Display for InterviewStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of applying one turn's parsed signals to the stage machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageTransition {
    /// The oracle declared a stage explicitly; adopted directly.
    Marker(InterviewStage),
    /// The current stage's category was scored; advanced one enabled step.
    Heuristic(InterviewStage),
    /// No usable signal; stage unchanged.
    Hold,
}

impl StageTransition {
    /// The stage after the transition, given the stage before it.
    pub fn resolve(&self, current: InterviewStage) -> InterviewStage {
        match self {
            Self::Marker(s) | Self::Heuristic(s) => *s,
            Self::Hold => current,
        }
    }
}

/// Apply the per-turn transition rules.
///
/// Priority: explicit marker (authoritative, may regress or skip) → heuristic
/// advance when this turn scored the current stage's category above zero →
/// hold. `Finished` is terminal for the heuristic path.
pub fn transition(
    current: InterviewStage,
    marker: Option<InterviewStage>,
    current_category_score: Option<f64>,
    focus: &InterviewFocus,
) -> StageTransition {
    if let Some(declared) = marker {
        return StageTransition::Marker(declared);
    }

    if current.is_terminal() {
        return StageTransition::Hold;
    }

    match current_category_score {
        Some(score) if score > 0.0 => StageTransition::Heuristic(current.next_enabled(focus)),
        _ => StageTransition::Hold,
    }
}
