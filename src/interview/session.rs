//! Per-interview conversational state and the pure turn-application step.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::oracle::{ChatMessage, GenerationParams};

use super::model::{InterviewContext, InterviewFocus, ScoreBoard, SessionStatus};
use super::parser::ParsedReply;
use super::prompts;
use super::stage::{InterviewStage, StageTransition};
use super::weights::CategoryWeights;

/// Everything the engine tracks for one interview. Mutation happens only
/// through [`InterviewSession::apply_turn`] and the lifecycle setters, so
/// the manager can hold this behind a single lock.
#[derive(Debug, Clone)]
pub struct InterviewSession {
    pub id: Uuid,
    pub context: InterviewContext,
    pub stage: InterviewStage,
    pub status: SessionStatus,
    pub history: Vec<ChatMessage>,
    pub scores: ScoreBoard,
    pub weights: CategoryWeights,
    pub params: GenerationParams,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// What a single applied turn produced, before evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedTurn {
    pub reply: String,
    pub stage: InterviewStage,
    pub advanced: bool,
}

impl InterviewSession {
    pub fn new(
        id: Uuid,
        context: InterviewContext,
        stage: InterviewStage,
        weights: CategoryWeights,
        params: GenerationParams,
    ) -> Self {
        let now = Utc::now();
        let system = prompts::interview_system_prompt(&context);
        Self {
            id,
            context,
            stage,
            status: SessionStatus::Created,
            history: vec![ChatMessage::system(system)],
            scores: ScoreBoard::default(),
            weights,
            params,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn focus(&self) -> InterviewFocus {
        self.context.focus()
    }

    pub fn is_expired(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        now - self.last_activity > idle_timeout
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Fold one oracle exchange into the session: append the candidate's
    /// message and the cleaned reply, record any enabled scores, then run
    /// the stage machine. Disabled-category scores are dropped on the floor.
    pub fn apply_turn(&mut self, candidate_text: &str, parsed: &ParsedReply) -> AppliedTurn {
        self.history.push(ChatMessage::user(candidate_text));

        let reply = if parsed.cleaned.is_empty() {
            prompts::CONTINUE_PROMPT.to_string()
        } else {
            parsed.cleaned.clone()
        };
        self.history.push(ChatMessage::assistant(&reply));

        let focus = self.context.focus();
        let mut current_category_score = None;
        if let Some(block) = &parsed.scores {
            for category in focus.enabled() {
                if let Some(value) = block.get(category) {
                    self.scores.record(category, value);
                    if self.stage.category() == Some(category) {
                        current_category_score = Some(value);
                    }
                }
            }
        }

        let marker = parsed.stage_marker.and_then(InterviewStage::from_marker);
        let transition =
            super::stage::transition(self.stage, marker, current_category_score, &focus);
        let next = transition.resolve(self.stage);
        let advanced = next != self.stage;
        self.stage = next;
        if matches!(transition, StageTransition::Heuristic(_)) && next == InterviewStage::Finished {
            tracing::debug!(session_id = %self.id, "heuristic advance reached terminal stage");
        }
        self.touch();

        AppliedTurn {
            reply,
            stage: self.stage,
            advanced,
        }
    }
}
