//! Interview engine — staged screening conversations driven by a text
//! generation oracle.
//!
//! An interview walks a candidate through up to three evaluation stages
//! (resume fit, hard skills, soft skills) that the vacancy enables. The
//! oracle embeds scores and stage markers in its replies; the engine strips
//! them, tracks per-category scores, advances the stage machine, and
//! aggregates a weighted final evaluation when every enabled category has
//! been scored.

pub mod evaluation;
pub mod manager;
pub mod model;
pub mod parser;
pub mod prompts;
pub mod session;
pub mod stage;
pub mod weights;

pub use evaluation::{EvaluationOutcome, EvaluationSummary};
pub use manager::{SessionManager, SessionOverview, TurnOutcome, spawn_expiry_task};
pub use model::{
    CandidateSnapshot, InterviewContext, InterviewFocus, MessageSender, MessageType,
    ResumeSnapshot, SessionStatus, VacancySnapshot,
};
pub use session::InterviewSession;
pub use stage::{Category, InterviewStage};
pub use weights::{CategoryWeights, WeightPolicy};
