//! Async persistence traits — the engine never talks to a concrete backend
//! directly, which keeps tests on a stubbed or in-memory store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::interview::evaluation::EvaluationSummary;
use crate::interview::model::{InterviewContext, MessageSender, MessageType, SessionStatus};
use crate::interview::stage::{Category, InterviewStage};

/// Read side: assembles the immutable context an interview is conducted
/// against. A missing descriptor is fatal for session creation.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Load vacancy, candidate, and resume and bundle them into one context.
    async fn interview_context(
        &self,
        vacancy_id: Uuid,
        candidate_id: Uuid,
        resume_id: Uuid,
    ) -> Result<InterviewContext, DatabaseError>;
}

/// Write side: transcript and evaluation records. All calls are issued
/// fire-and-forget from the session manager, so failures are logged but
/// never surface to the candidate.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Register a new interview row.
    async fn create_interview(
        &self,
        session_id: Uuid,
        vacancy_id: Uuid,
        candidate_id: Uuid,
        resume_id: Uuid,
    ) -> Result<(), DatabaseError>;

    /// Append one transcript message.
    async fn append_message(
        &self,
        session_id: Uuid,
        sender: MessageSender,
        text: &str,
        stage: InterviewStage,
        message_type: MessageType,
    ) -> Result<(), DatabaseError>;

    /// Upsert a category score; a re-evaluation overwrites the previous row.
    async fn record_score(
        &self,
        session_id: Uuid,
        category: Category,
        score: f64,
    ) -> Result<(), DatabaseError>;

    /// Store the final evaluation summary.
    async fn write_summary(
        &self,
        session_id: Uuid,
        summary: &EvaluationSummary,
    ) -> Result<(), DatabaseError>;

    /// Mark the interview's terminal status.
    async fn finish_interview(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> Result<(), DatabaseError>;
}
