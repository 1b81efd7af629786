//! SessionManager — owns all live interview sessions and coordinates the
//! oracle, the stage machine, and persistence.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::SessionError;
use crate::oracle::{ChatMessage, GenerationOracle};
use crate::store::{DescriptorStore, PersistenceSink};

use super::evaluation::{self, EvaluationOutcome, EvaluationSummary};
use super::model::{InterviewFocus, MessageSender, MessageType, ScoreBoard, SessionStatus};
use super::parser::parse_oracle_reply;
use super::prompts;
use super::session::InterviewSession;
use super::stage::{Category, InterviewStage};
use super::weights::{self, WeightPolicy};

/// One live session behind its own locks.
///
/// The `turn_lock` serializes mutation per session (one in-flight turn at a
/// time); the state lock is released around the oracle call so other
/// sessions and read paths are never blocked by a slow generation.
struct SessionHandle {
    turn_lock: Mutex<()>,
    state: RwLock<InterviewSession>,
}

/// What the engine hands back for one processed turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The next bot message; the interview continues.
    Reply {
        message: String,
        stage: InterviewStage,
        message_type: MessageType,
    },
    /// All enabled categories scored and the stage machine reached the
    /// terminal stage; the closing message travels with the summary.
    Complete {
        message: String,
        summary: EvaluationSummary,
    },
}

/// Read-only session snapshot for the REST surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOverview {
    pub id: Uuid,
    pub status: SessionStatus,
    pub stage: InterviewStage,
    pub scores: ScoreBoard,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Coordinates every live interview.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<SessionHandle>>>,
    oracle: Arc<dyn GenerationOracle>,
    descriptors: Arc<dyn DescriptorStore>,
    sink: Option<Arc<dyn PersistenceSink>>,
    weight_policy: WeightPolicy,
    params: crate::oracle::GenerationParams,
    idle_timeout: chrono::Duration,
}

impl SessionManager {
    pub fn new(
        oracle: Arc<dyn GenerationOracle>,
        descriptors: Arc<dyn DescriptorStore>,
        sink: Option<Arc<dyn PersistenceSink>>,
        weight_policy: WeightPolicy,
        params: crate::oracle::GenerationParams,
        idle_timeout: std::time::Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            oracle,
            descriptors,
            sink,
            weight_policy,
            params,
            idle_timeout: chrono::Duration::from_std(idle_timeout)
                .unwrap_or_else(|_| chrono::Duration::seconds(1800)),
        }
    }

    /// Create a session from stored descriptors.
    ///
    /// Descriptor lookup failure is fatal: no session is created. A vacancy
    /// with every stage disabled is rejected up front.
    pub async fn create_session(
        &self,
        vacancy_id: Uuid,
        candidate_id: Uuid,
        resume_id: Uuid,
    ) -> Result<Uuid, SessionError> {
        let context = self
            .descriptors
            .interview_context(vacancy_id, candidate_id, resume_id)
            .await?;

        let focus = context.focus();
        let Some(first_stage) = InterviewStage::first_enabled(&focus) else {
            return Err(SessionError::NoEnabledStages(vacancy_id));
        };

        let id = Uuid::new_v4();
        let weights = weights::resolve(self.weight_policy, &context.vacancy);
        let session =
            InterviewSession::new(id, context, first_stage, weights, self.params.clone());

        self.sessions.write().await.insert(
            id,
            Arc::new(SessionHandle {
                turn_lock: Mutex::new(()),
                state: RwLock::new(session),
            }),
        );

        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                if let Err(e) = sink
                    .create_interview(id, vacancy_id, candidate_id, resume_id)
                    .await
                {
                    tracing::warn!(session_id = %id, "Failed to persist interview: {e}");
                }
            });
        }

        tracing::info!(session_id = %id, %vacancy_id, %candidate_id, stage = first_stage.as_str(), "Interview session created");
        Ok(id)
    }

    async fn handle(&self, id: Uuid) -> Result<Arc<SessionHandle>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Start (or resume) the conversation.
    ///
    /// For a freshly created session this issues the opening oracle call and
    /// moves it to ACTIVE. For an already-active session it replays the last
    /// bot message, so a reconnect never restarts the interview.
    pub async fn begin(&self, id: Uuid) -> Result<TurnOutcome, SessionError> {
        let handle = self.handle(id).await?;
        let _turn = handle.turn_lock.lock().await;

        {
            let state = handle.state.read().await;
            match state.status {
                SessionStatus::Closed => return Err(SessionError::Closed(id)),
                SessionStatus::Complete => return Err(SessionError::Completed(id)),
                SessionStatus::Active => {
                    let message = last_bot_message(&state)
                        .unwrap_or_else(|| prompts::CONTINUE_PROMPT.to_string());
                    return Ok(TurnOutcome::Reply {
                        message,
                        stage: state.stage,
                        message_type: MessageType::Question,
                    });
                }
                SessionStatus::Created => {}
            }
        }

        self.run_turn(id, &handle, prompts::OPENING_INSTRUCTION, false)
            .await
    }

    /// Process one candidate message.
    pub async fn handle_turn(&self, id: Uuid, text: &str) -> Result<TurnOutcome, SessionError> {
        let handle = self.handle(id).await?;
        let _turn = handle.turn_lock.lock().await;

        {
            let state = handle.state.read().await;
            match state.status {
                SessionStatus::Closed => return Err(SessionError::Closed(id)),
                SessionStatus::Complete => return Err(SessionError::Completed(id)),
                SessionStatus::Created | SessionStatus::Active => {}
            }
        }

        self.run_turn(id, &handle, text, true).await
    }

    /// The shared oracle round-trip. Caller holds the turn lock.
    ///
    /// The state lock is held only before and after the `converse` await; an
    /// oracle failure leaves the session exactly as it was.
    async fn run_turn(
        &self,
        id: Uuid,
        handle: &SessionHandle,
        inbound: &str,
        persist_inbound: bool,
    ) -> Result<TurnOutcome, SessionError> {
        let (mut messages, params, stage_before) = {
            let state = handle.state.read().await;
            (state.history.clone(), state.params.clone(), state.stage)
        };
        messages.push(ChatMessage::user(inbound));

        let raw = self.oracle.converse(&params, &messages).await?;
        let parsed = parse_oracle_reply(&raw);

        let mut state = handle.state.write().await;
        if state.status == SessionStatus::Closed {
            // Closed while the oracle call was in flight; drop the result.
            return Err(SessionError::Closed(id));
        }

        let scores_before = state.scores.clone();
        let applied = state.apply_turn(inbound, &parsed);
        state.status = SessionStatus::Active;

        if persist_inbound {
            self.persist_message(
                id,
                MessageSender::Candidate,
                inbound,
                stage_before,
                MessageType::Answer,
            );
        }
        self.persist_new_scores(id, &scores_before, &state.scores, &state.focus());

        if applied.stage.is_terminal() {
            let focus = state.focus();
            match evaluation::evaluate(&state.scores, &state.weights, &focus) {
                EvaluationOutcome::Ready(summary) => {
                    state.status = SessionStatus::Complete;
                    self.persist_message(
                        id,
                        MessageSender::Bot,
                        &applied.reply,
                        applied.stage,
                        MessageType::Info,
                    );
                    if let Some(sink) = &self.sink {
                        let sink = Arc::clone(sink);
                        let summary_clone = summary.clone();
                        tokio::spawn(async move {
                            if let Err(e) = sink.write_summary(id, &summary_clone).await {
                                tracing::warn!(session_id = %id, "Failed to persist summary: {e}");
                            }
                            if let Err(e) =
                                sink.finish_interview(id, SessionStatus::Complete).await
                            {
                                tracing::warn!(session_id = %id, "Failed to finish interview: {e}");
                            }
                        });
                    }
                    tracing::info!(session_id = %id, overall = summary.overall_score, "Interview complete");
                    return Ok(TurnOutcome::Complete {
                        message: applied.reply,
                        summary,
                    });
                }
                EvaluationOutcome::NotReady { missing } => {
                    // Terminal stage but unscored categories remain; keep the
                    // conversation open so the oracle can fill the gaps.
                    tracing::debug!(session_id = %id, ?missing, "Terminal stage reached before all categories scored");
                }
            }
        }

        let message_type = if applied.stage.is_terminal() {
            MessageType::Info
        } else {
            MessageType::Question
        };
        self.persist_message(id, MessageSender::Bot, &applied.reply, applied.stage, message_type);

        Ok(TurnOutcome::Reply {
            message: applied.reply,
            stage: applied.stage,
            message_type,
        })
    }

    /// Close a session. Idempotent; a completed interview keeps its status.
    pub async fn close(&self, id: Uuid) -> Result<(), SessionError> {
        let handle = self.handle(id).await?;
        let mut state = handle.state.write().await;
        if matches!(state.status, SessionStatus::Complete | SessionStatus::Closed) {
            return Ok(());
        }
        state.status = SessionStatus::Closed;
        if let Some(sink) = &self.sink {
            let sink = Arc::clone(sink);
            tokio::spawn(async move {
                if let Err(e) = sink.finish_interview(id, SessionStatus::Closed).await {
                    tracing::warn!(session_id = %id, "Failed to mark interview closed: {e}");
                }
            });
        }
        tracing::info!(session_id = %id, "Interview session closed");
        Ok(())
    }

    /// Snapshot for the REST surface.
    pub async fn overview(&self, id: Uuid) -> Result<SessionOverview, SessionError> {
        let handle = self.handle(id).await?;
        let state = handle.state.read().await;
        Ok(SessionOverview {
            id: state.id,
            status: state.status,
            stage: state.stage,
            scores: state.scores.clone(),
            created_at: state.created_at,
            last_activity: state.last_activity,
        })
    }

    /// Evict sessions idle past the timeout. Returns how many.
    ///
    /// Live sessions are closed and marked finished in the store. Completed
    /// and closed ones are simply dropped from the table — their records are
    /// already durable, so keeping the history resident buys nothing.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let handles: Vec<(Uuid, Arc<SessionHandle>)> = {
            let sessions = self.sessions.read().await;
            sessions.iter().map(|(k, v)| (*k, Arc::clone(v))).collect()
        };

        let mut evicted = Vec::new();
        for (id, handle) in handles {
            let mut state = handle.state.write().await;
            if !state.is_expired(now, self.idle_timeout) {
                continue;
            }
            let was_live = matches!(state.status, SessionStatus::Created | SessionStatus::Active);
            if was_live {
                state.status = SessionStatus::Closed;
            }
            evicted.push((id, was_live));
        }

        if !evicted.is_empty() {
            let mut sessions = self.sessions.write().await;
            for (id, _) in &evicted {
                sessions.remove(id);
            }
        }
        for &(id, was_live) in &evicted {
            if was_live {
                if let Some(sink) = &self.sink {
                    let sink = Arc::clone(sink);
                    tokio::spawn(async move {
                        if let Err(e) = sink.finish_interview(id, SessionStatus::Closed).await {
                            tracing::warn!(session_id = %id, "Failed to mark interview closed: {e}");
                        }
                    });
                }
                tracing::info!(session_id = %id, "Idle interview session expired");
            } else {
                tracing::debug!(session_id = %id, "Finished interview session evicted");
            }
        }
        evicted.len()
    }

    fn persist_message(
        &self,
        id: Uuid,
        sender: MessageSender,
        text: &str,
        stage: InterviewStage,
        message_type: MessageType,
    ) {
        let Some(sink) = &self.sink else { return };
        let sink = Arc::clone(sink);
        let text = text.to_string();
        tokio::spawn(async move {
            if let Err(e) = sink
                .append_message(id, sender, &text, stage, message_type)
                .await
            {
                tracing::warn!(session_id = %id, "Failed to persist message: {e}");
            }
        });
    }

    fn persist_new_scores(
        &self,
        id: Uuid,
        before: &ScoreBoard,
        after: &ScoreBoard,
        focus: &InterviewFocus,
    ) {
        let Some(sink) = &self.sink else { return };
        for category in Category::ALL {
            if !focus.is_enabled(category) {
                continue;
            }
            let slot = after.get(category);
            let old = before.get(category);
            if slot.recorded && (!old.recorded || old.value != slot.value) {
                let sink = Arc::clone(sink);
                tokio::spawn(async move {
                    if let Err(e) = sink.record_score(id, category, slot.value).await {
                        tracing::warn!(session_id = %id, "Failed to persist score: {e}");
                    }
                });
            }
        }
    }
}

fn last_bot_message(session: &InterviewSession) -> Option<String> {
    session
        .history
        .iter()
        .rev()
        .find(|m| m.role == crate::oracle::Role::Assistant)
        .map(|m| m.content.clone())
}

/// Spawn the background sweep that expires idle sessions.
pub fn spawn_expiry_task(
    manager: Arc<SessionManager>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let expired = manager.sweep_expired(Utc::now()).await;
            if expired > 0 {
                tracing::debug!(expired, "Expired idle interview sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::error::{DatabaseError, OracleError};
    use crate::interview::model::{
        CandidateSnapshot, EmploymentCategory, InterviewContext, ResumeSnapshot, VacancySnapshot,
        WorkArrangement,
    };
    use crate::oracle::GenerationParams;

    use super::*;

    /// Oracle that replays a fixed script of replies.
    struct ScriptedOracle {
        replies: StdMutex<Vec<String>>,
    }

    impl ScriptedOracle {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl GenerationOracle for ScriptedOracle {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn converse(
            &self,
            _params: &GenerationParams,
            _messages: &[ChatMessage],
        ) -> Result<String, OracleError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(OracleError::Unavailable {
                    reason: "script exhausted".to_string(),
                })
        }
    }

    /// Scripted oracle that yields to the scheduler before answering, so
    /// concurrent callers get a chance to interleave.
    struct YieldingOracle {
        replies: StdMutex<Vec<String>>,
    }

    impl YieldingOracle {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: StdMutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl GenerationOracle for YieldingOracle {
        fn model_name(&self) -> &str {
            "yielding"
        }

        async fn converse(
            &self,
            _params: &GenerationParams,
            _messages: &[ChatMessage],
        ) -> Result<String, OracleError> {
            tokio::task::yield_now().await;
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(OracleError::Unavailable {
                    reason: "script exhausted".to_string(),
                })
        }
    }

    /// Oracle that always fails.
    struct DownOracle;

    #[async_trait]
    impl GenerationOracle for DownOracle {
        fn model_name(&self) -> &str {
            "down"
        }

        async fn converse(
            &self,
            _params: &GenerationParams,
            _messages: &[ChatMessage],
        ) -> Result<String, OracleError> {
            Err(OracleError::Unavailable {
                reason: "connection refused".to_string(),
            })
        }
    }

    struct FixedDescriptors {
        context: InterviewContext,
    }

    #[async_trait]
    impl DescriptorStore for FixedDescriptors {
        async fn interview_context(
            &self,
            _vacancy_id: Uuid,
            _candidate_id: Uuid,
            _resume_id: Uuid,
        ) -> Result<InterviewContext, DatabaseError> {
            Ok(self.context.clone())
        }
    }

    struct FailingDescriptors;

    #[async_trait]
    impl DescriptorStore for FailingDescriptors {
        async fn interview_context(
            &self,
            vacancy_id: Uuid,
            _candidate_id: Uuid,
            _resume_id: Uuid,
        ) -> Result<InterviewContext, DatabaseError> {
            Err(DatabaseError::NotFound {
                entity: "vacancy".to_string(),
                id: vacancy_id.to_string(),
            })
        }
    }

    fn context_with_focus(focus: InterviewFocus) -> InterviewContext {
        InterviewContext {
            vacancy: VacancySnapshot {
                id: Uuid::new_v4(),
                title: "Data Engineer".to_string(),
                description: "Pipelines".to_string(),
                city: None,
                required_skills: vec!["SQL".to_string()],
                experience_min_years: None,
                salary_min: None,
                salary_max: None,
                work_arrangement: WorkArrangement::OnSite,
                employment_category: EmploymentCategory::FullTime,
                focus,
            },
            candidate: CandidateSnapshot {
                id: Uuid::new_v4(),
                full_name: "Jo March".to_string(),
                city: None,
                skills: vec!["SQL".to_string()],
                experience_years: Some(2.0),
                expected_salary: None,
            },
            resume: ResumeSnapshot {
                id: Uuid::new_v4(),
                summary: "Two years of ETL work".to_string(),
                positions: vec![],
            },
        }
    }

    fn manager_with(
        oracle: Arc<dyn GenerationOracle>,
        focus: InterviewFocus,
    ) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            oracle,
            Arc::new(FixedDescriptors {
                context: context_with_focus(focus),
            }),
            None,
            WeightPolicy::Static,
            GenerationParams::default(),
            std::time::Duration::from_secs(1800),
        ))
    }

    async fn created_session(manager: &SessionManager) -> Uuid {
        manager
            .create_session(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn full_interview_reaches_completion() {
        let oracle = ScriptedOracle::new(&[
            "Welcome! Tell me about your background.",
            "Thanks. <SCORES>{\"stage\":1,\"resume_fit\":75}</SCORES><STAGE>2</STAGE> Now a technical question.",
            "Good. <SCORES>{\"stage\":2,\"hard_skills\":85}</SCORES><STAGE>3</STAGE> How do you handle conflict?",
            "Understood. <SCORES>{\"stage\":3,\"soft_skills\":70}</SCORES><STAGE>4</STAGE> That concludes our interview.",
        ]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;

        let opening = manager.begin(id).await.unwrap();
        let TurnOutcome::Reply { message, stage, .. } = opening else {
            panic!("expected reply");
        };
        assert_eq!(message, "Welcome! Tell me about your background.");
        assert_eq!(stage, InterviewStage::ResumeFit);

        manager.handle_turn(id, "I built data pipelines.").await.unwrap();
        manager.handle_turn(id, "I would use a window function.").await.unwrap();
        let outcome = manager.handle_turn(id, "I talk it through.").await.unwrap();

        let TurnOutcome::Complete { message, summary } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(message, "Understood.  That concludes our interview.");
        // 75*0.3 + 85*0.4 + 70*0.3 = 77.5
        assert_eq!(summary.overall_score, 77.5);

        let overview = manager.overview(id).await.unwrap();
        assert_eq!(overview.status, SessionStatus::Complete);
    }

    #[tokio::test]
    async fn partial_focus_completes_without_disabled_stage() {
        let oracle = ScriptedOracle::new(&[
            "Welcome! Let's talk about your resume.",
            "Thanks. <SCORES>{\"stage\":1,\"resume_fit\":70}</SCORES><STAGE>3</STAGE> How do you work in teams?",
            "Great. <SCORES>{\"stage\":3,\"soft_skills\":80}</SCORES><STAGE>4</STAGE> We're done.",
        ]);
        let manager = manager_with(oracle, InterviewFocus::new(true, false, true));
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();
        manager.handle_turn(id, "Here is my background.").await.unwrap();
        let outcome = manager.handle_turn(id, "Collaboratively.").await.unwrap();

        let TurnOutcome::Complete { summary, .. } = outcome else {
            panic!("expected completion");
        };
        // Renormalized: (70*0.3 + 80*0.3) / 0.6 = 75.0
        assert_eq!(summary.overall_score, 75.0);
    }

    #[tokio::test]
    async fn terminal_stage_without_scores_stays_open() {
        let oracle = ScriptedOracle::new(&[
            "Welcome!",
            "Goodbye. <STAGE>4</STAGE>",
        ]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();
        let outcome = manager.handle_turn(id, "Bye.").await.unwrap();
        let TurnOutcome::Reply { stage, message_type, .. } = outcome else {
            panic!("expected reply");
        };
        assert_eq!(stage, InterviewStage::Finished);
        assert_eq!(message_type, MessageType::Info);

        let overview = manager.overview(id).await.unwrap();
        assert_eq!(overview.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn oracle_failure_leaves_state_untouched() {
        let manager = manager_with(Arc::new(DownOracle), InterviewFocus::default());
        let id = created_session(&manager).await;

        let err = manager.begin(id).await.unwrap_err();
        assert!(matches!(err, SessionError::Oracle(_)));

        let overview = manager.overview(id).await.unwrap();
        assert_eq!(overview.status, SessionStatus::Created);
    }

    #[tokio::test]
    async fn begin_is_idempotent_for_active_sessions() {
        let oracle = ScriptedOracle::new(&["Welcome! First question."]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;

        manager.begin(id).await.unwrap();
        // Reconnect: no second oracle call is made, the last bot message replays.
        let resumed = manager.begin(id).await.unwrap();
        let TurnOutcome::Reply { message, .. } = resumed else {
            panic!("expected reply");
        };
        assert_eq!(message, "Welcome! First question.");
    }

    #[tokio::test]
    async fn closed_session_rejects_turns() {
        let oracle = ScriptedOracle::new(&["Welcome!"]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();
        manager.close(id).await.unwrap();

        let err = manager.handle_turn(id, "hello?").await.unwrap_err();
        assert!(matches!(err, SessionError::Closed(_)));
        // Closing twice is a no-op.
        manager.close(id).await.unwrap();
    }

    #[tokio::test]
    async fn no_enabled_stages_is_rejected_at_creation() {
        let manager = manager_with(
            Arc::new(DownOracle),
            InterviewFocus::new(false, false, false),
        );
        let err = manager
            .create_session(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoEnabledStages(_)));
    }

    #[tokio::test]
    async fn descriptor_failure_creates_no_session() {
        let manager = SessionManager::new(
            Arc::new(DownOracle),
            Arc::new(FailingDescriptors),
            None,
            WeightPolicy::Static,
            GenerationParams::default(),
            std::time::Duration::from_secs(1800),
        );
        let err = manager
            .create_session(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Descriptor(_)));
        assert!(manager.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn idle_sessions_are_swept() {
        let oracle = ScriptedOracle::new(&["Welcome!"]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();

        // Not yet idle.
        assert_eq!(manager.sweep_expired(Utc::now()).await, 0);

        let later = Utc::now() + chrono::Duration::seconds(3600);
        assert_eq!(manager.sweep_expired(later).await, 1);
        assert!(matches!(
            manager.overview(id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn completed_sessions_are_evicted_after_idle_timeout() {
        let oracle = ScriptedOracle::new(&[
            "Welcome! Walk me through your resume.",
            "Thanks. <SCORES>{\"stage\":1,\"resume_fit\":85}</SCORES><STAGE>4</STAGE> That's everything I need.",
        ]);
        let manager = manager_with(oracle, InterviewFocus::new(true, false, false));
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();
        let outcome = manager.handle_turn(id, "Here is my background.").await.unwrap();
        assert!(matches!(outcome, TurnOutcome::Complete { .. }));

        // Still resident until the idle timeout passes.
        assert_eq!(manager.sweep_expired(Utc::now()).await, 0);
        assert!(manager.overview(id).await.is_ok());

        let later = Utc::now() + chrono::Duration::seconds(3600);
        assert_eq!(manager.sweep_expired(later).await, 1);
        assert!(matches!(
            manager.overview(id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn closed_sessions_are_evicted_after_idle_timeout() {
        let oracle = ScriptedOracle::new(&["Welcome!"]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();
        manager.close(id).await.unwrap();

        assert_eq!(manager.sweep_expired(Utc::now()).await, 0);

        let later = Utc::now() + chrono::Duration::seconds(3600);
        assert_eq!(manager.sweep_expired(later).await, 1);
        assert!(matches!(
            manager.overview(id).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_apply_one_at_a_time() {
        let oracle = YieldingOracle::new(&[
            "Welcome! Tell me about yourself.",
            "Noted, go on.",
            "Noted, go on.",
            "Noted, go on.",
        ]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let id = created_session(&manager).await;
        manager.begin(id).await.unwrap();

        let (a, b, c) = tokio::join!(
            manager.handle_turn(id, "First answer."),
            manager.handle_turn(id, "Second answer."),
            manager.handle_turn(id, "Third answer."),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let handle = manager.handle(id).await.unwrap();
        let state = handle.state.read().await;
        // System prompt, the opening exchange, then three whole exchanges:
        // interleaved turns would leave consecutive user messages.
        assert_eq!(state.history.len(), 9);
        for (i, msg) in state.history.iter().enumerate().skip(1) {
            let expected = if i % 2 == 1 {
                crate::oracle::Role::User
            } else {
                crate::oracle::Role::Assistant
            };
            assert_eq!(msg.role, expected, "message {i} out of order");
        }
    }

    #[tokio::test]
    async fn sessions_progress_independently_under_concurrent_turns() {
        let oracle = YieldingOracle::new(&[
            "Welcome! First question.",
            "Welcome! First question.",
            "Good. <SCORES>{\"stage\":1,\"resume_fit\":60}</SCORES><STAGE>2</STAGE> Next question.",
            "Good. <SCORES>{\"stage\":1,\"resume_fit\":60}</SCORES><STAGE>2</STAGE> Next question.",
        ]);
        let manager = manager_with(oracle, InterviewFocus::default());
        let first = created_session(&manager).await;
        let second = created_session(&manager).await;
        manager.begin(first).await.unwrap();
        manager.begin(second).await.unwrap();

        let (a, b) = tokio::join!(
            manager.handle_turn(first, "Answer from the first candidate."),
            manager.handle_turn(second, "Answer from the second candidate."),
        );
        a.unwrap();
        b.unwrap();

        for id in [first, second] {
            let overview = manager.overview(id).await.unwrap();
            assert_eq!(overview.stage, InterviewStage::HardSkills);
            assert_eq!(overview.status, SessionStatus::Active);
            assert_eq!(overview.scores.get(Category::ResumeFit).value, 60.0);
        }
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let manager = manager_with(Arc::new(DownOracle), InterviewFocus::default());
        let err = manager.handle_turn(Uuid::new_v4(), "hi").await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }
}
