//! WebSocket + REST surface for conducting interviews.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::SessionError;
use crate::interview::evaluation::EvaluationSummary;
use crate::interview::manager::{SessionManager, TurnOutcome};
use crate::interview::model::{MessageSender, MessageType};
use crate::interview::prompts;
use crate::interview::stage::InterviewStage;

/// Frames sent to the candidate's client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsFrame {
    Message {
        sender: MessageSender,
        message: String,
        stage: InterviewStage,
        message_type: MessageType,
    },
    InterviewComplete {
        final_score: f64,
        summary: EvaluationSummary,
    },
    Error {
        message: String,
    },
}

/// Inbound candidate frame. Extra fields (e.g. a `type` tag) are ignored.
#[derive(Debug, Deserialize)]
struct ClientMessage {
    #[serde(default)]
    message: String,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

/// Build the Axum router with the interview WebSocket and REST routes.
pub fn interview_routes(manager: Arc<SessionManager>) -> Router {
    let state = AppState { manager };

    Router::new()
        .route("/health", get(health))
        .route("/api/interviews", post(create_interview))
        .route("/api/interviews/{id}", get(get_interview))
        .route("/ws/interview/{id}", get(ws_handler))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ai-interviewer"
    }))
}

// ── REST Endpoints ──────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateInterviewRequest {
    vacancy_id: Uuid,
    candidate_id: Uuid,
    resume_id: Uuid,
}

async fn create_interview(
    State(state): State<AppState>,
    Json(body): Json<CreateInterviewRequest>,
) -> impl IntoResponse {
    match state
        .manager
        .create_session(body.vacancy_id, body.candidate_id, body.resume_id)
        .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({"interview_id": id, "status": "created"})),
        ),
        Err(SessionError::Descriptor(e)) => {
            warn!(error = %e, "Interview creation failed on descriptor lookup");
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": e.to_string()})),
            )
        }
        Err(SessionError::NoEnabledStages(vacancy_id)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": format!("Vacancy {vacancy_id} has no interview stages enabled")
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

async fn get_interview(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let session_id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid interview ID"})),
            );
        }
    };

    match state.manager.overview(session_id).await {
        Ok(overview) => (StatusCode::OK, Json(serde_json::json!(overview))),
        Err(SessionError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Interview not found"})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!(interview_id = %id, "WebSocket client connecting");
    ws.on_upgrade(move |socket| handle_socket(socket, state.manager, id))
}

async fn send_frame(socket: &mut WebSocket, frame: &WsFrame) -> bool {
    match serde_json::to_string(frame) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Failed to serialize WS frame");
            false
        }
    }
}

async fn handle_socket(mut socket: WebSocket, manager: Arc<SessionManager>, id: String) {
    let Ok(session_id) = Uuid::parse_str(&id) else {
        let _ = send_frame(
            &mut socket,
            &WsFrame::Error {
                message: "Invalid interview ID".to_string(),
            },
        )
        .await;
        return;
    };

    let overview = match manager.overview(session_id).await {
        Ok(overview) => overview,
        Err(_) => {
            let _ = send_frame(
                &mut socket,
                &WsFrame::Error {
                    message: "Interview not found".to_string(),
                },
            )
            .await;
            return;
        }
    };

    // Greeting, then the opening question (or the replayed last question on
    // reconnect).
    if !send_frame(
        &mut socket,
        &WsFrame::Message {
            sender: MessageSender::Bot,
            message: prompts::GREETING.to_string(),
            stage: overview.stage,
            message_type: MessageType::Info,
        },
    )
    .await
    {
        return;
    }

    match manager.begin(session_id).await {
        Ok(outcome) => {
            if !send_outcome(&mut socket, outcome).await {
                return;
            }
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Failed to begin interview");
            let _ = send_frame(
                &mut socket,
                &WsFrame::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    }

    info!(session_id = %session_id, "Interview WebSocket connected");

    while let Some(result) = socket.recv().await {
        match result {
            Ok(Message::Text(text)) => {
                if !handle_candidate_message(&mut socket, &manager, session_id, &text).await {
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                if socket.send(Message::Pong(data)).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "WebSocket client disconnected");
                break;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // A dropped connection is not a candidate decision: the session stays
    // ACTIVE so a reconnect can resume until the idle sweep closes it.
    info!(session_id = %session_id, "Interview WebSocket closed");
}

/// Returns false when the socket should be closed.
async fn handle_candidate_message(
    socket: &mut WebSocket,
    manager: &SessionManager,
    session_id: Uuid,
    text: &str,
) -> bool {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(parsed) if !parsed.message.trim().is_empty() => parsed.message,
        Ok(_) => {
            return send_frame(
                socket,
                &WsFrame::Error {
                    message: "Empty message received".to_string(),
                },
            )
            .await;
        }
        Err(e) => {
            debug!(session_id = %session_id, error = %e, "Unrecognized WS message from candidate");
            return send_frame(
                socket,
                &WsFrame::Error {
                    message: "Malformed message".to_string(),
                },
            )
            .await;
        }
    };

    match manager.handle_turn(session_id, &message).await {
        Ok(outcome) => {
            let complete = matches!(outcome, TurnOutcome::Complete { .. });
            let sent = send_outcome(socket, outcome).await;
            // Completion is final; the server closes the conversation.
            sent && !complete
        }
        Err(SessionError::Oracle(e)) => {
            // Transient: the turn was not applied and may be retried.
            warn!(session_id = %session_id, error = %e, "Oracle failure during turn");
            send_frame(
                socket,
                &WsFrame::Error {
                    message:
                        "Sorry, I encountered an error processing your answer. Please try again."
                            .to_string(),
                },
            )
            .await
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Turn rejected");
            let _ = send_frame(
                socket,
                &WsFrame::Error {
                    message: e.to_string(),
                },
            )
            .await;
            false
        }
    }
}

async fn send_outcome(socket: &mut WebSocket, outcome: TurnOutcome) -> bool {
    let frame = match outcome {
        TurnOutcome::Reply {
            message,
            stage,
            message_type,
        } => WsFrame::Message {
            sender: MessageSender::Bot,
            message,
            stage,
            message_type,
        },
        TurnOutcome::Complete { message, summary } => {
            if !send_frame(
                socket,
                &WsFrame::Message {
                    sender: MessageSender::Bot,
                    message,
                    stage: InterviewStage::Finished,
                    message_type: MessageType::Info,
                },
            )
            .await
            {
                return false;
            }
            WsFrame::InterviewComplete {
                final_score: summary.overall_score,
                summary,
            }
        }
    };
    send_frame(socket, &frame).await
}
