use std::sync::Arc;

use ai_interviewer::config::EngineConfig;
use ai_interviewer::interview::manager::{SessionManager, spawn_expiry_task};
use ai_interviewer::interview::model::{
    CandidateSnapshot, EmploymentCategory, InterviewFocus, ResumeSnapshot, VacancySnapshot,
    WorkArrangement,
};
use ai_interviewer::oracle::create_oracle;
use ai_interviewer::store::{DescriptorStore, LibSqlBackend, PersistenceSink};
use ai_interviewer::ws::interview_routes;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = EngineConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export INTERVIEWER_ORACLE_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🎤 AI Interviewer v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.oracle.model);
    eprintln!(
        "   Interview WS: ws://0.0.0.0:{}/ws/interview/{{id}}",
        config.ws_port
    );
    eprintln!(
        "   Interview API: http://0.0.0.0:{}/api/interviews",
        config.ws_port
    );

    let oracle = create_oracle(&config.oracle)?;

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let backend = Arc::new(LibSqlBackend::new_local(db_path).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
        std::process::exit(1);
    }));
    eprintln!("   Database: {}", config.db_path);

    if std::env::var("INTERVIEWER_SEED_DEMO").is_ok() {
        seed_demo_descriptors(&backend).await?;
    }

    // ── Session Manager ──────────────────────────────────────────────────
    let descriptors: Arc<dyn DescriptorStore> = backend.clone();
    let sink: Arc<dyn PersistenceSink> = backend;
    let manager = Arc::new(SessionManager::new(
        oracle,
        descriptors,
        Some(sink),
        config.weight_policy,
        config.oracle.params.clone(),
        config.session_idle_timeout,
    ));

    let _sweep_handle = spawn_expiry_task(Arc::clone(&manager), config.sweep_interval);

    // ── Server ───────────────────────────────────────────────────────────
    let app = interview_routes(manager).layer(CorsLayer::permissive());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.ws_port)).await?;
    tracing::info!(port = config.ws_port, "Interview server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed one vacancy/candidate/resume triple with fixed IDs, so a local
/// client can create an interview without a separate data load step.
async fn seed_demo_descriptors(
    backend: &LibSqlBackend,
) -> Result<(), Box<dyn std::error::Error>> {
    let vacancy_id = Uuid::parse_str("00000000-0000-0000-0000-000000000001")?;
    let candidate_id = Uuid::parse_str("00000000-0000-0000-0000-000000000002")?;
    let resume_id = Uuid::parse_str("00000000-0000-0000-0000-000000000003")?;

    backend
        .upsert_vacancy(&VacancySnapshot {
            id: vacancy_id,
            title: "Senior Backend Engineer".to_string(),
            description: "Design and operate data-intensive services.".to_string(),
            city: Some("Berlin".to_string()),
            required_skills: vec![
                "Rust".to_string(),
                "PostgreSQL".to_string(),
                "Kubernetes".to_string(),
            ],
            experience_min_years: Some(4),
            salary_min: Some(70_000),
            salary_max: Some(95_000),
            work_arrangement: WorkArrangement::Hybrid,
            employment_category: EmploymentCategory::FullTime,
            focus: InterviewFocus::default(),
        })
        .await?;

    backend
        .upsert_candidate(&CandidateSnapshot {
            id: candidate_id,
            full_name: "Dana Petrova".to_string(),
            city: Some("Berlin".to_string()),
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            experience_years: Some(5.0),
            expected_salary: Some(82_000),
        })
        .await?;

    backend
        .upsert_resume(
            candidate_id,
            &ResumeSnapshot {
                id: resume_id,
                summary: "Five years building payment and logistics backends.".to_string(),
                positions: vec![
                    "Backend Engineer at Freightly (2021-2026)".to_string(),
                    "Software Engineer at PayWorks (2019-2021)".to_string(),
                ],
            },
        )
        .await?;

    eprintln!("   Demo descriptors seeded:");
    eprintln!("     vacancy_id:   {vacancy_id}");
    eprintln!("     candidate_id: {candidate_id}");
    eprintln!("     resume_id:    {resume_id}");
    Ok(())
}
