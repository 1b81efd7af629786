//! libSQL backend — async implementation of both persistence traits.
//!
//! Supports local file and in-memory databases; a single connection is
//! reused for all operations (`libsql::Connection` is `Send + Sync`).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::interview::evaluation::EvaluationSummary;
use crate::interview::model::{
    CandidateSnapshot, EmploymentCategory, InterviewContext, InterviewFocus, MessageSender,
    MessageType, ResumeSnapshot, SessionStatus, VacancySnapshot, WorkArrangement,
};
use crate::interview::stage::{Category, InterviewStage};
use crate::store::migrations;
use crate::store::traits::{DescriptorStore, PersistenceSink};

/// libSQL database backend.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Descriptor seeding ──────────────────────────────────────────

    /// Insert or replace a vacancy row.
    pub async fn upsert_vacancy(&self, vacancy: &VacancySnapshot) -> Result<(), DatabaseError> {
        let skills = serde_json::to_string(&vacancy.required_skills)
            .map_err(|e| DatabaseError::Serialization(format!("required_skills: {e}")))?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO vacancies (
                    id, title, description, city, required_skills,
                    experience_min_years, salary_min, salary_max,
                    work_arrangement, employment_category,
                    interview_focus_resume, interview_focus_hard, interview_focus_soft
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    vacancy.id.to_string(),
                    vacancy.title.as_str(),
                    vacancy.description.as_str(),
                    vacancy.city.as_deref(),
                    skills,
                    vacancy.experience_min_years.map(|v| v as i64),
                    vacancy.salary_min.map(|v| v as i64),
                    vacancy.salary_max.map(|v| v as i64),
                    work_arrangement_to_str(vacancy.work_arrangement),
                    employment_category_to_str(vacancy.employment_category),
                    vacancy.focus.resume_fit as i64,
                    vacancy.focus.hard_skills as i64,
                    vacancy.focus.soft_skills as i64,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_vacancy: {e}")))?;
        Ok(())
    }

    /// Insert or replace a candidate row.
    pub async fn upsert_candidate(
        &self,
        candidate: &CandidateSnapshot,
    ) -> Result<(), DatabaseError> {
        let skills = serde_json::to_string(&candidate.skills)
            .map_err(|e| DatabaseError::Serialization(format!("skills: {e}")))?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO candidates (
                    id, full_name, city, skills, experience_years, expected_salary
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    candidate.id.to_string(),
                    candidate.full_name.as_str(),
                    candidate.city.as_deref(),
                    skills,
                    candidate.experience_years,
                    candidate.expected_salary.map(|v| v as i64),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_candidate: {e}")))?;
        Ok(())
    }

    /// Insert or replace a resume row.
    pub async fn upsert_resume(
        &self,
        candidate_id: Uuid,
        resume: &ResumeSnapshot,
    ) -> Result<(), DatabaseError> {
        let positions = serde_json::to_string(&resume.positions)
            .map_err(|e| DatabaseError::Serialization(format!("positions: {e}")))?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO resumes (id, candidate_id, summary, positions)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    resume.id.to_string(),
                    candidate_id.to_string(),
                    resume.summary.as_str(),
                    positions,
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_resume: {e}")))?;
        Ok(())
    }

    async fn load_vacancy(&self, id: Uuid) -> Result<VacancySnapshot, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, title, description, city, required_skills,
                        experience_min_years, salary_min, salary_max,
                        work_arrangement, employment_category,
                        interview_focus_resume, interview_focus_hard, interview_focus_soft
                 FROM vacancies WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_vacancy: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("load_vacancy: {e}")))?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "vacancy".to_string(),
                id: id.to_string(),
            })?;

        row_to_vacancy(&row).map_err(|e| DatabaseError::Query(format!("load_vacancy: {e}")))
    }

    async fn load_candidate(&self, id: Uuid) -> Result<CandidateSnapshot, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, full_name, city, skills, experience_years, expected_salary
                 FROM candidates WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_candidate: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("load_candidate: {e}")))?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "candidate".to_string(),
                id: id.to_string(),
            })?;

        row_to_candidate(&row).map_err(|e| DatabaseError::Query(format!("load_candidate: {e}")))
    }

    async fn load_resume(&self, id: Uuid) -> Result<ResumeSnapshot, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, summary, positions FROM resumes WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_resume: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("load_resume: {e}")))?
            .ok_or_else(|| DatabaseError::NotFound {
                entity: "resume".to_string(),
                id: id.to_string(),
            })?;

        row_to_resume(&row).map_err(|e| DatabaseError::Query(format!("load_resume: {e}")))
    }
}

// ── Row mapping helpers ─────────────────────────────────────────────

fn work_arrangement_to_str(value: WorkArrangement) -> &'static str {
    match value {
        WorkArrangement::OnSite => "on_site",
        WorkArrangement::Remote => "remote",
        WorkArrangement::Hybrid => "hybrid",
    }
}

fn str_to_work_arrangement(s: &str) -> WorkArrangement {
    match s {
        "remote" => WorkArrangement::Remote,
        "hybrid" => WorkArrangement::Hybrid,
        _ => WorkArrangement::OnSite,
    }
}

fn employment_category_to_str(value: EmploymentCategory) -> &'static str {
    match value {
        EmploymentCategory::FullTime => "full_time",
        EmploymentCategory::PartTime => "part_time",
        EmploymentCategory::Internship => "internship",
        EmploymentCategory::Contract => "contract",
    }
}

fn str_to_employment_category(s: &str) -> EmploymentCategory {
    match s {
        "part_time" => EmploymentCategory::PartTime,
        "internship" => EmploymentCategory::Internship,
        "contract" => EmploymentCategory::Contract,
        _ => EmploymentCategory::FullTime,
    }
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_string_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn row_to_vacancy(row: &libsql::Row) -> Result<VacancySnapshot, libsql::Error> {
    let id_str: String = row.get(0)?;
    let skills_str: String = row.get(4)?;
    let arrangement_str: String = row.get(8)?;
    let employment_str: String = row.get(9)?;
    Ok(VacancySnapshot {
        id: parse_uuid(&id_str),
        title: row.get(1)?,
        description: row.get(2)?,
        city: row.get(3).ok(),
        required_skills: parse_string_list(&skills_str),
        experience_min_years: row.get::<i64>(5).ok().map(|v| v as u32),
        salary_min: row.get::<i64>(6).ok().map(|v| v as u64),
        salary_max: row.get::<i64>(7).ok().map(|v| v as u64),
        work_arrangement: str_to_work_arrangement(&arrangement_str),
        employment_category: str_to_employment_category(&employment_str),
        focus: InterviewFocus::new(
            row.get::<i64>(10)? != 0,
            row.get::<i64>(11)? != 0,
            row.get::<i64>(12)? != 0,
        ),
    })
}

fn row_to_candidate(row: &libsql::Row) -> Result<CandidateSnapshot, libsql::Error> {
    let id_str: String = row.get(0)?;
    let skills_str: String = row.get(3)?;
    Ok(CandidateSnapshot {
        id: parse_uuid(&id_str),
        full_name: row.get(1)?,
        city: row.get(2).ok(),
        skills: parse_string_list(&skills_str),
        experience_years: row.get::<f64>(4).ok(),
        expected_salary: row.get::<i64>(5).ok().map(|v| v as u64),
    })
}

fn row_to_resume(row: &libsql::Row) -> Result<ResumeSnapshot, libsql::Error> {
    let id_str: String = row.get(0)?;
    let positions_str: String = row.get(2)?;
    Ok(ResumeSnapshot {
        id: parse_uuid(&id_str),
        summary: row.get(1)?,
        positions: parse_string_list(&positions_str),
    })
}

#[async_trait]
impl DescriptorStore for LibSqlBackend {
    async fn interview_context(
        &self,
        vacancy_id: Uuid,
        candidate_id: Uuid,
        resume_id: Uuid,
    ) -> Result<InterviewContext, DatabaseError> {
        let vacancy = self.load_vacancy(vacancy_id).await?;
        let candidate = self.load_candidate(candidate_id).await?;
        let resume = self.load_resume(resume_id).await?;
        Ok(InterviewContext {
            vacancy,
            candidate,
            resume,
        })
    }
}

#[async_trait]
impl PersistenceSink for LibSqlBackend {
    async fn create_interview(
        &self,
        session_id: Uuid,
        vacancy_id: Uuid,
        candidate_id: Uuid,
        resume_id: Uuid,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT OR IGNORE INTO interviews (id, vacancy_id, candidate_id, resume_id, status)
                 VALUES (?1, ?2, ?3, ?4, 'created')",
                params![
                    session_id.to_string(),
                    vacancy_id.to_string(),
                    candidate_id.to_string(),
                    resume_id.to_string(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_interview: {e}")))?;
        Ok(())
    }

    async fn append_message(
        &self,
        session_id: Uuid,
        sender: MessageSender,
        text: &str,
        stage: InterviewStage,
        message_type: MessageType,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO interview_messages (id, interview_id, sender, message, stage, message_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    session_id.to_string(),
                    sender.as_str(),
                    text,
                    stage.as_str(),
                    message_type.as_str(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("append_message: {e}")))?;
        Ok(())
    }

    async fn record_score(
        &self,
        session_id: Uuid,
        category: Category,
        score: f64,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO evaluation_scores (interview_id, category, score, updated_at)
                 VALUES (?1, ?2, ?3, datetime('now'))
                 ON CONFLICT (interview_id, category)
                 DO UPDATE SET score = excluded.score, updated_at = excluded.updated_at",
                params![session_id.to_string(), category.as_str(), score],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("record_score: {e}")))?;
        Ok(())
    }

    async fn write_summary(
        &self,
        session_id: Uuid,
        summary: &EvaluationSummary,
    ) -> Result<(), DatabaseError> {
        let breakdown = serde_json::to_string(&summary.breakdown)
            .map_err(|e| DatabaseError::Serialization(format!("breakdown: {e}")))?;
        self.conn()
            .execute(
                "INSERT OR REPLACE INTO evaluation_summaries (
                    interview_id, overall_score, breakdown, reasoning, ai_confidence, generated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    session_id.to_string(),
                    summary.overall_score,
                    breakdown,
                    summary.reasoning.as_str(),
                    summary.ai_confidence,
                    summary.generated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("write_summary: {e}")))?;
        Ok(())
    }

    async fn finish_interview(
        &self,
        session_id: Uuid,
        status: SessionStatus,
    ) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "UPDATE interviews SET status = ?2, finished_at = datetime('now') WHERE id = ?1",
                params![session_id.to_string(), status.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("finish_interview: {e}")))?;
        Ok(())
    }
}
