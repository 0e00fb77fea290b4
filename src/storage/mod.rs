//! Storage layer for war room sessions.
//!
//! This module provides SQLite-based storage for sessions, submitted ideas,
//! research snapshots, damage reports and user profiles. Every per-session
//! row hangs off a session, and every session belongs to exactly one user.

mod sqlite;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::MvtaReport;
use crate::error::StorageResult;
use crate::idea::StructuredIdea;
use crate::research::{ResearchFindings, ResearchRun, ResearchType, RunStatus, StageFailure};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for the idea to be submitted.
    #[default]
    Intake,
    /// Idea stored; the founder picks research and/or analysis.
    Choice,
    /// A damage report has been stored.
    Completed,
    /// Analysis failed hard.
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Intake => write!(f, "intake"),
            SessionStatus::Choice => write!(f, "choice"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intake" => Ok(SessionStatus::Intake),
            "choice" => Ok(SessionStatus::Choice),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// The aggregate root of one war room run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// At least one research snapshot has been stored.
    pub research_completed: bool,
    /// A damage report has been stored.
    pub analysis_completed: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the intake state
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            status: SessionStatus::Intake,
            research_completed: false,
            analysis_completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session row joined with its idea headline, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: Session,
    pub high_concept: Option<String>,
}

/// A submitted idea, stored once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaRecord {
    pub session_id: String,
    pub idea: StructuredIdea,
    pub created_at: DateTime<Utc>,
}

impl IdeaRecord {
    pub fn new(session_id: impl Into<String>, idea: StructuredIdea) -> Self {
        Self {
            session_id: session_id.into(),
            idea,
            created_at: Utc::now(),
        }
    }
}

/// Stored output of one research run for one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchSnapshot {
    /// Unique snapshot identifier; changes on every re-run.
    pub id: String,
    pub session_id: String,
    pub research_type: ResearchType,
    /// Queries that were searched. Clients send these back to retry.
    pub queries: Vec<String>,
    /// Synthesized records.
    pub results: ResearchFindings,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_answer: Option<String>,
    pub search_errors: Vec<String>,
    pub sources_considered: u32,
    pub possibly_failed: bool,
    pub created_at: DateTime<Utc>,
}

impl ResearchSnapshot {
    /// Build a fresh snapshot from a finished run
    pub fn from_run(session_id: impl Into<String>, run: ResearchRun) -> Self {
        let possibly_failed = run.possibly_failed();
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            research_type: run.research_type,
            queries: run.queries,
            results: run.findings,
            status: run.status,
            failure: run.failure,
            search_answer: run.search_answer,
            search_errors: run.search_errors,
            sources_considered: run.sources_considered as u32,
            possibly_failed,
            created_at: Utc::now(),
        }
    }
}

/// Stored MVTA output for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageReport {
    pub id: String,
    pub session_id: String,
    pub report: MvtaReport,
    pub created_at: DateTime<Utc>,
}

impl DamageReport {
    pub fn new(session_id: impl Into<String>, report: MvtaReport) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            report,
            created_at: Utc::now(),
        }
    }
}

/// Per-user membership data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: Option<String>,
    /// 0 = free, 1 = basic, 2+ = unlimited.
    pub member_level: i64,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a free-tier profile
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            member_level: 0,
            created_at: Utc::now(),
        }
    }

    /// Set the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the member level (negative values clamp to 0)
    pub fn with_member_level(mut self, level: i64) -> Self {
        self.member_level = level.max(0);
        self
    }
}

/// Fixed-width RFC3339 so stored timestamps sort lexically.
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Storage trait for war room persistence.
///
/// Ownership filtering happens here: `get_user_session` only returns a row
/// when both id and owner match.
#[async_trait]
pub trait Storage: Send + Sync {
    // Session operations

    /// Insert a new session.
    async fn create_session(&self, session: &Session) -> StorageResult<()>;
    /// Get a session by id regardless of owner.
    async fn get_session(&self, id: &str) -> StorageResult<Option<Session>>;
    /// Get a session only if `user_id` owns it.
    async fn get_user_session(&self, id: &str, user_id: &str) -> StorageResult<Option<Session>>;
    /// Count all sessions a user has ever created, drafts included.
    async fn count_user_sessions(&self, user_id: &str) -> StorageResult<u32>;
    /// List a user's sessions, newest first.
    async fn list_user_sessions(&self, user_id: &str) -> StorageResult<Vec<SessionSummary>>;
    /// Set the lifecycle status.
    async fn update_session_status(&self, id: &str, status: SessionStatus) -> StorageResult<()>;
    /// Flip `research_completed` on.
    async fn mark_research_completed(&self, id: &str) -> StorageResult<()>;
    /// Flip `analysis_completed` on and move the session to completed.
    async fn mark_analysis_completed(&self, id: &str) -> StorageResult<()>;

    // Idea operations

    /// Store the submitted idea.
    async fn save_idea(&self, record: &IdeaRecord) -> StorageResult<()>;
    /// Get the submitted idea for a session.
    async fn get_idea(&self, session_id: &str) -> StorageResult<Option<IdeaRecord>>;

    // Research snapshot operations

    /// Delete the snapshot of one type. Returns rows removed.
    async fn delete_research_snapshot(
        &self,
        session_id: &str,
        research_type: ResearchType,
    ) -> StorageResult<u64>;
    /// Insert a snapshot.
    async fn insert_research_snapshot(&self, snapshot: &ResearchSnapshot) -> StorageResult<()>;
    /// Get the snapshot of one type.
    async fn get_research_snapshot(
        &self,
        session_id: &str,
        research_type: ResearchType,
    ) -> StorageResult<Option<ResearchSnapshot>>;
    /// All snapshots for a session.
    async fn list_research_snapshots(&self, session_id: &str)
        -> StorageResult<Vec<ResearchSnapshot>>;

    // Damage report operations

    /// Delete the report for a session. Returns rows removed.
    async fn delete_damage_report(&self, session_id: &str) -> StorageResult<u64>;
    /// Insert a report.
    async fn insert_damage_report(&self, report: &DamageReport) -> StorageResult<()>;
    /// Get the report for a session.
    async fn get_damage_report(&self, session_id: &str) -> StorageResult<Option<DamageReport>>;

    // User profile operations

    /// Get a profile.
    async fn get_user_profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>>;
    /// Insert or replace a profile.
    async fn upsert_user_profile(&self, profile: &UserProfile) -> StorageResult<()>;
    /// Get a profile, creating a free-tier one if the user is new.
    async fn ensure_user_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> StorageResult<UserProfile>;
}
