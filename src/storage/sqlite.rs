use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{
    format_timestamp, DamageReport, IdeaRecord, ResearchSnapshot, Session, SessionStatus,
    SessionSummary, Storage, UserProfile,
};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::research::{ResearchFindings, ResearchType, RunStatus};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                    message: format!("Failed to create database directory: {}", e),
                })?;
            }
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create a migrated in-memory database.
    ///
    /// A single connection keeps every query on the same memory database.
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    async fn touch_session(&self, id: &str, assignment: &str) -> StorageResult<()> {
        let sql = format!("UPDATE sessions SET {}, updated_at = ? WHERE id = ?", assignment);
        let result = sqlx::query(&sql)
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Query {
                message: format!("Session not found: {}", id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_session(&self, session: &Session) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, status, research_completed, analysis_completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(session.status.to_string())
        .bind(session.research_completed)
        .bind(session.analysis_completed)
        .bind(format_timestamp(&session.created_at))
        .bind(format_timestamp(&session.updated_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_session(&self, id: &str) -> StorageResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, status, research_completed, analysis_completed, created_at, updated_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Session::try_from).transpose()
    }

    async fn get_user_session(&self, id: &str, user_id: &str) -> StorageResult<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, status, research_completed, analysis_completed, created_at, updated_at
            FROM sessions
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Session::try_from).transpose()
    }

    async fn count_user_sessions(&self, user_id: &str) -> StorageResult<u32> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u32)
    }

    async fn list_user_sessions(&self, user_id: &str) -> StorageResult<Vec<SessionSummary>> {
        let rows: Vec<SessionSummaryRow> = sqlx::query_as(
            r#"
            SELECT s.id, s.user_id, s.status, s.research_completed, s.analysis_completed,
                   s.created_at, s.updated_at, i.high_concept
            FROM sessions s
            LEFT JOIN ideas i ON i.session_id = s.id
            WHERE s.user_id = ?
            ORDER BY s.created_at DESC, s.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionSummary::try_from).collect()
    }

    async fn update_session_status(&self, id: &str, status: SessionStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE sessions SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(format_timestamp(&Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Query {
                message: format!("Session not found: {}", id),
            });
        }
        debug!(session_id = %id, status = %status, "Session status updated");
        Ok(())
    }

    async fn mark_research_completed(&self, id: &str) -> StorageResult<()> {
        self.touch_session(id, "research_completed = 1").await
    }

    async fn mark_analysis_completed(&self, id: &str) -> StorageResult<()> {
        self.touch_session(id, "analysis_completed = 1, status = 'completed'")
            .await
    }

    async fn save_idea(&self, record: &IdeaRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(&record.idea)?;

        sqlx::query(
            r#"
            INSERT INTO ideas (session_id, language, high_concept, payload, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.session_id)
        .bind(record.idea.language.as_str())
        .bind(&record.idea.high_concept)
        .bind(&payload)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_idea(&self, session_id: &str) -> StorageResult<Option<IdeaRecord>> {
        let row: Option<IdeaRow> = sqlx::query_as(
            "SELECT session_id, payload, created_at FROM ideas WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(IdeaRecord::try_from).transpose()
    }

    async fn delete_research_snapshot(
        &self,
        session_id: &str,
        research_type: ResearchType,
    ) -> StorageResult<u64> {
        let result =
            sqlx::query("DELETE FROM research_snapshots WHERE session_id = ? AND research_type = ?")
                .bind(session_id)
                .bind(research_type.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }

    async fn insert_research_snapshot(&self, snapshot: &ResearchSnapshot) -> StorageResult<()> {
        let queries = serde_json::to_string(&snapshot.queries)?;
        let results = serde_json::to_string(&snapshot.results)?;
        let failure = snapshot
            .failure
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let search_errors = serde_json::to_string(&snapshot.search_errors)?;

        sqlx::query(
            r#"
            INSERT INTO research_snapshots (
                id, session_id, research_type, queries, results, status, failure,
                search_answer, search_errors, sources_considered, possibly_failed, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.id)
        .bind(&snapshot.session_id)
        .bind(snapshot.research_type.as_str())
        .bind(&queries)
        .bind(&results)
        .bind(snapshot.status.as_str())
        .bind(&failure)
        .bind(&snapshot.search_answer)
        .bind(&search_errors)
        .bind(snapshot.sources_considered as i64)
        .bind(snapshot.possibly_failed)
        .bind(format_timestamp(&snapshot.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_research_snapshot(
        &self,
        session_id: &str,
        research_type: ResearchType,
    ) -> StorageResult<Option<ResearchSnapshot>> {
        let row: Option<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, research_type, queries, results, status, failure,
                   search_answer, search_errors, sources_considered, possibly_failed, created_at
            FROM research_snapshots
            WHERE session_id = ? AND research_type = ?
            "#,
        )
        .bind(session_id)
        .bind(research_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ResearchSnapshot::try_from).transpose()
    }

    async fn list_research_snapshots(
        &self,
        session_id: &str,
    ) -> StorageResult<Vec<ResearchSnapshot>> {
        let rows: Vec<SnapshotRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, research_type, queries, results, status, failure,
                   search_answer, search_errors, sources_considered, possibly_failed, created_at
            FROM research_snapshots
            WHERE session_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ResearchSnapshot::try_from).collect()
    }

    async fn delete_damage_report(&self, session_id: &str) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM damage_reports WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_damage_report(&self, report: &DamageReport) -> StorageResult<()> {
        let payload = serde_json::to_string(&report.report)?;

        sqlx::query(
            r#"
            INSERT INTO damage_reports (id, session_id, report, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.session_id)
        .bind(&payload)
        .bind(format_timestamp(&report.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_damage_report(&self, session_id: &str) -> StorageResult<Option<DamageReport>> {
        let row: Option<ReportRow> = sqlx::query_as(
            "SELECT id, session_id, report, created_at FROM damage_reports WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DamageReport::try_from).transpose()
    }

    async fn get_user_profile(&self, user_id: &str) -> StorageResult<Option<UserProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT user_id, email, member_level, created_at FROM user_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn upsert_user_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, email, member_level, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                email = excluded.email,
                member_level = excluded.member_level
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.email)
        .bind(profile.member_level)
        .bind(format_timestamp(&profile.created_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ensure_user_profile(
        &self,
        user_id: &str,
        email: Option<&str>,
    ) -> StorageResult<UserProfile> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user_id, email, member_level, created_at)
            VALUES (?, ?, 0, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(format_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;

        self.get_user_profile(user_id)
            .await?
            .ok_or_else(|| StorageError::Query {
                message: format!("Profile missing after insert: {}", user_id),
            })
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_column<T: FromStr<Err = String>>(value: &str) -> StorageResult<T> {
    value
        .parse()
        .map_err(|message: String| StorageError::Query { message })
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    status: String,
    research_completed: bool,
    analysis_completed: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SessionRow> for Session {
    type Error = StorageError;

    fn try_from(row: SessionRow) -> StorageResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            status: parse_column(&row.status)?,
            research_completed: row.research_completed,
            analysis_completed: row.analysis_completed,
            created_at: parse_timestamp(&row.created_at),
            updated_at: parse_timestamp(&row.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionSummaryRow {
    #[sqlx(flatten)]
    session: SessionRow,
    high_concept: Option<String>,
}

impl TryFrom<SessionSummaryRow> for SessionSummary {
    type Error = StorageError;

    fn try_from(row: SessionSummaryRow) -> StorageResult<Self> {
        Ok(Self {
            session: row.session.try_into()?,
            high_concept: row.high_concept,
        })
    }
}

#[derive(sqlx::FromRow)]
struct IdeaRow {
    session_id: String,
    payload: String,
    created_at: String,
}

impl TryFrom<IdeaRow> for IdeaRecord {
    type Error = StorageError;

    fn try_from(row: IdeaRow) -> StorageResult<Self> {
        Ok(Self {
            session_id: row.session_id,
            idea: serde_json::from_str(&row.payload)?,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    id: String,
    session_id: String,
    research_type: String,
    queries: String,
    results: String,
    status: String,
    failure: Option<String>,
    search_answer: Option<String>,
    search_errors: String,
    sources_considered: i64,
    possibly_failed: bool,
    created_at: String,
}

impl TryFrom<SnapshotRow> for ResearchSnapshot {
    type Error = StorageError;

    fn try_from(row: SnapshotRow) -> StorageResult<Self> {
        let research_type: ResearchType = parse_column(&row.research_type)?;
        let status: RunStatus = parse_column(&row.status)?;
        let results = ResearchFindings::from_json(research_type, serde_json::from_str(&row.results)?)?;

        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            research_type,
            queries: serde_json::from_str(&row.queries)?,
            results,
            status,
            failure: row
                .failure
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            search_answer: row.search_answer,
            search_errors: serde_json::from_str(&row.search_errors)?,
            sources_considered: row.sources_considered.max(0) as u32,
            possibly_failed: row.possibly_failed,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: String,
    session_id: String,
    report: String,
    created_at: String,
}

impl TryFrom<ReportRow> for DamageReport {
    type Error = StorageError;

    fn try_from(row: ReportRow) -> StorageResult<Self> {
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            report: serde_json::from_str(&row.report)?,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: String,
    email: Option<String>,
    member_level: i64,
    created_at: String,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            user_id: row.user_id,
            email: row.email,
            member_level: row.member_level,
            created_at: parse_timestamp(&row.created_at),
        }
    }
}
