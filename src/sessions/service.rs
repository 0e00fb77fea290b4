use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::QuotaInfo;
use crate::analysis::AnalysisEngine;
use crate::error::{AppError, AppResult};
use crate::idea::StructuredIdea;
use crate::research::{ResearchEngine, ResearchType, RunStatus};
use crate::storage::{
    DamageReport, IdeaRecord, ResearchSnapshot, Session, SessionStatus, SessionSummary,
    SqliteStorage, Storage,
};

/// Completion state of one research type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchTypeStatus {
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    pub possibly_failed: bool,
    pub result_count: usize,
}

/// Completion map across all research types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchStatus {
    pub research_completed: bool,
    pub types: BTreeMap<String, ResearchTypeStatus>,
}

/// Per-user session operations.
///
/// Every method that takes a session id checks ownership first; a session
/// that is missing or owned by someone else is reported as not found.
#[derive(Clone)]
pub struct SessionService {
    storage: SqliteStorage,
    research: ResearchEngine,
    analysis: AnalysisEngine,
}

impl SessionService {
    pub fn new(storage: SqliteStorage, research: ResearchEngine, analysis: AnalysisEngine) -> Self {
        Self {
            storage,
            research,
            analysis,
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    async fn owned_session(&self, session_id: &str, user_id: &str) -> AppResult<Session> {
        self.storage
            .get_user_session(session_id, user_id)
            .await?
            .ok_or_else(AppError::session_not_found)
    }

    async fn require_idea(&self, session_id: &str) -> AppResult<StructuredIdea> {
        match self.storage.get_idea(session_id).await? {
            Some(record) => Ok(record.idea),
            None => Err(AppError::BadRequest {
                code: "IDEA_REQUIRED".to_string(),
                message: "Submit an idea before running research or analysis".to_string(),
            }),
        }
    }

    /// Quota for a user, creating a free-tier profile if needed
    pub async fn quota(&self, user_id: &str) -> AppResult<QuotaInfo> {
        let profile = self.storage.ensure_user_profile(user_id, None).await?;
        let used = self.storage.count_user_sessions(user_id).await?;
        Ok(QuotaInfo::new(profile.member_level, used))
    }

    /// Create a session if the user's quota allows it
    pub async fn create_session(&self, user_id: &str) -> AppResult<Session> {
        let quota = self.quota(user_id).await?;
        if !quota.can_create {
            info!(user_id, used = quota.used, limit = ?quota.limit, "Session quota exceeded");
            return Err(AppError::QuotaExceeded { quota });
        }

        let session = Session::new(user_id);
        self.storage.create_session(&session).await?;
        info!(session_id = %session.id, user_id, "Session created");
        Ok(session)
    }

    pub async fn list_sessions(&self, user_id: &str) -> AppResult<Vec<SessionSummary>> {
        Ok(self.storage.list_user_sessions(user_id).await?)
    }

    pub async fn get_session(&self, session_id: &str, user_id: &str) -> AppResult<Session> {
        self.owned_session(session_id, user_id).await
    }

    /// Validate and store the idea, then move the session to `choice`
    pub async fn submit_idea(
        &self,
        session_id: &str,
        user_id: &str,
        idea: StructuredIdea,
    ) -> AppResult<IdeaRecord> {
        self.owned_session(session_id, user_id).await?;
        idea.validate()?;

        if self.storage.get_idea(session_id).await?.is_some() {
            return Err(AppError::BadRequest {
                code: "IDEA_ALREADY_SUBMITTED".to_string(),
                message: "An idea has already been submitted for this session".to_string(),
            });
        }

        let record = IdeaRecord::new(session_id, idea);
        self.storage.save_idea(&record).await?;
        self.storage
            .update_session_status(session_id, SessionStatus::Choice)
            .await?;

        info!(session_id, language = record.idea.language.as_str(), "Idea submitted");
        Ok(record)
    }

    pub async fn get_idea(&self, session_id: &str, user_id: &str) -> AppResult<IdeaRecord> {
        self.owned_session(session_id, user_id).await?;
        self.storage
            .get_idea(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Idea".to_string(),
            })
    }

    /// Run one research type and replace any stored snapshot of that type
    pub async fn run_research(
        &self,
        session_id: &str,
        user_id: &str,
        research_type: ResearchType,
        reuse_queries: Option<Vec<String>>,
    ) -> AppResult<ResearchSnapshot> {
        self.owned_session(session_id, user_id).await?;
        let idea = self.require_idea(session_id).await?;

        let removed = self
            .storage
            .delete_research_snapshot(session_id, research_type)
            .await?;
        if removed > 0 {
            info!(session_id, research_type = %research_type, "Previous snapshot deleted");
        }

        let run = self.research.run(&idea, research_type, reuse_queries).await?;
        let snapshot = ResearchSnapshot::from_run(session_id, run);

        self.storage.insert_research_snapshot(&snapshot).await?;
        self.storage.mark_research_completed(session_id).await?;

        info!(
            session_id,
            snapshot_id = %snapshot.id,
            research_type = %research_type,
            results = snapshot.results.len(),
            possibly_failed = snapshot.possibly_failed,
            "Research snapshot stored"
        );
        Ok(snapshot)
    }

    pub async fn get_research(
        &self,
        session_id: &str,
        user_id: &str,
        research_type: ResearchType,
    ) -> AppResult<ResearchSnapshot> {
        self.owned_session(session_id, user_id).await?;
        self.storage
            .get_research_snapshot(session_id, research_type)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: format!("{} research", research_type),
            })
    }

    pub async fn research_status(&self, session_id: &str, user_id: &str) -> AppResult<ResearchStatus> {
        let session = self.owned_session(session_id, user_id).await?;
        let snapshots = self.storage.list_research_snapshots(session_id).await?;

        let types = ResearchType::ALL
            .iter()
            .map(|research_type| {
                let entry = match snapshots.iter().find(|s| s.research_type == *research_type) {
                    Some(snapshot) => ResearchTypeStatus {
                        completed: true,
                        snapshot_id: Some(snapshot.id.clone()),
                        status: Some(snapshot.status),
                        possibly_failed: snapshot.possibly_failed,
                        result_count: snapshot.results.len(),
                    },
                    None => ResearchTypeStatus {
                        completed: false,
                        snapshot_id: None,
                        status: None,
                        possibly_failed: false,
                        result_count: 0,
                    },
                };
                (research_type.as_str().to_string(), entry)
            })
            .collect();

        Ok(ResearchStatus {
            research_completed: session.research_completed,
            types,
        })
    }

    /// Run MVTA analysis and replace the stored damage report.
    ///
    /// A failed analysis marks the session `failed` before the error is
    /// returned, unless an earlier report is still stored; that session keeps
    /// its `completed` status and the earlier report.
    pub async fn run_analysis(&self, session_id: &str, user_id: &str) -> AppResult<DamageReport> {
        let session = self.owned_session(session_id, user_id).await?;
        let idea = self.require_idea(session_id).await?;

        let report = match self.analysis.analyze(&idea, None).await {
            Ok(report) => report,
            Err(err) => {
                warn!(session_id, error = %err, "Analysis failed");
                if session.analysis_completed {
                    return Err(err);
                }
                if let Err(status_err) = self
                    .storage
                    .update_session_status(session_id, SessionStatus::Failed)
                    .await
                {
                    warn!(session_id, error = %status_err, "Could not mark session failed");
                }
                return Err(err);
            }
        };

        self.storage.delete_damage_report(session_id).await?;
        let damage_report = DamageReport::new(session_id, report);
        self.storage.insert_damage_report(&damage_report).await?;
        self.storage.mark_analysis_completed(session_id).await?;

        info!(session_id, report_id = %damage_report.id, "Damage report stored");
        Ok(damage_report)
    }

    pub async fn get_report(&self, session_id: &str, user_id: &str) -> AppResult<DamageReport> {
        self.owned_session(session_id, user_id).await?;
        self.storage
            .get_damage_report(session_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Report".to_string(),
            })
    }
}
