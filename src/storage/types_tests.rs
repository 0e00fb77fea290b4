//! Unit tests for storage types and builder patterns.
//!
//! Covers Session, SessionStatus, ResearchSnapshot, DamageReport and
//! UserProfile construction and serialization.

use super::*;
use crate::analysis::fixtures::valid_report;
use crate::research::{Competitor, Stage};
use serde_json::json;

// ============================================================================
// Session tests
// ============================================================================

#[test]
fn test_session_new() {
    let session = Session::new("user-1");
    assert!(!session.id.is_empty());
    assert_eq!(session.user_id, "user-1");
    assert_eq!(session.status, SessionStatus::Intake);
    assert!(!session.research_completed);
    assert!(!session.analysis_completed);
    assert_eq!(session.created_at, session.updated_at);
}

#[test]
fn test_session_ids_are_unique() {
    assert_ne!(Session::new("u").id, Session::new("u").id);
}

#[test]
fn test_session_status_display_and_parse() {
    for status in [
        SessionStatus::Intake,
        SessionStatus::Choice,
        SessionStatus::Completed,
        SessionStatus::Failed,
    ] {
        assert_eq!(status.to_string().parse::<SessionStatus>().unwrap(), status);
    }
    assert_eq!("CHOICE".parse::<SessionStatus>().unwrap(), SessionStatus::Choice);
    assert!("archived".parse::<SessionStatus>().is_err());
}

#[test]
fn test_session_summary_flattens() {
    let summary = SessionSummary {
        session: Session::new("user-1"),
        high_concept: Some("Dog walking".to_string()),
    };
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["user_id"], "user-1");
    assert_eq!(value["status"], "intake");
    assert_eq!(value["high_concept"], "Dog walking");
}

// ============================================================================
// ResearchSnapshot tests
// ============================================================================

fn competitor(name: &str) -> Competitor {
    Competitor {
        name: name.to_string(),
        description: "Pet care marketplace".to_string(),
        url: format!("https://{}.com", name.to_lowercase()),
        strengths: vec![],
        weaknesses: vec![],
        pricing: None,
        market_position: None,
    }
}

fn run_with(findings: ResearchFindings, queries: Vec<String>) -> ResearchRun {
    ResearchRun {
        research_type: findings.research_type(),
        queries,
        findings,
        status: RunStatus::Succeeded,
        failure: None,
        search_answer: Some("Several incumbents".to_string()),
        search_errors: vec![],
        sources_considered: 2,
    }
}

#[test]
fn test_snapshot_from_successful_run() {
    let run = run_with(
        ResearchFindings::Competitor(vec![competitor("Rover"), competitor("Wag")]),
        vec!["dog walking apps".to_string()],
    );
    let snapshot = ResearchSnapshot::from_run("sess-1", run);

    assert_eq!(snapshot.session_id, "sess-1");
    assert_eq!(snapshot.research_type, ResearchType::Competitor);
    assert_eq!(snapshot.results.len(), 2);
    assert_eq!(snapshot.sources_considered, 2);
    assert!(!snapshot.possibly_failed);
}

#[test]
fn test_snapshot_possibly_failed_when_queries_yield_nothing() {
    let run = run_with(
        ResearchFindings::empty(ResearchType::Community),
        vec!["dog owners reddit".to_string()],
    );
    assert!(ResearchSnapshot::from_run("sess-1", run).possibly_failed);
}

#[test]
fn test_snapshot_serializes_results_as_array() {
    let mut run = run_with(
        ResearchFindings::empty(ResearchType::Regulatory),
        vec!["pet care licensing".to_string()],
    );
    run.status = RunStatus::Degraded;
    run.failure = Some(StageFailure {
        stage: Stage::Synthesis,
        message: "bad json".to_string(),
    });

    let value = serde_json::to_value(ResearchSnapshot::from_run("sess-1", run)).unwrap();
    assert_eq!(value["research_type"], "regulatory");
    assert_eq!(value["results"], json!([]));
    assert_eq!(value["status"], "degraded");
    assert_eq!(value["failure"]["stage"], "synthesis");
    assert_eq!(value["possibly_failed"], true);
}

// ============================================================================
// DamageReport / UserProfile tests
// ============================================================================

#[test]
fn test_damage_report_new() {
    let report = DamageReport::new("sess-1", valid_report());
    assert!(!report.id.is_empty());
    assert_eq!(report.session_id, "sess-1");
    assert_eq!(report.report.vector_synthesis.len(), 5);
}

#[test]
fn test_user_profile_builder() {
    let profile = UserProfile::new("user-1")
        .with_email("founder@example.com")
        .with_member_level(1);
    assert_eq!(profile.email.as_deref(), Some("founder@example.com"));
    assert_eq!(profile.member_level, 1);

    let clamped = UserProfile::new("user-2").with_member_level(-3);
    assert_eq!(clamped.member_level, 0);
}

#[test]
fn test_format_timestamp_is_fixed_width() {
    let a = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let b = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00.123456789Z")
        .unwrap()
        .with_timezone(&Utc);
    assert_eq!(format_timestamp(&a), "2026-01-01T00:00:00.000000Z");
    assert_eq!(format_timestamp(&a).len(), format_timestamp(&b).len());
    assert!(format_timestamp(&a) < format_timestamp(&b));
}
