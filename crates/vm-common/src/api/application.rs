use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::{ApplicationStatus, Decision};

#[derive(Debug, Clone, Serialize)]
pub struct ApplyResponse {
    pub event_id: String,
    pub status: ApplicationStatus,
    /// `false` when the volunteer had already applied.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantView {
    pub volunteer_id: String,
    pub display_id: Option<String>,
    pub name: String,
    pub email: String,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub status: ApplicationStatus,
    pub recommended: bool,
    pub applied_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Roster of one event grouped by application status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationRoster {
    pub event_id: String,
    pub registered: Vec<ApplicantView>,
    pub accepted: Vec<ApplicantView>,
    pub rejected: Vec<ApplicantView>,
}

impl ApplicationRoster {
    pub fn from_applicants(event_id: &str, applicants: Vec<ApplicantView>) -> Self {
        let mut roster = Self {
            event_id: event_id.to_string(),
            ..Self::default()
        };
        for applicant in applicants {
            match applicant.status {
                ApplicationStatus::Registered => roster.registered.push(applicant),
                ApplicationStatus::Accepted => roster.accepted.push(applicant),
                ApplicationStatus::Rejected => roster.rejected.push(applicant),
            }
        }
        roster
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    pub event_id: String,
    pub volunteer_id: String,
    pub status: ApplicationStatus,
    pub changed: bool,
    pub notification_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant(id: &str, status: ApplicationStatus) -> ApplicantView {
        ApplicantView {
            volunteer_id: id.into(),
            display_id: None,
            name: id.into(),
            email: format!("{id}@example.org"),
            location: None,
            skills: Vec::new(),
            interests: Vec::new(),
            status,
            recommended: false,
            applied_at: Utc::now(),
            decided_at: None,
        }
    }

    #[test]
    fn roster_groups_by_status() {
        let roster = ApplicationRoster::from_applicants(
            "evt-1",
            vec![
                applicant("a", ApplicationStatus::Registered),
                applicant("b", ApplicationStatus::Accepted),
                applicant("c", ApplicationStatus::Registered),
                applicant("d", ApplicationStatus::Rejected),
            ],
        );
        assert_eq!(roster.registered.len(), 2);
        assert_eq!(roster.accepted[0].volunteer_id, "b");
        assert_eq!(roster.rejected[0].volunteer_id, "d");
    }

    #[test]
    fn decision_body_parses() {
        let body: DecisionRequest = serde_json::from_str(r#"{"decision":"reject"}"#).unwrap();
        assert_eq!(body.decision, Decision::Reject);
        assert!(serde_json::from_str::<DecisionRequest>(r#"{"decision":"maybe"}"#).is_err());
    }
}
