use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Event;
use crate::workflow::ScanAction;

/// QR payload handed to an accepted volunteer.
#[derive(Debug, Clone, Serialize)]
pub struct CheckinTokenResponse {
    pub token: String,
    pub event_id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub venue: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub action: ScanAction,
    pub event_id: String,
    pub volunteer_id: String,
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub hours_contributed: Option<f64>,
    pub certificate_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpcomingEvent {
    #[serde(flatten)]
    pub event: Event,
    pub organization_name: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participation {
    pub event_id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub hours_contributed: f64,
    pub checked_out_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParticipationSummary {
    pub events: Vec<Participation>,
    pub total_hours: f64,
}

impl ParticipationSummary {
    pub fn from_events(events: Vec<Participation>) -> Self {
        let total: f64 = events.iter().map(|p| p.hours_contributed).sum();
        Self {
            events,
            total_hours: (total * 100.0).round() / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    pub id: i64,
    pub volunteer_id: String,
    pub event_id: String,
    pub event_title: String,
    pub organization_name: Option<String>,
    pub issue_date: NaiveDate,
    pub volunteer_hours: f64,
    pub skills: Vec<String>,
}
