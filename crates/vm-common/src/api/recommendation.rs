use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// One stored recommendation row with the volunteer it points at.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationView {
    pub volunteer_id: String,
    pub volunteer_name: String,
    pub rank: i32,
    pub score: f64,
    pub score_breakdown: Option<Value>,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventRecommendations {
    pub event_id: String,
    pub match_run_id: Option<String>,
    pub engine_version: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub volunteers: Vec<RecommendationView>,
}

/// An event the volunteer was picked for in its latest run.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedEvent {
    pub event_id: String,
    pub title: String,
    pub organization_id: String,
    pub organization_name: Option<String>,
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub rank: i32,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub event_id: String,
    pub match_run_id: String,
    pub engine_version: &'static str,
    pub scored: usize,
    pub stored: u64,
    pub notified: u64,
}
