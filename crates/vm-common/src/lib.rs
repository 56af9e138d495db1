pub mod api;
pub mod db;
pub mod logging;
pub mod matching;
pub mod normalize;
pub mod run_id;
pub mod workflow;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// Commonly used data models for matching and storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: String,
    pub display_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub available_days: Vec<String>,
    pub available_times: Vec<String>,
    /// Titles of events this volunteer has completed (checked out of).
    #[serde(default)]
    pub past_event_titles: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub display_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub volunteers_needed: Option<u32>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub contact_name: Option<String>,
    pub contact_info: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Fresh sortable id for a newly posted event.
    pub fn new_id() -> String {
        run_id::generate()
    }

    /// An event without a date never becomes "past".
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date.is_some_and(|date| date < today)
    }
}
