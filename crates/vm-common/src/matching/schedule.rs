use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{
    availability::{available_weekdays, weekday_name},
    similarity::InterestEmbedder,
};
use crate::{Volunteer, normalize::clean_tags};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("interests must not be empty")]
    MissingInterests,
    #[error("volunteers_needed must be positive")]
    InvalidVolunteersNeeded,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub event_name: String,
    #[serde(default)]
    pub event_description: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default = "default_volunteers_needed")]
    pub volunteers_needed: i64,
}

const fn default_volunteers_needed() -> i64 {
    1
}

impl ScheduleRequest {
    /// Cleaned interests and the headcount to seat.
    pub fn validate(&self) -> Result<(Vec<String>, usize), ScheduleError> {
        let interests = clean_tags(&self.interests);
        if interests.is_empty() {
            return Err(ScheduleError::MissingInterests);
        }
        if self.volunteers_needed <= 0 {
            return Err(ScheduleError::InvalidVolunteersNeeded);
        }
        Ok((interests, self.volunteers_needed as usize))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSuggestion {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub time_slot: String,
    pub volunteer_ids: Vec<String>,
    pub volunteer_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Minimum interest similarity for a volunteer to count toward a slot.
    pub similarity_threshold: f32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.05,
        }
    }
}

impl ScheduleConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            similarity_threshold: std::env::var("VM_SCHEDULE_SIMILARITY_THRESHOLD")
                .ok()
                .and_then(|raw| raw.parse::<f32>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(default.similarity_threshold),
        }
    }
}

struct Slot<'a> {
    time: String,
    volunteers: Vec<&'a Volunteer>,
}

/// Time slots for one weekday, both kept in first-seen order.
struct DaySlots<'a> {
    day: Weekday,
    slots: Vec<Slot<'a>>,
}

impl<'a> DaySlots<'a> {
    fn add(&mut self, time: &str, volunteer: &'a Volunteer) {
        let idx = match self.slots.iter().position(|s| s.time == time) {
            Some(idx) => idx,
            None => {
                self.slots.push(Slot {
                    time: time.to_string(),
                    volunteers: Vec::new(),
                });
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[idx];
        if !slot.volunteers.iter().any(|v| v.id == volunteer.id) {
            slot.volunteers.push(volunteer);
        }
    }
}

/// Pick the weekday + time slot where the most interested volunteers are free.
///
/// Only slots that can seat `volunteers_needed` qualify and today's weekday
/// is skipped. Ties go to the first weekday seen, then to that day's first
/// time slot seen. Returns `Ok(None)` when no slot qualifies.
pub fn suggest_schedule(
    request: &ScheduleRequest,
    volunteers: &[Volunteer],
    today: NaiveDate,
    config: &ScheduleConfig,
) -> Result<Option<ScheduleSuggestion>, ScheduleError> {
    let (interests, needed) = request.validate()?;

    let embedder = InterestEmbedder::default();
    let event_vector = embedder.embed(&interests);
    let mut days: Vec<DaySlots<'_>> = Vec::new();

    for volunteer in volunteers {
        if volunteer.interests.is_empty()
            || volunteer.available_days.is_empty()
            || volunteer.available_times.is_empty()
        {
            continue;
        }

        let similarity = super::similarity::cosine_similarity(
            &event_vector,
            &embedder.embed(&volunteer.interests),
        );
        debug!(volunteer_id = %volunteer.id, similarity, "schedule interest similarity");
        if similarity <= config.similarity_threshold {
            continue;
        }

        for day in available_weekdays(&volunteer.available_days) {
            let idx = match days.iter().position(|d| d.day == day) {
                Some(idx) => idx,
                None => {
                    days.push(DaySlots {
                        day,
                        slots: Vec::new(),
                    });
                    days.len() - 1
                }
            };
            for time in &volunteer.available_times {
                let time = time.trim();
                if !time.is_empty() {
                    days[idx].add(time, volunteer);
                }
            }
        }
    }

    let today_weekday = today.weekday();
    let mut best: Option<(Weekday, &Slot<'_>)> = None;
    for day_slots in days.iter().filter(|d| d.day != today_weekday) {
        for slot in &day_slots.slots {
            if slot.volunteers.len() < needed {
                continue;
            }
            if best.is_none_or(|(_, b)| slot.volunteers.len() > b.volunteers.len()) {
                best = Some((day_slots.day, slot));
            }
        }
    }

    let Some((best_day, best)) = best else {
        debug!(event_name = %request.event_name, days = days.len(), "no schedule slot qualifies");
        return Ok(None);
    };

    let days_ahead = (best_day.num_days_from_monday() as i64
        - today_weekday.num_days_from_monday() as i64
        + 7)
        % 7;
    let chosen: Vec<&Volunteer> = best.volunteers.iter().take(needed).copied().collect();

    Ok(Some(ScheduleSuggestion {
        date: today + Duration::days(days_ahead),
        weekday: weekday_name(best_day),
        time_slot: best.time.clone(),
        volunteer_ids: chosen.iter().map(|v| v.id.clone()).collect(),
        volunteer_names: chosen.iter().map(|v| v.name.clone()).collect(),
    }))
}
