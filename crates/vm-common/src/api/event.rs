use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ValidationError, check_length, required_text};
use crate::Event;
use crate::matching::availability::parse_time_range;
use crate::normalize::{clean_tags, non_blank};

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 8000;
const MAX_VOLUNTEERS_NEEDED: i64 = 10_000;

/// Body of `POST /api/events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub volunteers_needed: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_info: Option<String>,
}

fn validate_volunteers_needed(value: i64) -> Result<u32, ValidationError> {
    if !(1..=MAX_VOLUNTEERS_NEEDED).contains(&value) {
        return Err(ValidationError::invalid(
            "volunteers_needed",
            format!("must be between 1 and {MAX_VOLUNTEERS_NEEDED}"),
        ));
    }
    Ok(value as u32)
}

fn validate_time_slot(value: Option<String>) -> Result<Option<String>, ValidationError> {
    let slot = non_blank(value);
    if let Some(raw) = slot.as_deref() {
        if parse_time_range(raw).is_empty() {
            return Err(ValidationError::invalid(
                "time_slot",
                format!("expected a range like 9AM-12PM, got '{raw}'"),
            ));
        }
    }
    Ok(slot)
}

fn validate_description(value: Option<String>) -> Result<Option<String>, ValidationError> {
    let description = non_blank(value);
    if let Some(text) = description.as_deref() {
        check_length(text, "description", MAX_DESCRIPTION_LEN)?;
    }
    Ok(description)
}

impl EventRequest {
    /// Clean the request into an [`Event`] owned by `organization_id`.
    pub fn into_event(self, id: String, organization_id: &str) -> Result<Event, ValidationError> {
        let title = required_text(&self.title, "title")?;
        check_length(&title, "title", MAX_TITLE_LEN)?;

        Ok(Event {
            id,
            organization_id: organization_id.to_string(),
            title,
            description: validate_description(self.description)?,
            image_url: non_blank(self.image_url),
            venue: non_blank(self.venue),
            city: non_blank(self.city),
            skills: clean_tags(&self.skills),
            interests: clean_tags(&self.interests),
            volunteers_needed: self
                .volunteers_needed
                .map(validate_volunteers_needed)
                .transpose()?,
            date: self.date,
            time_slot: validate_time_slot(self.time_slot)?,
            contact_name: non_blank(self.contact_name),
            contact_info: non_blank(self.contact_info),
            created_at: None,
        })
    }
}

/// Body of `PUT /api/events/:id`; absent fields keep their value and blank
/// text clears optional fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub venue: Option<String>,
    pub city: Option<String>,
    pub skills: Option<Vec<String>>,
    pub interests: Option<Vec<String>>,
    pub volunteers_needed: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub contact_name: Option<String>,
    pub contact_info: Option<String>,
}

impl EventUpdateRequest {
    pub fn apply_to(self, event: &mut Event) -> Result<(), ValidationError> {
        if let Some(title) = self.title {
            let title = required_text(&title, "title")?;
            check_length(&title, "title", MAX_TITLE_LEN)?;
            event.title = title;
        }
        if self.description.is_some() {
            event.description = validate_description(self.description)?;
        }
        if self.image_url.is_some() {
            event.image_url = non_blank(self.image_url);
        }
        if self.venue.is_some() {
            event.venue = non_blank(self.venue);
        }
        if self.city.is_some() {
            event.city = non_blank(self.city);
        }
        if let Some(skills) = self.skills {
            event.skills = clean_tags(&skills);
        }
        if let Some(interests) = self.interests {
            event.interests = clean_tags(&interests);
        }
        if let Some(needed) = self.volunteers_needed {
            event.volunteers_needed = Some(validate_volunteers_needed(needed)?);
        }
        if self.date.is_some() {
            event.date = self.date;
        }
        if self.time_slot.is_some() {
            event.time_slot = validate_time_slot(self.time_slot)?;
        }
        if self.contact_name.is_some() {
            event.contact_name = non_blank(self.contact_name);
        }
        if self.contact_info.is_some() {
            event.contact_info = non_blank(self.contact_info);
        }
        Ok(())
    }

    /// Whether the change can alter who the recommender would pick.
    pub fn touches_matching_inputs(&self) -> bool {
        self.title.is_some()
            || self.city.is_some()
            || self.skills.is_some()
            || self.interests.is_some()
            || self.volunteers_needed.is_some()
            || self.date.is_some()
            || self.time_slot.is_some()
    }
}

/// Response of `POST /api/events`.
#[derive(Debug, Clone, Serialize)]
pub struct PostedEvent {
    pub event: Event,
    /// `None` when matching failed; the event is stored either way.
    pub match_run_id: Option<String>,
    pub recommended_volunteer_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EventRequest {
        EventRequest {
            title: " Beach Cleanup ".into(),
            city: Some("Chennai".into()),
            skills: vec!["Teamwork".into(), " teamwork".into()],
            volunteers_needed: Some(4),
            time_slot: Some("9AM-12PM".into()),
            venue: Some("".into()),
            ..Default::default()
        }
    }

    #[test]
    fn builds_clean_event() {
        let event = request().into_event("evt-1".into(), "org-1").unwrap();
        assert_eq!(event.title, "Beach Cleanup");
        assert_eq!(event.skills, vec!["Teamwork".to_string()]);
        assert_eq!(event.volunteers_needed, Some(4));
        assert_eq!(event.venue, None);
        assert_eq!(event.organization_id, "org-1");
    }

    #[test]
    fn rejects_bad_capacity_and_slot() {
        let mut zero = request();
        zero.volunteers_needed = Some(0);
        assert!(matches!(
            zero.into_event("e".into(), "o"),
            Err(ValidationError::Invalid {
                field: "volunteers_needed",
                ..
            })
        ));

        let mut slot = request();
        slot.time_slot = Some("all day".into());
        assert!(matches!(
            slot.into_event("e".into(), "o"),
            Err(ValidationError::Invalid {
                field: "time_slot",
                ..
            })
        ));
    }

    #[test]
    fn update_keeps_absent_fields() {
        let mut event = request().into_event("evt-1".into(), "org-1").unwrap();
        let update = EventUpdateRequest {
            city: Some("  ".into()),
            volunteers_needed: Some(8),
            ..Default::default()
        };
        assert!(update.touches_matching_inputs());
        update.apply_to(&mut event).unwrap();

        assert_eq!(event.city, None);
        assert_eq!(event.volunteers_needed, Some(8));
        assert_eq!(event.title, "Beach Cleanup");
        assert_eq!(event.time_slot.as_deref(), Some("9AM-12PM"));
    }

    #[test]
    fn contact_only_update_does_not_rematch() {
        let update = EventUpdateRequest {
            contact_name: Some("Ravi".into()),
            ..Default::default()
        };
        assert!(!update.touches_matching_inputs());
    }
}
