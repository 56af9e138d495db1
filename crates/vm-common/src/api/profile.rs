use serde::{Deserialize, Serialize};

use super::{ValidationError, check_length, required_text};
use crate::matching::availability::{expand_day, parse_time_range};
use crate::normalize::{clean_tags, non_blank};
use crate::{Organization, Volunteer};

const MAX_NAME_LEN: usize = 120;
const MAX_TAGS: usize = 50;

/// Body of `POST /api/volunteers` and `PUT /api/volunteers/me`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolunteerProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub available_days: Vec<String>,
    #[serde(default)]
    pub available_times: Vec<String>,
}

/// Cleaned profile fields ready for storage.
#[derive(Debug, Clone, PartialEq)]
pub struct VolunteerProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub interests: Vec<String>,
    pub available_days: Vec<String>,
    pub available_times: Vec<String>,
}

fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = required_text(raw, "email")?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ValidationError::invalid("email", "not an email address")),
    }
}

fn bounded_tags(tags: &[String], field: &'static str) -> Result<Vec<String>, ValidationError> {
    let cleaned = clean_tags(tags);
    if cleaned.len() > MAX_TAGS {
        return Err(ValidationError::invalid(
            field,
            format!("at most {MAX_TAGS} entries"),
        ));
    }
    Ok(cleaned)
}

impl VolunteerProfileRequest {
    pub fn validate(self) -> Result<VolunteerProfile, ValidationError> {
        let name = required_text(&self.name, "name")?;
        check_length(&name, "name", MAX_NAME_LEN)?;
        let email = validate_email(&self.email)?;

        let available_days = bounded_tags(&self.available_days, "available_days")?;
        if let Some(bad) = available_days.iter().find(|d| expand_day(d).is_empty()) {
            return Err(ValidationError::invalid(
                "available_days",
                format!("unknown day '{bad}'"),
            ));
        }

        let available_times = bounded_tags(&self.available_times, "available_times")?;
        if let Some(bad) = available_times
            .iter()
            .find(|t| parse_time_range(t).is_empty())
        {
            return Err(ValidationError::invalid(
                "available_times",
                format!("expected a range like 9AM-12PM, got '{bad}'"),
            ));
        }

        Ok(VolunteerProfile {
            name,
            email,
            phone: non_blank(self.phone),
            location: non_blank(self.location),
            skills: bounded_tags(&self.skills, "skills")?,
            interests: bounded_tags(&self.interests, "interests")?,
            available_days,
            available_times,
        })
    }
}

/// Body of `POST /api/organizations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationProfileRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationProfile {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl OrganizationProfileRequest {
    pub fn validate(self) -> Result<OrganizationProfile, ValidationError> {
        let name = required_text(&self.name, "name")?;
        check_length(&name, "name", MAX_NAME_LEN)?;
        let description = non_blank(self.description);
        if let Some(text) = description.as_deref() {
            check_length(text, "description", 4000)?;
        }

        Ok(OrganizationProfile {
            name,
            email: validate_email(&self.email)?,
            phone: non_blank(self.phone),
            location: non_blank(self.location),
            description,
        })
    }
}

/// `GET /api/me`
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum MeResponse {
    Volunteer { profile: Volunteer },
    Organization { profile: Organization },
    Service,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VolunteerProfileRequest {
        VolunteerProfileRequest {
            name: "  Asha Rao ".into(),
            email: "asha@example.org".into(),
            phone: Some("  ".into()),
            location: Some("Adyar, Chennai".into()),
            skills: vec!["Teaching".into(), "teaching".into(), "".into()],
            interests: vec!["Environment".into()],
            available_days: vec!["Weekends".into(), "monday".into()],
            available_times: vec!["9AM-12PM".into()],
        }
    }

    #[test]
    fn cleans_volunteer_profile() {
        let profile = request().validate().unwrap();
        assert_eq!(profile.name, "Asha Rao");
        assert_eq!(profile.phone, None);
        assert_eq!(profile.skills, vec!["Teaching".to_string()]);
        assert_eq!(profile.available_days.len(), 2);
    }

    #[test]
    fn rejects_unknown_days_and_bad_times() {
        let mut bad_day = request();
        bad_day.available_days = vec!["someday".into()];
        assert!(matches!(
            bad_day.validate(),
            Err(ValidationError::Invalid {
                field: "available_days",
                ..
            })
        ));

        let mut bad_time = request();
        bad_time.available_times = vec!["mornings".into()];
        assert!(matches!(
            bad_time.validate(),
            Err(ValidationError::Invalid {
                field: "available_times",
                ..
            })
        ));
    }

    #[test]
    fn requires_name_and_valid_email() {
        let mut missing = request();
        missing.name = "   ".into();
        assert_eq!(missing.validate(), Err(ValidationError::Missing("name")));

        let org = OrganizationProfileRequest {
            name: "Green Earth".into(),
            email: "not-an-email".into(),
            ..Default::default()
        };
        assert!(matches!(
            org.validate(),
            Err(ValidationError::Invalid { field: "email", .. })
        ));
    }
}
