use serde::Serialize;

use super::{
    availability::{available_weekdays, event_weekday, parse_time_range, weekday_name},
    location::{LocationMatch, evaluate_location},
    skills::{count_same_titles, tag_overlap},
    weights::{DEFAULT_WEIGHTS, MatchWeights},
};
use crate::{Event, Volunteer};

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub weights: MatchWeights,
    /// Recommendations kept when the event does not say how many volunteers it needs.
    pub default_top_n: usize,
    /// How many past participations are compared against the event title.
    pub history_lookback: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            default_top_n: 5,
            history_lookback: 10,
        }
    }
}

impl MatchingConfig {
    pub fn top_n_for(&self, event: &Event) -> usize {
        match event.volunteers_needed {
            Some(n) if n > 0 => n as usize,
            _ => self.default_top_n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorScore {
    pub points: f64,
    /// Overlapping items (tags, past events); 1/0 for yes-no factors.
    pub matched: usize,
    pub status: &'static str,
    pub details: String,
}

impl FactorScore {
    fn unknown(details: impl Into<String>) -> Self {
        Self {
            points: 0.0,
            matched: 0,
            status: "UNKNOWN",
            details: details.into(),
        }
    }

    fn hit(points: f64, details: impl Into<String>) -> Self {
        Self {
            points,
            matched: 1,
            status: "MATCH",
            details: details.into(),
        }
    }

    fn miss(details: impl Into<String>) -> Self {
        Self {
            points: 0.0,
            matched: 0,
            status: "MISS",
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub total: f64,
    pub location: FactorScore,
    pub availability: FactorScore,
    pub day: FactorScore,
    pub skills: FactorScore,
    pub interests: FactorScore,
    pub history: FactorScore,
}

pub struct VolunteerScorer {
    config: MatchingConfig,
}

impl VolunteerScorer {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    pub fn calculate_match_score(&self, event: &Event, volunteer: &Volunteer) -> MatchScore {
        let location = self.score_location(event, volunteer);
        let availability = self.score_availability(event, volunteer);
        let day = self.score_day(event, volunteer);
        let skills = self.score_tags(
            &event.skills,
            &volunteer.skills,
            self.config.weights.per_skill,
            "skills",
        );
        let interests = self.score_tags(
            &event.interests,
            &volunteer.interests,
            self.config.weights.per_interest,
            "interests",
        );
        let history = self.score_history(event, volunteer);

        let total = location.points
            + availability.points
            + day.points
            + skills.points
            + interests.points
            + history.points;

        MatchScore {
            total,
            location,
            availability,
            day,
            skills,
            interests,
            history,
        }
    }

    fn score_location(&self, event: &Event, volunteer: &Volunteer) -> FactorScore {
        match evaluate_location(volunteer.location.as_deref(), event.city.as_deref()) {
            LocationMatch::Match => FactorScore::hit(
                self.config.weights.location,
                format!(
                    "{} is in {}",
                    event.city.as_deref().unwrap_or_default(),
                    volunteer.location.as_deref().unwrap_or_default()
                ),
            ),
            LocationMatch::Miss => FactorScore::miss(format!(
                "{} not in {}",
                event.city.as_deref().unwrap_or_default(),
                volunteer.location.as_deref().unwrap_or_default()
            )),
            LocationMatch::Unknown => FactorScore::unknown("city or volunteer location missing"),
        }
    }

    fn score_availability(&self, event: &Event, volunteer: &Volunteer) -> FactorScore {
        let Some(slot) = event.time_slot.as_deref() else {
            return FactorScore::unknown("event has no time slot");
        };
        if volunteer.available_times.is_empty() {
            return FactorScore::unknown("volunteer has no available times");
        }

        let event_range = parse_time_range(slot);
        let hit = volunteer
            .available_times
            .iter()
            .find(|range| parse_time_range(range).overlaps(&event_range));

        match hit {
            Some(range) => FactorScore::hit(
                self.config.weights.availability,
                format!("{range} overlaps {slot}"),
            ),
            None => FactorScore::miss(format!("no available time overlaps {slot}")),
        }
    }

    fn score_day(&self, event: &Event, volunteer: &Volunteer) -> FactorScore {
        let Some(date) = event.date else {
            return FactorScore::unknown("event has no date");
        };
        if volunteer.available_days.is_empty() {
            return FactorScore::unknown("volunteer has no available days");
        }

        let weekday = event_weekday(date);
        if available_weekdays(&volunteer.available_days).contains(&weekday) {
            FactorScore::hit(
                self.config.weights.day,
                format!("available on {}", weekday_name(weekday)),
            )
        } else {
            FactorScore::miss(format!("not available on {}", weekday_name(weekday)))
        }
    }

    fn score_tags(
        &self,
        event_tags: &[String],
        volunteer_tags: &[String],
        per_item: f64,
        label: &str,
    ) -> FactorScore {
        let overlap = tag_overlap(event_tags, volunteer_tags);
        if overlap.requested() == 0 {
            return FactorScore::unknown(format!("event lists no {label}"));
        }

        let matched = overlap.count();
        let status = if matched == overlap.requested() {
            "MATCH"
        } else if matched > 0 {
            "PARTIAL_MATCH"
        } else {
            "MISS"
        };

        let details = if matched > 0 {
            format!(
                "{matched}/{} {label}: {}",
                overlap.requested(),
                overlap.matched.join(", ")
            )
        } else {
            format!("0/{} {label}", overlap.requested())
        };

        FactorScore {
            points: per_item * matched as f64,
            matched,
            status,
            details,
        }
    }

    fn score_history(&self, event: &Event, volunteer: &Volunteer) -> FactorScore {
        if volunteer.past_event_titles.is_empty() {
            return FactorScore::unknown("no past participation");
        }

        let repeats = count_same_titles(
            &volunteer.past_event_titles,
            &event.title,
            self.config.history_lookback,
        );
        if repeats == 0 {
            return FactorScore::miss("no similar past events");
        }

        FactorScore {
            points: self.config.weights.per_past_event * repeats as f64,
            matched: repeats,
            status: "MATCH",
            details: format!("joined '{}' {repeats} time(s) before", event.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn full_event() -> Event {
        Event {
            id: "evt-1".into(),
            organization_id: "org-1".into(),
            title: "Beach Cleanup".into(),
            city: Some("Chennai".into()),
            skills: strings(&["Teamwork", "First Aid"]),
            interests: strings(&["Environment"]),
            volunteers_needed: Some(3),
            // Saturday
            date: NaiveDate::from_ymd_opt(2024, 6, 1),
            time_slot: Some("9AM-12PM".into()),
            ..Event::default()
        }
    }

    fn full_volunteer() -> Volunteer {
        Volunteer {
            id: "vol-1".into(),
            name: "Asha".into(),
            location: Some("Adyar, Chennai".into()),
            skills: strings(&["teamwork", "first aid", "cooking"]),
            interests: strings(&["environment"]),
            available_days: strings(&["weekends"]),
            available_times: strings(&["8AM-11AM"]),
            past_event_titles: strings(&["Beach Cleanup"]),
            ..Volunteer::default()
        }
    }

    #[test]
    fn perfect_match_sums_every_factor() {
        let scorer = VolunteerScorer::new(MatchingConfig::default());
        let score = scorer.calculate_match_score(&full_event(), &full_volunteer());

        assert_eq!(score.location.status, "MATCH");
        assert_eq!(score.availability.status, "MATCH");
        assert_eq!(score.day.status, "MATCH");
        assert_eq!(score.skills.status, "MATCH");
        assert_eq!(score.interests.status, "MATCH");
        assert_eq!(score.history.status, "MATCH");
        assert_eq!(score.total, 10.0 + 4.0 + 3.0 + 20.0 + 7.0 + 4.0);
    }

    #[test]
    fn partial_skill_overlap_scores_per_item() {
        let scorer = VolunteerScorer::new(MatchingConfig::default());
        let mut volunteer = full_volunteer();
        volunteer.skills = strings(&["Teamwork"]);

        let score = scorer.calculate_match_score(&full_event(), &volunteer);
        assert_eq!(score.skills.status, "PARTIAL_MATCH");
        assert_eq!(score.skills.points, 10.0);
        assert!(score.skills.details.contains("1/2"));
    }

    #[test]
    fn missing_inputs_score_zero_as_unknown() {
        let scorer = VolunteerScorer::new(MatchingConfig::default());
        let mut event = full_event();
        event.time_slot = None;
        event.date = None;
        event.city = None;
        let volunteer = Volunteer {
            id: "vol-2".into(),
            ..Volunteer::default()
        };

        let score = scorer.calculate_match_score(&event, &volunteer);
        assert_eq!(score.location.status, "UNKNOWN");
        assert_eq!(score.availability.status, "UNKNOWN");
        assert_eq!(score.day.status, "UNKNOWN");
        assert_eq!(score.history.status, "UNKNOWN");
        assert_eq!(score.skills.status, "MISS");
        assert_eq!(score.total, 0.0);
    }

    #[test]
    fn weekday_only_volunteer_misses_saturday_event() {
        let scorer = VolunteerScorer::new(MatchingConfig::default());
        let mut volunteer = full_volunteer();
        volunteer.available_days = strings(&["weekdays"]);

        let score = scorer.calculate_match_score(&full_event(), &volunteer);
        assert_eq!(score.day.status, "MISS");
        assert!(score.day.details.contains("saturday"));
    }

    #[test]
    fn non_overlapping_time_misses() {
        let scorer = VolunteerScorer::new(MatchingConfig::default());
        let mut volunteer = full_volunteer();
        volunteer.available_times = strings(&["12PM-5PM", "garbage"]);

        let score = scorer.calculate_match_score(&full_event(), &volunteer);
        assert_eq!(score.availability.status, "MISS");
        assert_eq!(score.availability.points, 0.0);
    }

    #[test]
    fn history_counts_repeated_titles_within_lookback() {
        let config = MatchingConfig {
            history_lookback: 2,
            ..MatchingConfig::default()
        };
        let scorer = VolunteerScorer::new(config);
        let mut volunteer = full_volunteer();
        volunteer.past_event_titles = strings(&["beach cleanup", "Beach Cleanup", "Beach Cleanup"]);

        let score = scorer.calculate_match_score(&full_event(), &volunteer);
        assert_eq!(score.history.matched, 2);
        assert_eq!(score.history.points, 8.0);
    }

    #[test]
    fn top_n_defaults_when_event_needs_nobody() {
        let config = MatchingConfig::default();
        let mut event = full_event();
        assert_eq!(config.top_n_for(&event), 3);
        event.volunteers_needed = Some(0);
        assert_eq!(config.top_n_for(&event), 5);
        event.volunteers_needed = None;
        assert_eq!(config.top_n_for(&event), 5);
    }
}
