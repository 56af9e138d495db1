use crate::normalize::tag_key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationMatch {
    /// The event city appears inside the volunteer's location text.
    Match,
    Miss,
    /// Either side is missing or blank.
    Unknown,
}

/// Compare the event city against the volunteer's free-text location.
///
/// `"Indiranagar, Bengaluru"` matches the city `"bengaluru"`. A blank city
/// never matches, otherwise every volunteer would.
pub fn evaluate_location(volunteer_location: Option<&str>, event_city: Option<&str>) -> LocationMatch {
    let location = volunteer_location.map(tag_key).filter(|s| !s.is_empty());
    let city = event_city.map(tag_key).filter(|s| !s.is_empty());

    match (location, city) {
        (Some(location), Some(city)) if location.contains(&city) => LocationMatch::Match,
        (Some(_), Some(_)) => LocationMatch::Miss,
        _ => LocationMatch::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_substring_matches_case_insensitively() {
        assert_eq!(
            evaluate_location(Some("Indiranagar, Bengaluru"), Some("BENGALURU")),
            LocationMatch::Match
        );
    }

    #[test]
    fn different_city_misses() {
        assert_eq!(
            evaluate_location(Some("Chennai"), Some("Mumbai")),
            LocationMatch::Miss
        );
    }

    #[test]
    fn blank_inputs_are_unknown() {
        assert_eq!(evaluate_location(Some("Pune"), Some("  ")), LocationMatch::Unknown);
        assert_eq!(evaluate_location(None, Some("Pune")), LocationMatch::Unknown);
    }
}
