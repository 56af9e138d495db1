use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static RE_CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2})(?::(\d{2}))?\s*([ap]\.?m\.?)?\s*$").unwrap()
});

/// Half-open range of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u16,
    pub end: u16,
}

impl TimeRange {
    /// Range that overlaps nothing; used for unparseable input.
    pub const EMPTY: TimeRange = TimeRange { start: 0, end: 0 };

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Touching ranges (`9AM-12PM` / `12PM-3PM`) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

fn parse_clock(raw: &str) -> Option<u16> {
    let caps = RE_CLOCK.captures(raw)?;
    let hour: u16 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u16 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if minute >= 60 {
        return None;
    }

    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            let pm = meridiem.starts_with('p');
            match (hour, pm) {
                (12, false) => 0,
                (12, true) => 12,
                (h, true) => h + 12,
                (h, false) => h,
            }
        }
        None => {
            if hour > 24 || (hour == 24 && minute > 0) {
                return None;
            }
            hour
        }
    };

    Some(hour * 60 + minute)
}

/// Parse `9AM-12PM`, `9:30am - 1pm` or `09:00-13:00`.
///
/// Malformed input yields [`TimeRange::EMPTY`] rather than an error so a
/// single bad profile entry cannot break a scoring run.
pub fn parse_time_range(raw: &str) -> TimeRange {
    let Some((start, end)) = raw.split_once('-') else {
        warn!(time_range = raw, "invalid time range format");
        return TimeRange::EMPTY;
    };

    match (parse_clock(start), parse_clock(end)) {
        (Some(start), Some(end)) => TimeRange { start, end },
        _ => {
            warn!(time_range = raw, "unparseable time range bounds");
            TimeRange::EMPTY
        }
    }
}

/// Expand a stored day tag into weekdays. Accepts full or short names in
/// any case plus the `weekdays` / `weekends` aliases.
pub fn expand_day(tag: &str) -> Vec<Weekday> {
    let key = tag.trim().to_ascii_lowercase();
    match key.as_str() {
        "weekdays" | "weekday" => vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        "weekends" | "weekend" => vec![Weekday::Sat, Weekday::Sun],
        _ => key.parse::<Weekday>().map(|d| vec![d]).unwrap_or_default(),
    }
}

pub fn available_weekdays<S: AsRef<str>>(days: &[S]) -> Vec<Weekday> {
    let mut expanded: Vec<Weekday> = Vec::new();
    for day in days.iter().flat_map(|d| expand_day(d.as_ref())) {
        if !expanded.contains(&day) {
            expanded.push(day);
        }
    }
    expanded
}

pub fn event_weekday(date: NaiveDate) -> Weekday {
    date.weekday()
}

/// Lowercase English name, matching how day tags are stored.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(a: &str, b: &str) -> bool {
        parse_time_range(a).overlaps(&parse_time_range(b))
    }

    #[test]
    fn parses_meridiem_ranges() {
        assert_eq!(
            parse_time_range("9AM-12PM"),
            TimeRange {
                start: 9 * 60,
                end: 12 * 60
            }
        );
        assert_eq!(
            parse_time_range("12AM-1pm"),
            TimeRange {
                start: 0,
                end: 13 * 60
            }
        );
        assert_eq!(
            parse_time_range(" 9:30 am - 1 PM "),
            TimeRange {
                start: 9 * 60 + 30,
                end: 13 * 60
            }
        );
    }

    #[test]
    fn parses_24h_ranges() {
        assert_eq!(
            parse_time_range("09:00-17:30"),
            TimeRange {
                start: 9 * 60,
                end: 17 * 60 + 30
            }
        );
    }

    #[test]
    fn malformed_ranges_are_neutral() {
        assert_eq!(parse_time_range("morning"), TimeRange::EMPTY);
        assert_eq!(parse_time_range("13PM-2PM"), TimeRange::EMPTY);
        assert_eq!(parse_time_range("9AM-noon"), TimeRange::EMPTY);
        assert!(!overlap("morning", "9AM-12PM"));
    }

    #[test]
    fn overlap_requires_shared_interior() {
        assert!(overlap("9AM-12PM", "11AM-2PM"));
        assert!(!overlap("9AM-12PM", "12PM-3PM"));
        assert!(overlap("8AM-6PM", "10AM-11AM"));
    }

    #[test]
    fn day_aliases_expand() {
        assert_eq!(expand_day("Weekends"), vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(expand_day("weekdays").len(), 5);
        assert_eq!(expand_day("TUESDAY"), vec![Weekday::Tue]);
        assert_eq!(expand_day("sat"), vec![Weekday::Sat]);
        assert!(expand_day("someday").is_empty());
    }

    #[test]
    fn available_weekdays_deduplicates() {
        let days = available_weekdays(&["weekends", "Saturday", "monday"]);
        assert_eq!(days, vec![Weekday::Sat, Weekday::Sun, Weekday::Mon]);
    }

    #[test]
    fn event_weekday_uses_calendar_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(event_weekday(date), Weekday::Sat);
        assert_eq!(weekday_name(event_weekday(date)), "saturday");
    }
}
