use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalytics {
    pub event_id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub volunteers_needed: Option<u32>,
    pub registered: i64,
    pub accepted: i64,
    pub participated: i64,
}

impl EventAnalytics {
    /// Accepted volunteers over the requested headcount, as a percentage.
    pub fn fill_rate(&self) -> Option<f64> {
        let needed = self.volunteers_needed.filter(|n| *n > 0)?;
        Some(((self.accepted as f64 / needed as f64) * 1000.0).round() / 10.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsTotals {
    pub events: usize,
    pub volunteers_needed: i64,
    pub accepted: i64,
    pub participated: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationAnalytics {
    pub organization_id: String,
    pub events: Vec<EventAnalytics>,
    pub totals: AnalyticsTotals,
}

impl OrganizationAnalytics {
    pub fn new(organization_id: &str, events: Vec<EventAnalytics>) -> Self {
        let totals = events.iter().fold(
            AnalyticsTotals {
                events: events.len(),
                ..AnalyticsTotals::default()
            },
            |mut acc, event| {
                acc.volunteers_needed += i64::from(event.volunteers_needed.unwrap_or(0));
                acc.accepted += event.accepted;
                acc.participated += event.participated;
                acc
            },
        );

        Self {
            organization_id: organization_id.to_string(),
            events,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(needed: Option<u32>, accepted: i64, participated: i64) -> EventAnalytics {
        EventAnalytics {
            event_id: "e".into(),
            title: "t".into(),
            date: None,
            volunteers_needed: needed,
            registered: 0,
            accepted,
            participated,
        }
    }

    #[test]
    fn sums_totals() {
        let analytics = OrganizationAnalytics::new("org-1", vec![row(Some(4), 3, 2), row(None, 1, 1)]);
        assert_eq!(
            analytics.totals,
            AnalyticsTotals {
                events: 2,
                volunteers_needed: 4,
                accepted: 4,
                participated: 3,
            }
        );
    }

    #[test]
    fn fill_rate_needs_capacity() {
        assert_eq!(row(Some(4), 3, 0).fill_rate(), Some(75.0));
        assert_eq!(row(None, 3, 0).fill_rate(), None);
    }
}
