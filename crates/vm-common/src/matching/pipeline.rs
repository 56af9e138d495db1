use std::cmp::Ordering;

use tracing::debug;

use super::scoring::{MatchScore, MatchingConfig, VolunteerScorer};
use crate::{Event, Volunteer, db::recommendations::RecommendationInsert, run_id};

/// Bump when weights or factor rules change so stored runs stay comparable.
pub const ENGINE_VERSION: &str = "weighted-v1";

#[derive(Debug, Clone)]
pub struct RankedVolunteer {
    pub volunteer_id: String,
    pub volunteer_name: String,
    /// 1-based position after sorting.
    pub rank: usize,
    pub score: MatchScore,
}

#[derive(Debug, Clone)]
pub struct Recommendation {
    pub event_id: String,
    pub match_run_id: String,
    pub engine_version: &'static str,
    /// Volunteers considered, before truncation.
    pub scored: usize,
    pub top: Vec<RankedVolunteer>,
}

impl Recommendation {
    pub fn volunteer_ids(&self) -> Vec<String> {
        self.top.iter().map(|r| r.volunteer_id.clone()).collect()
    }

    /// Rows for `vm.recommended_matches`.
    pub fn to_inserts(&self) -> Vec<RecommendationInsert> {
        self.top
            .iter()
            .map(|ranked| RecommendationInsert {
                event_id: self.event_id.clone(),
                volunteer_id: ranked.volunteer_id.clone(),
                rank: ranked.rank as i32,
                score: ranked.score.total,
                score_breakdown: serde_json::to_value(&ranked.score).ok(),
                match_run_id: self.match_run_id.clone(),
                engine_version: Some(self.engine_version.to_string()),
            })
            .collect()
    }
}

pub struct MatchingEngine {
    scorer: VolunteerScorer,
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl MatchingEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            scorer: VolunteerScorer::new(config),
        }
    }

    /// Score every volunteer and sort best first. Equal scores fall back to
    /// volunteer id so repeated runs produce the same order.
    pub fn rank_volunteers(&self, event: &Event, volunteers: &[Volunteer]) -> Vec<RankedVolunteer> {
        let mut scored: Vec<(&Volunteer, MatchScore)> = volunteers
            .iter()
            .map(|volunteer| (volunteer, self.scorer.calculate_match_score(event, volunteer)))
            .collect();

        scored.sort_by(|(va, a), (vb, b)| {
            match b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal) {
                Ordering::Equal => va.id.cmp(&vb.id),
                other => other,
            }
        });

        scored
            .into_iter()
            .enumerate()
            .map(|(idx, (volunteer, score))| RankedVolunteer {
                volunteer_id: volunteer.id.clone(),
                volunteer_name: volunteer.name.clone(),
                rank: idx + 1,
                score,
            })
            .collect()
    }

    /// Rank all volunteers for a freshly posted event and keep the top N.
    pub fn recommend(&self, event: &Event, volunteers: &[Volunteer]) -> Recommendation {
        let top_n = self.scorer.config().top_n_for(event);
        let mut ranked = self.rank_volunteers(event, volunteers);
        ranked.truncate(top_n);

        debug!(
            event_id = %event.id,
            scored = volunteers.len(),
            kept = ranked.len(),
            "ranked volunteers"
        );

        Recommendation {
            event_id: event.id.clone(),
            match_run_id: run_id::generate(),
            engine_version: ENGINE_VERSION,
            scored: volunteers.len(),
            top: ranked,
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

    fn event(needed: Option<u32>) -> Event {
        Event {
            id: "evt-9".into(),
            organization_id: "org-1".into(),
            title: "Food Drive".into(),
            city: Some("Pune".into()),
            skills: strings(&["Logistics"]),
            interests: strings(&["Hunger"]),
            volunteers_needed: needed,
            date: NaiveDate::from_ymd_opt(2024, 6, 3),
            time_slot: Some("10AM-1PM".into()),
            ..Event::default()
        }
    }

    fn volunteer(id: &str, location: &str, skills: &[&str]) -> Volunteer {
        Volunteer {
            id: id.into(),
            name: format!("name-{id}"),
            location: Some(location.into()),
            skills: strings(skills),
            ..Volunteer::default()
        }
    }

    #[test]
    fn ranks_by_total_score() {
        let engine = MatchingEngine::default();
        let volunteers = vec![
            volunteer("a", "Mumbai", &[]),
            volunteer("b", "Kothrud, Pune", &["logistics"]),
            volunteer("c", "Pune", &[]),
        ];

        let ranked = engine.rank_volunteers(&event(None), &volunteers);
        let ids: Vec<_> = ranked.iter().map(|r| r.volunteer_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked.windows(2).all(|w| w[0].score.total >= w[1].score.total));
    }

    #[test]
    fn ties_break_by_volunteer_id() {
        let engine = MatchingEngine::default();
        let volunteers = vec![
            volunteer("zeta", "Delhi", &[]),
            volunteer("alpha", "Delhi", &[]),
        ];

        let ranked = engine.rank_volunteers(&event(None), &volunteers);
        assert_eq!(ranked[0].volunteer_id, "alpha");
        assert_eq!(ranked[1].volunteer_id, "zeta");
    }

    #[test]
    fn keeps_volunteers_needed_or_five() {
        let engine = MatchingEngine::default();
        let volunteers: Vec<_> = (0..8)
            .map(|i| volunteer(&format!("v{i}"), "Pune", &[]))
            .collect();

        assert_eq!(engine.recommend(&event(Some(2)), &volunteers).top.len(), 2);
        let rec = engine.recommend(&event(None), &volunteers);
        assert_eq!(rec.top.len(), 5);
        assert_eq!(rec.scored, 8);
        assert_eq!(rec.engine_version, ENGINE_VERSION);
    }

    #[test]
    fn empty_volunteer_pool_yields_empty_recommendation() {
        let engine = MatchingEngine::default();
        let rec = engine.recommend(&event(Some(3)), &[]);
        assert!(rec.top.is_empty());
        assert!(rec.to_inserts().is_empty());
    }

    #[test]
    fn converts_to_storage_rows() {
        let engine = MatchingEngine::default();
        let rec = engine.recommend(
            &event(Some(1)),
            &[volunteer("b", "Pune", &["Logistics"])],
        );

        let rows = rec.to_inserts();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_id, "evt-9");
        assert_eq!(rows[0].volunteer_id, "b");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].score, 20.0);
        assert_eq!(rows[0].match_run_id, rec.match_run_id);
        let breakdown = rows[0].score_breakdown.as_ref().unwrap();
        assert_eq!(breakdown["skills"]["status"], "MATCH");
    }
}
