use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::{info, instrument};

use crate::Event;
use crate::api::recommendation::{EventRecommendations, RecommendationView, RecommendedEvent};
use crate::db::PgPool;
use crate::db::notifications::insert_notification;
use crate::db::util::{TimedClientExt, normalize_json};
use crate::db::volunteers::{VolunteerStorageError, list_volunteers_for_matching};
use crate::matching::{MatchingEngine, Recommendation};
use crate::workflow::NotificationDraft;

#[derive(Debug, thiserror::Error)]
pub enum RecommendationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error(transparent)]
    Volunteers(#[from] VolunteerStorageError),
}

/// Row for `vm.recommended_matches`.
#[derive(Debug, Clone, Default)]
pub struct RecommendationInsert {
    pub event_id: String,
    pub volunteer_id: String,
    pub rank: i32,
    pub score: f64,
    pub score_breakdown: Option<Value>,
    pub match_run_id: String,
    pub engine_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoredRecommendation {
    pub stored: u64,
    pub notified: u64,
}

/// Persist a matching run and send a `match` notification to each picked
/// volunteer not already notified about this event.
#[instrument(skip(pool, recommendation, event), fields(event_id = %event.id, match_run_id = %recommendation.match_run_id))]
pub async fn store_recommendation(
    pool: &PgPool,
    recommendation: &Recommendation,
    event: &Event,
) -> Result<StoredRecommendation, RecommendationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let insert = tx
        .prepare_cached(
            "INSERT INTO vm.recommended_matches (
                event_id, volunteer_id, rank, score, score_breakdown, match_run_id, engine_version
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (match_run_id, event_id, volunteer_id) DO NOTHING",
        )
        .await?;
    let already_notified = tx
        .prepare_cached(
            "SELECT EXISTS (
                SELECT 1 FROM vm.notifications
                WHERE volunteer_id = $1 AND event_id = $2 AND kind = 'match'
            )",
        )
        .await?;

    let mut result = StoredRecommendation::default();
    for row in recommendation.to_inserts() {
        result.stored += tx
            .timed_execute(
                &insert,
                &[
                    &row.event_id,
                    &row.volunteer_id,
                    &row.rank,
                    &row.score,
                    &normalize_json(&row.score_breakdown),
                    &row.match_run_id,
                    &row.engine_version,
                ],
                "insert_recommended_match",
            )
            .await?;

        let notified: bool = tx
            .query_one(&already_notified, &[&row.volunteer_id, &event.id])
            .await?
            .get(0);
        if !notified {
            let draft = NotificationDraft::recommended(
                &row.volunteer_id,
                &event.id,
                &event.organization_id,
                &event.title,
            );
            insert_notification(&tx, &draft).await?;
            result.notified += 1;
        }
    }

    tx.commit().await?;
    info!(
        stored = result.stored,
        notified = result.notified,
        "stored recommendation run"
    );
    Ok(result)
}

#[derive(Debug, Clone)]
pub struct MatchingRun {
    pub recommendation: Recommendation,
    pub stored: StoredRecommendation,
}

/// Score every volunteer for `event`, store the top picks and notify them.
#[instrument(skip(pool, engine, event), fields(event_id = %event.id))]
pub async fn recommend_and_store(
    pool: &PgPool,
    engine: &MatchingEngine,
    event: &Event,
) -> Result<MatchingRun, RecommendationStorageError> {
    let volunteers = list_volunteers_for_matching(pool).await?;
    let recommendation = engine.recommend(event, &volunteers);
    let stored = store_recommendation(pool, &recommendation, event).await?;
    Ok(MatchingRun {
        recommendation,
        stored,
    })
}

/// Rows of the most recent run for an event, best rank first.
#[instrument(skip(pool))]
pub async fn latest_recommendations(
    pool: &PgPool,
    event_id: &str,
) -> Result<EventRecommendations, RecommendationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "WITH latest_run AS (
                SELECT match_run_id
                FROM vm.recommended_matches
                WHERE event_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            SELECT r.volunteer_id, v.name AS volunteer_name, r.rank, r.score, r.score_breakdown,
                   r.match_run_id, r.engine_version, r.created_at,
                   EXISTS (
                       SELECT 1 FROM vm.event_applications a
                       WHERE a.event_id = r.event_id AND a.volunteer_id = r.volunteer_id
                   ) AS applied
            FROM vm.recommended_matches r
            JOIN latest_run l ON l.match_run_id = r.match_run_id
            JOIN vm.volunteers v ON v.id = r.volunteer_id
            WHERE r.event_id = $1
            ORDER BY r.rank",
        )
        .await?;

    let rows = client
        .timed_query(&stmt, &[&event_id], "latest_recommendations")
        .await?;

    let first = rows.first();
    Ok(EventRecommendations {
        event_id: event_id.to_string(),
        match_run_id: first.map(|row| row.get("match_run_id")),
        engine_version: first.and_then(|row| row.get("engine_version")),
        created_at: first.map(|row| row.get::<_, DateTime<Utc>>("created_at")),
        volunteers: rows
            .iter()
            .map(|row| RecommendationView {
                volunteer_id: row.get("volunteer_id"),
                volunteer_name: row.get("volunteer_name"),
                rank: row.get("rank"),
                score: row.get("score"),
                score_breakdown: row.get("score_breakdown"),
                applied: row.get("applied"),
            })
            .collect(),
    })
}

/// Upcoming events whose latest run picked this volunteer.
#[instrument(skip(pool))]
pub async fn recommended_events_for_volunteer(
    pool: &PgPool,
    volunteer_id: &str,
    today: NaiveDate,
) -> Result<Vec<RecommendedEvent>, RecommendationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "WITH latest_runs AS (
                SELECT DISTINCT ON (event_id) event_id, match_run_id
                FROM vm.recommended_matches
                ORDER BY event_id, created_at DESC, id DESC
            )
            SELECT e.id AS event_id, e.title, e.organization_id, o.name AS organization_name,
                   e.city, e.event_date, e.time_slot, r.rank, r.score
            FROM vm.recommended_matches r
            JOIN latest_runs l
              ON l.event_id = r.event_id AND l.match_run_id = r.match_run_id
            JOIN vm.events e ON e.id = r.event_id
            LEFT JOIN vm.organizations o ON o.id = e.organization_id
            WHERE r.volunteer_id = $1
              AND (e.event_date IS NULL OR e.event_date >= $2)
            ORDER BY e.event_date NULLS LAST, r.rank",
        )
        .await?;

    let rows = client
        .timed_query(
            &stmt,
            &[&volunteer_id, &today],
            "recommended_events_for_volunteer",
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| RecommendedEvent {
            event_id: row.get("event_id"),
            title: row.get("title"),
            organization_id: row.get("organization_id"),
            organization_name: row.get("organization_name"),
            city: row.get("city"),
            date: row.get("event_date"),
            time_slot: row.get("time_slot"),
            rank: row.get("rank"),
            score: row.get("score"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_defaults_are_empty() {
        let insert = RecommendationInsert {
            event_id: "evt-1".into(),
            volunteer_id: "vol-1".into(),
            rank: 1,
            ..Default::default()
        };
        assert!(insert.score_breakdown.is_none());
        assert!(insert.engine_version.is_none());
    }

    #[test]
    fn volunteer_errors_pass_through_unchanged() {
        let err: RecommendationStorageError =
            VolunteerStorageError::NotFound("U007".into()).into();
        assert!(matches!(err, RecommendationStorageError::Volunteers(_)));
        assert_eq!(err.to_string(), "volunteer not found: U007");
    }
}
