use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::{info, warn};
use vm_common::Event;
use vm_common::api::recommendation::{EventRecommendations, RefreshResponse};
use vm_common::db::{self, MatchingRun, RecommendationStorageError};
use vm_metrics::RunSource;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::events::load_event;

/// Rank volunteers for `event`, store the run and record metrics.
pub(crate) async fn run_matching(
    state: &SharedState,
    event: &Event,
    source: RunSource,
) -> Result<MatchingRun, RecommendationStorageError> {
    let started = Instant::now();
    match db::recommend_and_store(&state.pool, &state.matching, event).await {
        Ok(run) => {
            vm_metrics::record_recommendation_run(
                source,
                run.recommendation.scored,
                run.recommendation.top.len(),
                started.elapsed(),
            );
            info!(
                event_id = %event.id,
                match_run_id = %run.recommendation.match_run_id,
                kept = run.recommendation.top.len(),
                notified = run.stored.notified,
                source = source.as_str(),
                "recommendation run stored"
            );
            Ok(run)
        }
        Err(err) => {
            vm_metrics::record_recommendation_failure(source);
            warn!(event_id = %event.id, error = %err, source = source.as_str(), "recommendation run failed");
            Err(err)
        }
    }
}

pub async fn latest(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<EventRecommendations>, ApiError> {
    let event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    let recommendations = db::latest_recommendations(&state.pool, &event.id).await?;
    Ok(Json(recommendations))
}

pub async fn refresh(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    let run = run_matching(&state, &event, RunSource::Refresh).await?;
    Ok(Json(RefreshResponse {
        event_id: event.id,
        match_run_id: run.recommendation.match_run_id,
        engine_version: run.recommendation.engine_version,
        scored: run.recommendation.scored,
        stored: run.stored.stored,
        notified: run.stored.notified,
    }))
}
