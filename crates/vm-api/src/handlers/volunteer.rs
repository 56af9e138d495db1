use axum::{Json, extract::State};
use chrono::Utc;
use vm_common::api::attendance::{Certificate, ParticipationSummary, UpcomingEvent};
use vm_common::api::recommendation::RecommendedEvent;
use vm_common::db;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Accepted events that have not happened yet.
pub async fn upcoming_events(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<UpcomingEvent>>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let today = Utc::now().date_naive();
    let events = db::list_upcoming_events_for_volunteer(&state.pool, volunteer_id, today).await?;
    Ok(Json(events))
}

pub async fn recommended_events(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<RecommendedEvent>>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let today = Utc::now().date_naive();
    let events = db::recommended_events_for_volunteer(&state.pool, volunteer_id, today).await?;
    Ok(Json(events))
}

pub async fn participations(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<ParticipationSummary>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    Ok(Json(db::list_participations(&state.pool, volunteer_id).await?))
}

pub async fn certificates(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    Ok(Json(db::list_certificates(&state.pool, volunteer_id).await?))
}
