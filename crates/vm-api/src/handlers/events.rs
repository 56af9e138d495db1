use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, warn};
use vm_common::Event;
use vm_common::api::Pagination;
use vm_common::api::event::{EventRequest, EventUpdateRequest, PostedEvent};
use vm_common::db;
use vm_metrics::RunSource;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::pagination::checked;
use crate::handlers::recommendations::run_matching;

pub(crate) async fn load_event(state: &SharedState, event_id: &str) -> Result<Event, ApiError> {
    db::get_event(&state.pool, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("event not found: {event_id}")))
}

/// Store the event, then rank volunteers for it. A failed ranking is logged
/// and the event is still returned, with no recommendations.
pub async fn create_event(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<EventRequest>,
) -> Result<(StatusCode, Json<PostedEvent>), ApiError> {
    let organization_id = auth.organization_id()?;
    let event = payload.into_event(Event::new_id(), organization_id)?;
    let event = db::insert_event(&state.pool, &event).await?;
    info!(event_id = %event.id, organization_id, "event posted");

    let (match_run_id, recommended_volunteer_ids) =
        match run_matching(&state, &event, RunSource::EventPosted).await {
            Ok(run) => (
                Some(run.recommendation.match_run_id.clone()),
                run.recommendation.volunteer_ids(),
            ),
            Err(_) => (None, Vec::new()),
        };

    Ok((
        StatusCode::CREATED,
        Json(PostedEvent {
            event,
            match_run_id,
            recommended_volunteer_ids,
        }),
    ))
}

pub async fn get_event(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(load_event(&state, &event_id).await?))
}

pub async fn update_event(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
    Json(payload): Json<EventUpdateRequest>,
) -> Result<Json<Event>, ApiError> {
    let mut event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    let rematch = payload.touches_matching_inputs();
    payload.apply_to(&mut event)?;
    let event = db::update_event(&state.pool, &event).await?;

    if rematch {
        // Failure is already logged and counted; the update itself stands.
        if run_matching(&state, &event, RunSource::Refresh).await.is_err() {
            warn!(event_id = %event.id, "event updated without fresh recommendations");
        }
    }

    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    db::delete_event(&state.pool, &event.id, &event.organization_id).await?;
    info!(event_id = %event.id, "event deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_by_organization(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(organization_id): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let (limit, offset) = checked(page)?;
    let events = db::list_events_by_organization(&state.pool, &organization_id, limit, offset).await?;
    Ok(Json(events))
}
