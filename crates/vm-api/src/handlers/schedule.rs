use axum::{Json, extract::State};
use chrono::Utc;
use tracing::info;
use vm_common::db;
use vm_common::matching::{ScheduleRequest, ScheduleSuggestion, suggest_schedule};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

/// Suggest the next date and time slot where enough interested volunteers
/// are free.
pub async fn suggest(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<ScheduleRequest>,
) -> Result<Json<ScheduleSuggestion>, ApiError> {
    if !auth.is_service() {
        auth.organization_id()?;
    }

    payload.validate()?;
    let today = Utc::now().date_naive();

    let volunteers = db::list_volunteers_for_matching(&state.pool).await?;
    let suggestion = suggest_schedule(&payload, &volunteers, today, &state.schedule)?
        .ok_or_else(|| ApiError::NotFound("no slot has enough interested volunteers".into()))?;

    info!(
        event_name = %payload.event_name,
        date = %suggestion.date,
        time_slot = %suggestion.time_slot,
        volunteers = suggestion.volunteer_ids.len(),
        "schedule suggested"
    );
    Ok(Json(suggestion))
}
