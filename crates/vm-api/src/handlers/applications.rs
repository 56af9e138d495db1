use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;
use vm_common::api::application::{
    ApplicationRoster, ApplyResponse, DecisionRequest, DecisionResponse,
};
use vm_common::db;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::events::load_event;

pub async fn apply(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<(StatusCode, Json<ApplyResponse>), ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let event = load_event(&state, &event_id).await?;
    if event.is_past(Utc::now().date_naive()) {
        return Err(ApiError::Conflict(format!(
            "event {} has already taken place",
            event.id
        )));
    }

    let (status, created) = db::apply_to_event(&state.pool, &event.id, volunteer_id).await?;
    if created {
        info!(event_id = %event.id, volunteer_id, "volunteer applied");
    }

    let code = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        code,
        Json(ApplyResponse {
            event_id: event.id,
            status,
            created,
        }),
    ))
}

pub async fn roster(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<ApplicationRoster>, ApiError> {
    let event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    let applicants = db::list_applicants(&state.pool, &event.id).await?;
    Ok(Json(ApplicationRoster::from_applicants(&event.id, applicants)))
}

pub async fn decide(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path((event_id, volunteer_id)): Path<(String, String)>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let event = load_event(&state, &event_id).await?;
    auth.ensure_owner(&event)?;

    let result =
        db::decide_application(&state.pool, &event, &volunteer_id, payload.decision).await?;
    info!(
        event_id = %event.id,
        volunteer_id = %volunteer_id,
        status = result.status.as_str(),
        changed = result.changed,
        "application decided"
    );

    Ok(Json(DecisionResponse {
        event_id: event.id,
        volunteer_id,
        status: result.status,
        changed: result.changed,
        notification_id: result.notification_id,
    }))
}
