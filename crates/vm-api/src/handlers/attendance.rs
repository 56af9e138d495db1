use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use tracing::info;
use vm_common::api::attendance::{CheckinTokenResponse, ScanRequest, ScanResponse};
use vm_common::db::{self, AttendanceStorageError};
use vm_common::workflow::{
    ApplicationStatus, ScanAction, issue_checkin_token, verify_checkin_token,
};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::events::load_event;

/// QR payload for an accepted volunteer.
pub async fn checkin_token(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(event_id): Path<String>,
) -> Result<Json<CheckinTokenResponse>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let event = load_event(&state, &event_id).await?;

    match db::application_status(&state.pool, &event.id, volunteer_id).await? {
        Some(ApplicationStatus::Accepted) => {}
        Some(_) => {
            return Err(ApiError::Forbidden(
                "only accepted volunteers receive a check-in code".into(),
            ));
        }
        None => {
            return Err(ApiError::NotFound(format!(
                "no application for event {}",
                event.id
            )));
        }
    }

    let token = issue_checkin_token(
        state.config.checkin_secret.as_bytes(),
        &event,
        volunteer_id,
        Utc::now(),
    )?;

    Ok(Json(CheckinTokenResponse {
        token,
        event_id: event.id,
        title: event.title,
        date: event.date,
        time_slot: event.time_slot,
        venue: event.venue,
    }))
}

/// Organization scans a volunteer's code: first scan checks in, second
/// checks out and issues the certificate.
pub async fn scan(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let scanner = if auth.is_service() {
        None
    } else {
        Some(auth.organization_id()?)
    };

    let claims = verify_checkin_token(state.config.checkin_secret.as_bytes(), &payload.token)?;
    let outcome = db::record_scan(&state.pool, &claims, scanner, Utc::now()).await;
    let action = scan_metric_label(outcome.as_ref().map(|r| r.action));
    if let Some(action) = action {
        vm_metrics::record_attendance_scan(action);
    }
    let response = outcome?;
    info!(
        event_id = %response.event_id,
        volunteer_id = %response.volunteer_id,
        action = action.unwrap_or_default(),
        hours = response.hours_contributed,
        "attendance scanned"
    );

    Ok(Json(response))
}

/// Metric label for a scan outcome. Repeat scans after check-out are counted
/// even though they are rejected.
fn scan_metric_label(
    outcome: Result<ScanAction, &AttendanceStorageError>,
) -> Option<&'static str> {
    match outcome {
        Ok(ScanAction::CheckIn) => Some("check_in"),
        Ok(ScanAction::CheckOut) => Some("check_out"),
        Ok(ScanAction::AlreadyCompleted) | Err(AttendanceStorageError::AlreadyCompleted(_)) => {
            Some("already_completed")
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_scans_are_labelled_on_rejection() {
        let done = AttendanceStorageError::AlreadyCompleted("U001".into());
        assert_eq!(scan_metric_label(Err(&done)), Some("already_completed"));
        assert_eq!(scan_metric_label(Ok(ScanAction::CheckIn)), Some("check_in"));
        assert_eq!(scan_metric_label(Ok(ScanAction::CheckOut)), Some("check_out"));

        let missing = AttendanceStorageError::EventNotFound("evt-9".into());
        assert_eq!(scan_metric_label(Err(&missing)), None);
    }
}
