use chrono::NaiveDate;
use tokio_postgres::Row;
use tracing::{info, instrument};

use crate::Event;
use crate::api::application::ApplicantView;
use crate::api::attendance::UpcomingEvent;
use crate::db::events::{EVENT_COLUMNS, map_event_row};
use crate::db::notifications::insert_notification;
use crate::db::util::{TimedClientExt, is_foreign_key_violation};
use crate::db::{PgPool, validated_actor};
use crate::workflow::{
    ApplicationStatus, Decision, DecisionOutcome, NotificationDraft, TransitionError, decide,
};

#[derive(Debug, thiserror::Error)]
pub enum ApplicationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("volunteer id is missing")]
    MissingActor,
    #[error("event or volunteer profile does not exist")]
    MissingReference,
    #[error("volunteer {volunteer_id} has not applied to event {event_id}")]
    NotRegistered {
        event_id: String,
        volunteer_id: String,
    },
    #[error("unexpected application status: {0}")]
    UnknownStatus(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionResult {
    pub status: ApplicationStatus,
    pub changed: bool,
    pub notification_id: Option<i64>,
}

fn parse_status(raw: String) -> Result<ApplicationStatus, ApplicationStorageError> {
    raw.trim()
        .parse()
        .map_err(|_| ApplicationStorageError::UnknownStatus(raw.clone()))
}

/// Register interest in an event. Applying twice keeps the first row and
/// reports `created = false`.
#[instrument(skip(pool))]
pub async fn apply_to_event(
    pool: &PgPool,
    event_id: &str,
    volunteer_id: &str,
) -> Result<(ApplicationStatus, bool), ApplicationStorageError> {
    let volunteer_id =
        validated_actor(volunteer_id).ok_or(ApplicationStorageError::MissingActor)?;
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO vm.event_applications (event_id, volunteer_id)
             VALUES ($1, $2)
             ON CONFLICT (event_id, volunteer_id) DO NOTHING
             RETURNING status",
        )
        .await?;

    let inserted = client
        .timed_query_opt(&stmt, &[&event_id, &volunteer_id], "apply_to_event")
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ApplicationStorageError::MissingReference
            } else {
                ApplicationStorageError::Postgres(err)
            }
        })?;

    if let Some(row) = inserted {
        return Ok((parse_status(row.get("status"))?, true));
    }

    let existing = application_status(pool, event_id, volunteer_id)
        .await?
        .ok_or_else(|| ApplicationStorageError::NotRegistered {
            event_id: event_id.to_string(),
            volunteer_id: volunteer_id.to_string(),
        })?;
    Ok((existing, false))
}

#[instrument(skip(pool))]
pub async fn application_status(
    pool: &PgPool,
    event_id: &str,
    volunteer_id: &str,
) -> Result<Option<ApplicationStatus>, ApplicationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT status FROM vm.event_applications WHERE event_id = $1 AND volunteer_id = $2",
        )
        .await?;

    client
        .timed_query_opt(&stmt, &[&event_id, &volunteer_id], "application_status")
        .await?
        .map(|row| parse_status(row.get("status")))
        .transpose()
}

fn map_applicant_row(row: &Row) -> Result<ApplicantView, ApplicationStorageError> {
    Ok(ApplicantView {
        volunteer_id: row.get("volunteer_id"),
        display_id: row.get("display_id"),
        name: row.get("name"),
        email: row.get("email"),
        location: row.get("location"),
        skills: row.get("skills"),
        interests: row.get("interests"),
        status: parse_status(row.get("status"))?,
        recommended: row.get("recommended"),
        applied_at: row.get("applied_at"),
        decided_at: row.get("decided_at"),
    })
}

/// Everyone who applied, flagged when the event's latest matching run
/// recommended them.
#[instrument(skip(pool))]
pub async fn list_applicants(
    pool: &PgPool,
    event_id: &str,
) -> Result<Vec<ApplicantView>, ApplicationStorageError> {
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
            SELECT a.volunteer_id, v.display_id, v.name, v.email, v.location,
                   v.skills, v.interests, a.status, a.applied_at, a.decided_at,
                   EXISTS (
                       SELECT 1
                       FROM vm.recommended_matches r
                       JOIN latest_run l ON l.match_run_id = r.match_run_id
                       WHERE r.event_id = a.event_id AND r.volunteer_id = a.volunteer_id
                   ) AS recommended
            FROM vm.event_applications a
            JOIN vm.volunteers v ON v.id = a.volunteer_id
            WHERE a.event_id = $1
            ORDER BY a.applied_at, a.volunteer_id",
        )
        .await?;

    let rows = client
        .timed_query(&stmt, &[&event_id], "list_applicants")
        .await?;
    rows.iter().map(map_applicant_row).collect()
}

/// Accept or reject a registration and notify the volunteer, atomically.
///
/// The event row is locked so concurrent accepts cannot overshoot
/// `volunteers_needed`.
#[instrument(skip(pool, event), fields(event_id = %event.id))]
pub async fn decide_application(
    pool: &PgPool,
    event: &Event,
    volunteer_id: &str,
    decision: Decision,
) -> Result<DecisionResult, ApplicationStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    tx.execute(
        "SELECT 1 FROM vm.events WHERE id = $1 FOR UPDATE",
        &[&event.id],
    )
    .await?;

    let current = tx
        .query_opt(
            "SELECT status FROM vm.event_applications
             WHERE event_id = $1 AND volunteer_id = $2
             FOR UPDATE",
            &[&event.id, &volunteer_id],
        )
        .await?
        .ok_or_else(|| ApplicationStorageError::NotRegistered {
            event_id: event.id.clone(),
            volunteer_id: volunteer_id.to_string(),
        })?;
    let current = parse_status(current.get("status"))?;

    let accepted: i64 = tx
        .query_one(
            "SELECT COUNT(*) FROM vm.event_applications
             WHERE event_id = $1 AND status = 'accepted' AND volunteer_id <> $2",
            &[&event.id, &volunteer_id],
        )
        .await?
        .get(0);
    let accepted = u32::try_from(accepted).unwrap_or(u32::MAX);

    let status = match decide(current, decision, accepted, event.volunteers_needed)? {
        DecisionOutcome::Unchanged(status) => {
            tx.rollback().await?;
            return Ok(DecisionResult {
                status,
                changed: false,
                notification_id: None,
            });
        }
        DecisionOutcome::Changed(status) => status,
    };

    tx.execute(
        "UPDATE vm.event_applications
         SET status = $3, decided_at = NOW()
         WHERE event_id = $1 AND volunteer_id = $2",
        &[&event.id, &volunteer_id, &status.as_str()],
    )
    .await?;

    let draft = NotificationDraft::decision(
        decision,
        volunteer_id,
        &event.id,
        &event.organization_id,
        &event.title,
    );
    let notification_id = insert_notification(&tx, &draft).await?;
    tx.commit().await?;

    info!(
        volunteer_id,
        status = status.as_str(),
        notification_id,
        "application decided"
    );

    Ok(DecisionResult {
        status,
        changed: true,
        notification_id: Some(notification_id),
    })
}

/// Accepted events that have not happened yet; undated events are included.
#[instrument(skip(pool))]
pub async fn list_upcoming_events_for_volunteer(
    pool: &PgPool,
    volunteer_id: &str,
    today: NaiveDate,
) -> Result<Vec<UpcomingEvent>, ApplicationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {EVENT_COLUMNS}, o.name AS organization_name, a.decided_at
             FROM vm.event_applications a
             JOIN vm.events e ON e.id = a.event_id
             LEFT JOIN vm.organizations o ON o.id = e.organization_id
             WHERE a.volunteer_id = $1
               AND a.status = 'accepted'
               AND (e.event_date IS NULL OR e.event_date >= $2)
             ORDER BY e.event_date NULLS LAST, e.id"
        ))
        .await?;

    let rows = client
        .timed_query(
            &stmt,
            &[&volunteer_id, &today],
            "list_upcoming_events_for_volunteer",
        )
        .await?;

    Ok(rows
        .iter()
        .map(|row| UpcomingEvent {
            event: map_event_row(row),
            organization_name: row.get("organization_name"),
            accepted_at: row.get("decided_at"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_errors_keep_their_message() {
        let err: ApplicationStorageError = TransitionError::CapacityReached {
            accepted: 3,
            needed: 3,
        }
        .into();
        assert!(matches!(err, ApplicationStorageError::Transition(_)));
        assert_eq!(err.to_string(), "event already has 3 of 3 volunteers accepted");
    }

    #[test]
    fn stored_status_text_is_trimmed() {
        assert_eq!(
            parse_status(" accepted ".into()).unwrap(),
            ApplicationStatus::Accepted
        );
    }

    #[test]
    fn unknown_status_is_reported() {
        let err = parse_status("waitlisted".into()).unwrap_err();
        assert_eq!(err.to_string(), "unexpected application status: waitlisted");
    }
}
