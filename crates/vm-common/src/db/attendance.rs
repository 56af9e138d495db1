use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use crate::api::attendance::{Certificate, Participation, ParticipationSummary, ScanResponse};
use crate::db::PgPool;
use crate::db::events::{EVENT_COLUMNS, map_event_row};
use crate::db::notifications::insert_notification;
use crate::db::util::TimedClientExt;
use crate::workflow::{
    AttendanceState, CheckinClaims, NotificationDraft, ScanAction, contributed_hours,
    next_scan_action,
};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("event {0} belongs to another organization")]
    NotOwner(String),
    #[error("volunteer {0} is not accepted for this event")]
    NotAccepted(String),
    #[error("volunteer {0} already checked out")]
    AlreadyCompleted(String),
}

/// Apply one QR scan: the first checks the volunteer in, the second checks
/// them out, records hours and issues the certificate.
///
/// `scanner` is the scanning organization's id, or `None` for service callers.
#[instrument(skip(pool, claims), fields(event_id = %claims.event_id, volunteer_id = %claims.sub))]
pub async fn record_scan(
    pool: &PgPool,
    claims: &CheckinClaims,
    scanner: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ScanResponse, AttendanceStorageError> {
    let volunteer_id = claims.volunteer_id();
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let event_sql = format!("SELECT {EVENT_COLUMNS} FROM vm.events e WHERE e.id = $1 FOR SHARE");
    let event = tx
        .query_opt(event_sql.as_str(), &[&claims.event_id])
        .await?
        .map(|row| map_event_row(&row))
        .ok_or_else(|| AttendanceStorageError::EventNotFound(claims.event_id.clone()))?;

    if let Some(organization_id) = scanner {
        if event.organization_id != organization_id {
            return Err(AttendanceStorageError::NotOwner(event.id));
        }
    }

    let accepted = tx
        .query_opt(
            "SELECT 1 FROM vm.event_applications
             WHERE event_id = $1 AND volunteer_id = $2 AND status = 'accepted'",
            &[&event.id, &volunteer_id],
        )
        .await?
        .is_some();
    if !accepted {
        return Err(AttendanceStorageError::NotAccepted(volunteer_id.to_string()));
    }

    let state = tx
        .query_opt(
            "SELECT checked_in_at, checked_out_at FROM vm.attendance
             WHERE event_id = $1 AND volunteer_id = $2
             FOR UPDATE",
            &[&event.id, &volunteer_id],
        )
        .await?
        .map(|row| AttendanceState {
            checked_in_at: row.get("checked_in_at"),
            checked_out_at: row.get("checked_out_at"),
        });

    let scanned_by = scanner.unwrap_or("service");
    let response = match next_scan_action(state.as_ref()) {
        ScanAction::AlreadyCompleted => {
            return Err(AttendanceStorageError::AlreadyCompleted(
                volunteer_id.to_string(),
            ));
        }
        ScanAction::CheckIn => {
            tx.timed_execute(
                "INSERT INTO vm.attendance (event_id, volunteer_id, checked_in_at, scanned_by)
                 VALUES ($1, $2, $3, $4)",
                &[&event.id, &volunteer_id, &now, &scanned_by],
                "attendance_check_in",
            )
            .await?;

            ScanResponse {
                action: ScanAction::CheckIn,
                event_id: event.id.clone(),
                volunteer_id: volunteer_id.to_string(),
                checked_in_at: now,
                checked_out_at: None,
                hours_contributed: None,
                certificate_id: None,
            }
        }
        ScanAction::CheckOut => {
            let checked_in_at = state.and_then(|s| s.checked_in_at).unwrap_or(now);
            let hours = contributed_hours(checked_in_at, now);

            tx.timed_execute(
                "UPDATE vm.attendance
                 SET checked_out_at = $3, hours_contributed = $4, scanned_by = $5
                 WHERE event_id = $1 AND volunteer_id = $2",
                &[&event.id, &volunteer_id, &now, &hours, &scanned_by],
                "attendance_check_out",
            )
            .await?;

            let certificate_id: i64 = tx
                .query_one(
                    "INSERT INTO vm.certificates (volunteer_id, event_id, volunteer_hours, skills)
                     VALUES ($1, $2, $3, $4)
                     ON CONFLICT (volunteer_id, event_id)
                     DO UPDATE SET volunteer_hours = EXCLUDED.volunteer_hours
                     RETURNING id",
                    &[&volunteer_id, &event.id, &hours, &event.skills],
                )
                .await?
                .get("id");

            let draft = NotificationDraft::certificate(
                volunteer_id,
                &event.id,
                &event.organization_id,
                &event.title,
                hours,
            );
            insert_notification(&tx, &draft).await?;

            ScanResponse {
                action: ScanAction::CheckOut,
                event_id: event.id.clone(),
                volunteer_id: volunteer_id.to_string(),
                checked_in_at,
                checked_out_at: Some(now),
                hours_contributed: Some(hours),
                certificate_id: Some(certificate_id),
            }
        }
    };

    tx.commit().await?;
    info!(action = ?response.action, hours = ?response.hours_contributed, "attendance scan recorded");
    Ok(response)
}

#[instrument(skip(pool))]
pub async fn list_participations(
    pool: &PgPool,
    volunteer_id: &str,
) -> Result<ParticipationSummary, AttendanceStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT a.event_id, e.title, e.event_date, a.hours_contributed, a.checked_out_at
             FROM vm.attendance a
             JOIN vm.events e ON e.id = a.event_id
             WHERE a.volunteer_id = $1 AND a.checked_out_at IS NOT NULL
             ORDER BY a.checked_out_at DESC",
        )
        .await?;

    let rows = client
        .timed_query(&stmt, &[&volunteer_id], "list_participations")
        .await?;

    let events = rows
        .iter()
        .map(|row| Participation {
            event_id: row.get("event_id"),
            title: row.get("title"),
            date: row.get("event_date"),
            hours_contributed: row
                .get::<_, Option<f64>>("hours_contributed")
                .unwrap_or(0.0),
            checked_out_at: row.get("checked_out_at"),
        })
        .collect();

    Ok(ParticipationSummary::from_events(events))
}

#[instrument(skip(pool))]
pub async fn list_certificates(
    pool: &PgPool,
    volunteer_id: &str,
) -> Result<Vec<Certificate>, AttendanceStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT c.id, c.volunteer_id, c.event_id, e.title AS event_title,
                    o.name AS organization_name, c.issue_date, c.volunteer_hours, c.skills
             FROM vm.certificates c
             JOIN vm.events e ON e.id = c.event_id
             LEFT JOIN vm.organizations o ON o.id = e.organization_id
             WHERE c.volunteer_id = $1
             ORDER BY c.issue_date DESC, c.id DESC",
        )
        .await?;

    let rows = client
        .timed_query(&stmt, &[&volunteer_id], "list_certificates")
        .await?;

    Ok(rows
        .iter()
        .map(|row| Certificate {
            id: row.get("id"),
            volunteer_id: row.get("volunteer_id"),
            event_id: row.get("event_id"),
            event_title: row.get("event_title"),
            organization_name: row.get("organization_name"),
            issue_date: row.get("issue_date"),
            volunteer_hours: row.get("volunteer_hours"),
            skills: row.get("skills"),
        })
        .collect())
}
