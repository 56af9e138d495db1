use chrono::NaiveDate;
use tokio_postgres::Row;
use tracing::instrument;

use crate::Event;
use crate::db::PgPool;
use crate::db::util::{TimedClientExt, is_foreign_key_violation};

#[derive(Debug, thiserror::Error)]
pub enum EventStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("event not found: {0}")]
    NotFound(String),
    #[error("organization profile missing: {0}")]
    OrganizationMissing(String),
}

pub(crate) const EVENT_COLUMNS: &str = "e.id, e.organization_id, e.title, e.description,
    e.image_url, e.venue, e.city, e.skills, e.interests, e.volunteers_needed, e.event_date,
    e.time_slot, e.contact_name, e.contact_info, e.created_at";

pub(crate) fn map_event_row(row: &Row) -> Event {
    Event {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        venue: row.get("venue"),
        city: row.get("city"),
        skills: row.get("skills"),
        interests: row.get("interests"),
        volunteers_needed: row
            .get::<_, Option<i32>>("volunteers_needed")
            .and_then(|n| u32::try_from(n).ok()),
        date: row.get("event_date"),
        time_slot: row.get("time_slot"),
        contact_name: row.get("contact_name"),
        contact_info: row.get("contact_info"),
        created_at: row.get("created_at"),
    }
}

fn needed_param(event: &Event) -> Option<i32> {
    event.volunteers_needed.and_then(|n| i32::try_from(n).ok())
}

#[instrument(skip(pool, event), fields(event_id = %event.id))]
pub async fn insert_event(pool: &PgPool, event: &Event) -> Result<Event, EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "INSERT INTO vm.events AS e (
                id, organization_id, title, description, image_url, venue, city,
                skills, interests, volunteers_needed, event_date, time_slot,
                contact_name, contact_info
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {EVENT_COLUMNS}"
        ))
        .await?;

    let row = client
        .timed_query_one(
            &stmt,
            &[
                &event.id,
                &event.organization_id,
                &event.title,
                &event.description,
                &event.image_url,
                &event.venue,
                &event.city,
                &event.skills,
                &event.interests,
                &needed_param(event),
                &event.date,
                &event.time_slot,
                &event.contact_name,
                &event.contact_info,
            ],
            "insert_event",
        )
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                EventStorageError::OrganizationMissing(event.organization_id.clone())
            } else {
                EventStorageError::Postgres(err)
            }
        })?;

    Ok(map_event_row(&row))
}

#[instrument(skip(pool))]
pub async fn get_event(pool: &PgPool, id: &str) -> Result<Option<Event>, EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {EVENT_COLUMNS} FROM vm.events e WHERE e.id = $1"
        ))
        .await?;

    let row = client.timed_query_opt(&stmt, &[&id], "get_event").await?;
    Ok(row.as_ref().map(map_event_row))
}

/// Overwrite every editable column; the owner check is part of the `WHERE`.
#[instrument(skip(pool, event), fields(event_id = %event.id))]
pub async fn update_event(pool: &PgPool, event: &Event) -> Result<Event, EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "UPDATE vm.events AS e
             SET title = $3, description = $4, image_url = $5, venue = $6, city = $7,
                 skills = $8, interests = $9, volunteers_needed = $10, event_date = $11,
                 time_slot = $12, contact_name = $13, contact_info = $14, updated_at = NOW()
             WHERE e.id = $1 AND e.organization_id = $2
             RETURNING {EVENT_COLUMNS}"
        ))
        .await?;

    let row = client
        .timed_query_opt(
            &stmt,
            &[
                &event.id,
                &event.organization_id,
                &event.title,
                &event.description,
                &event.image_url,
                &event.venue,
                &event.city,
                &event.skills,
                &event.interests,
                &needed_param(event),
                &event.date,
                &event.time_slot,
                &event.contact_name,
                &event.contact_info,
            ],
            "update_event",
        )
        .await?
        .ok_or_else(|| EventStorageError::NotFound(event.id.clone()))?;

    Ok(map_event_row(&row))
}

/// Applications, attendance and recommendations go with the event.
#[instrument(skip(pool))]
pub async fn delete_event(
    pool: &PgPool,
    id: &str,
    organization_id: &str,
) -> Result<(), EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("DELETE FROM vm.events WHERE id = $1 AND organization_id = $2")
        .await?;

    let deleted = client
        .timed_execute(&stmt, &[&id, &organization_id], "delete_event")
        .await?;
    if deleted == 0 {
        return Err(EventStorageError::NotFound(id.to_string()));
    }
    Ok(())
}

#[instrument(skip(pool))]
pub async fn list_events_by_organization(
    pool: &PgPool,
    organization_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Event>, EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {EVENT_COLUMNS}
             FROM vm.events e
             WHERE e.organization_id = $1
             ORDER BY e.event_date DESC NULLS LAST, e.created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .await?;

    let rows = client
        .timed_query(
            &stmt,
            &[&organization_id, &limit, &offset],
            "list_events_by_organization",
        )
        .await?;
    Ok(rows.iter().map(map_event_row).collect())
}

/// Events still worth matching: undated or dated on/after `from`.
#[instrument(skip(pool))]
pub async fn list_events_for_rematch(
    pool: &PgPool,
    from: NaiveDate,
) -> Result<Vec<Event>, EventStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {EVENT_COLUMNS}
             FROM vm.events e
             WHERE e.event_date IS NULL OR e.event_date >= $1
             ORDER BY e.event_date NULLS LAST, e.id"
        ))
        .await?;

    let rows = client
        .timed_query(&stmt, &[&from], "list_events_for_rematch")
        .await?;
    Ok(rows.iter().map(map_event_row).collect())
}
