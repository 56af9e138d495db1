use tokio_postgres::Row;
use tracing::instrument;

use crate::Volunteer;
use crate::api::profile::VolunteerProfile;
use crate::db::util::{TimedClientExt, is_unique_violation};
use crate::db::{PgPool, validated_actor};

#[derive(Debug, thiserror::Error)]
pub enum VolunteerStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("volunteer id is missing")]
    MissingActor,
    #[error("volunteer profile already exists: {0}")]
    AlreadyExists(String),
    #[error("volunteer not found: {0}")]
    NotFound(String),
}

/// Most recent completed events first, so the scorer's lookback sees the
/// latest history.
const SELECT_VOLUNTEER: &str = "SELECT v.id, v.display_id, v.name, v.email, v.phone, v.location,
        v.skills, v.interests, v.available_days, v.available_times, v.created_at,
        COALESCE((
            SELECT array_agg(e.title ORDER BY a.checked_out_at DESC)
            FROM vm.attendance a
            JOIN vm.events e ON e.id = a.event_id
            WHERE a.volunteer_id = v.id AND a.checked_out_at IS NOT NULL
        ), '{}') AS past_event_titles
    FROM vm.volunteers v";

pub(crate) fn map_volunteer_row(row: &Row) -> Volunteer {
    Volunteer {
        id: row.get("id"),
        display_id: row.get("display_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        location: row.get("location"),
        skills: row.get("skills"),
        interests: row.get("interests"),
        available_days: row.get("available_days"),
        available_times: row.get("available_times"),
        past_event_titles: row.get("past_event_titles"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool, profile))]
pub async fn create_volunteer(
    pool: &PgPool,
    id: &str,
    profile: &VolunteerProfile,
) -> Result<Volunteer, VolunteerStorageError> {
    let id = validated_actor(id).ok_or(VolunteerStorageError::MissingActor)?;
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO vm.volunteers (
                id, name, email, phone, location,
                skills, interests, available_days, available_times
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            RETURNING id",
        )
        .await?;

    let inserted = client
        .timed_query_opt(
            &stmt,
            &[
                &id,
                &profile.name,
                &profile.email,
                &profile.phone,
                &profile.location,
                &profile.skills,
                &profile.interests,
                &profile.available_days,
                &profile.available_times,
            ],
            "create_volunteer",
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                VolunteerStorageError::AlreadyExists(id.to_string())
            } else {
                VolunteerStorageError::Postgres(err)
            }
        })?;

    if inserted.is_none() {
        return Err(VolunteerStorageError::AlreadyExists(id.to_string()));
    }

    get_volunteer(pool, id)
        .await?
        .ok_or_else(|| VolunteerStorageError::NotFound(id.to_string()))
}

#[instrument(skip(pool, profile))]
pub async fn update_volunteer(
    pool: &PgPool,
    id: &str,
    profile: &VolunteerProfile,
) -> Result<Volunteer, VolunteerStorageError> {
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "UPDATE vm.volunteers
             SET name = $2, email = $3, phone = $4, location = $5,
                 skills = $6, interests = $7, available_days = $8, available_times = $9,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .await?;

    let updated = client
        .timed_execute(
            &stmt,
            &[
                &id,
                &profile.name,
                &profile.email,
                &profile.phone,
                &profile.location,
                &profile.skills,
                &profile.interests,
                &profile.available_days,
                &profile.available_times,
            ],
            "update_volunteer",
        )
        .await?;

    if updated == 0 {
        return Err(VolunteerStorageError::NotFound(id.to_string()));
    }

    get_volunteer(pool, id)
        .await?
        .ok_or_else(|| VolunteerStorageError::NotFound(id.to_string()))
}

#[instrument(skip(pool))]
pub async fn get_volunteer(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Volunteer>, VolunteerStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!("{SELECT_VOLUNTEER} WHERE v.id = $1"))
        .await?;

    let row = client.timed_query_opt(&stmt, &[&id], "get_volunteer").await?;
    Ok(row.as_ref().map(map_volunteer_row))
}

/// Every registered volunteer with completed-event history, ordered by id.
#[instrument(skip(pool))]
pub async fn list_volunteers_for_matching(
    pool: &PgPool,
) -> Result<Vec<Volunteer>, VolunteerStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!("{SELECT_VOLUNTEER} ORDER BY v.id"))
        .await?;

    let rows = client
        .timed_query(&stmt, &[], "list_volunteers_for_matching")
        .await?;
    Ok(rows.iter().map(map_volunteer_row).collect())
}
