use tokio_postgres::Row;
use tracing::instrument;

use crate::Organization;
use crate::api::profile::OrganizationProfile;
use crate::db::util::{TimedClientExt, is_unique_violation};
use crate::db::{PgPool, validated_actor};

#[derive(Debug, thiserror::Error)]
pub enum OrganizationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("organization id is missing")]
    MissingActor,
    #[error("organization profile already exists: {0}")]
    AlreadyExists(String),
}

pub(crate) fn map_organization_row(row: &Row) -> Organization {
    Organization {
        id: row.get("id"),
        display_id: row.get("display_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        location: row.get("location"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool, profile))]
pub async fn create_organization(
    pool: &PgPool,
    id: &str,
    profile: &OrganizationProfile,
) -> Result<Organization, OrganizationStorageError> {
    let id = validated_actor(id).ok_or(OrganizationStorageError::MissingActor)?;
    let client = pool.get().await?;

    let stmt = client
        .prepare_cached(
            "INSERT INTO vm.organizations (id, name, email, phone, location, description)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO NOTHING
             RETURNING id, display_id, name, email, phone, location, description, created_at",
        )
        .await?;

    let row = client
        .timed_query_opt(
            &stmt,
            &[
                &id,
                &profile.name,
                &profile.email,
                &profile.phone,
                &profile.location,
                &profile.description,
            ],
            "create_organization",
        )
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                OrganizationStorageError::AlreadyExists(id.to_string())
            } else {
                OrganizationStorageError::Postgres(err)
            }
        })?
        .ok_or_else(|| OrganizationStorageError::AlreadyExists(id.to_string()))?;

    Ok(map_organization_row(&row))
}

#[instrument(skip(pool))]
pub async fn get_organization(
    pool: &PgPool,
    id: &str,
) -> Result<Option<Organization>, OrganizationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT id, display_id, name, email, phone, location, description, created_at
             FROM vm.organizations
             WHERE id = $1",
        )
        .await?;

    let row = client
        .timed_query_opt(&stmt, &[&id], "get_organization")
        .await?;
    Ok(row.as_ref().map(map_organization_row))
}
