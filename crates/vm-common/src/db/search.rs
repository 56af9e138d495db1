use tracing::instrument;

use crate::api::search::SearchResults;
use crate::db::PgPool;
use crate::db::events::{EVENT_COLUMNS, map_event_row};
use crate::db::organizations::map_organization_row;
use crate::db::util::{TimedClientExt, escape_like};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Case-insensitive substring search over event titles/descriptions and
/// organization names/descriptions.
#[instrument(skip(pool))]
pub async fn search(
    pool: &PgPool,
    term: &str,
    limit: i64,
    offset: i64,
) -> Result<SearchResults, SearchError> {
    let pattern = format!("%{}%", escape_like(term));
    let client = pool.get().await?;

    let events_stmt = client
        .prepare_cached(&format!(
            "SELECT {EVENT_COLUMNS}
             FROM vm.events e
             WHERE e.title ILIKE $1 ESCAPE '\\' OR e.description ILIKE $1 ESCAPE '\\'
             ORDER BY e.event_date DESC NULLS LAST, e.id
             LIMIT $2 OFFSET $3"
        ))
        .await?;
    let event_rows = client
        .timed_query(&events_stmt, &[&pattern, &limit, &offset], "search_events")
        .await?;

    let orgs_stmt = client
        .prepare_cached(
            "SELECT id, display_id, name, email, phone, location, description, created_at
             FROM vm.organizations
             WHERE name ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\'
             ORDER BY name, id
             LIMIT $2 OFFSET $3",
        )
        .await?;
    let org_rows = client
        .timed_query(&orgs_stmt, &[&pattern, &limit, &offset], "search_organizations")
        .await?;

    Ok(SearchResults {
        query: term.to_string(),
        events: event_rows.iter().map(map_event_row).collect(),
        organizations: org_rows.iter().map(map_organization_row).collect(),
    })
}
