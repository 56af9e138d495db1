use tracing::instrument;

use crate::api::analytics::{EventAnalytics, OrganizationAnalytics};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Per-event headcounts for one organization: requested, registered,
/// accepted and actually checked out.
#[instrument(skip(pool))]
pub async fn organization_analytics(
    pool: &PgPool,
    organization_id: &str,
) -> Result<OrganizationAnalytics, AnalyticsError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT e.id, e.title, e.event_date, e.volunteers_needed,
                    COUNT(a.volunteer_id) FILTER (WHERE a.status = 'registered') AS registered,
                    COUNT(a.volunteer_id) FILTER (WHERE a.status = 'accepted') AS accepted,
                    (
                        SELECT COUNT(*) FROM vm.attendance t
                        WHERE t.event_id = e.id AND t.checked_out_at IS NOT NULL
                    ) AS participated
             FROM vm.events e
             LEFT JOIN vm.event_applications a ON a.event_id = e.id
             WHERE e.organization_id = $1
             GROUP BY e.id
             ORDER BY e.event_date DESC NULLS LAST, e.id",
        )
        .await?;

    let rows = client
        .timed_query(&stmt, &[&organization_id], "organization_analytics")
        .await?;

    let events = rows
        .iter()
        .map(|row| EventAnalytics {
            event_id: row.get("id"),
            title: row.get("title"),
            date: row.get("event_date"),
            volunteers_needed: row
                .get::<_, Option<i32>>("volunteers_needed")
                .and_then(|n| u32::try_from(n).ok()),
            registered: row.get("registered"),
            accepted: row.get("accepted"),
            participated: row.get("participated"),
        })
        .collect();

    Ok(OrganizationAnalytics::new(organization_id, events))
}
