use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use tracing::instrument;

use crate::api::notification::{Notification, NotificationList};
use crate::db::PgPool;
use crate::db::util::TimedClientExt;
use crate::workflow::{NotificationDraft, NotificationKind};

#[derive(Debug, thiserror::Error)]
pub enum NotificationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("notification not found: {0}")]
    NotFound(i64),
    #[error("notification {0} belongs to another volunteer")]
    NotRecipient(i64),
}

fn map_notification_row(row: &Row) -> Notification {
    let kind: String = row.get("kind");
    Notification {
        id: row.get("id"),
        volunteer_id: row.get("volunteer_id"),
        event_id: row.get("event_id"),
        organization_id: row.get("organization_id"),
        kind: kind.parse().unwrap_or(NotificationKind::Event),
        message: row.get("message"),
        read: row.get("read"),
        created_at: row.get("created_at"),
    }
}

/// Store a notification on an open client or transaction.
pub async fn insert_notification(
    client: &impl GenericClient,
    draft: &NotificationDraft,
) -> Result<i64, tokio_postgres::Error> {
    let stmt = client
        .prepare_cached(
            "INSERT INTO vm.notifications (volunteer_id, event_id, organization_id, kind, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .await?;

    let row = client
        .timed_query_one(
            &stmt,
            &[
                &draft.volunteer_id,
                &draft.event_id,
                &draft.organization_id,
                &draft.kind.as_str(),
                &draft.message,
            ],
            "insert_notification",
        )
        .await?;
    Ok(row.get("id"))
}

/// Newest first, with the unread count across all of the volunteer's notifications.
#[instrument(skip(pool))]
pub async fn list_notifications(
    pool: &PgPool,
    volunteer_id: &str,
    limit: i64,
    offset: i64,
) -> Result<NotificationList, NotificationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT id, volunteer_id, event_id, organization_id, kind, message, read, created_at
             FROM vm.notifications
             WHERE volunteer_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3",
        )
        .await?;
    let rows = client
        .timed_query(
            &stmt,
            &[&volunteer_id, &limit, &offset],
            "list_notifications",
        )
        .await?;

    let unread_stmt = client
        .prepare_cached(
            "SELECT COUNT(*) FROM vm.notifications WHERE volunteer_id = $1 AND NOT read",
        )
        .await?;
    let unread: i64 = client
        .timed_query_one(&unread_stmt, &[&volunteer_id], "count_unread_notifications")
        .await?
        .get(0);

    Ok(NotificationList {
        notifications: rows.iter().map(map_notification_row).collect(),
        unread,
    })
}

#[instrument(skip(pool))]
pub async fn mark_notification_read(
    pool: &PgPool,
    id: i64,
    volunteer_id: &str,
) -> Result<Notification, NotificationStorageError> {
    let client = pool.get().await?;

    let owner_stmt = client
        .prepare_cached("SELECT volunteer_id FROM vm.notifications WHERE id = $1")
        .await?;
    let owner: String = client
        .timed_query_opt(&owner_stmt, &[&id], "notification_owner")
        .await?
        .ok_or(NotificationStorageError::NotFound(id))?
        .get("volunteer_id");
    if owner != volunteer_id {
        return Err(NotificationStorageError::NotRecipient(id));
    }

    let stmt = client
        .prepare_cached(
            "UPDATE vm.notifications
             SET read = TRUE
             WHERE id = $1 AND volunteer_id = $2
             RETURNING id, volunteer_id, event_id, organization_id, kind, message, read, created_at",
        )
        .await?;
    let row = client
        .timed_query_opt(&stmt, &[&id, &volunteer_id], "mark_notification_read")
        .await?
        .ok_or(NotificationStorageError::NotFound(id))?;

    Ok(map_notification_row(&row))
}
