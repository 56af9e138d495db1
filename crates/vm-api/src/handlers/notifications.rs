use axum::{
    Json,
    extract::{Path, Query, State},
};
use vm_common::api::Pagination;
use vm_common::api::notification::{Notification, NotificationList};
use vm_common::db;

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::pagination::checked;

pub async fn list(
    State(state): State<SharedState>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<NotificationList>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let (limit, offset) = checked(page)?;
    let notifications = db::list_notifications(&state.pool, volunteer_id, limit, offset).await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Notification>, ApiError> {
    let volunteer_id = auth.volunteer_id()?;
    let notification = db::mark_notification_read(&state.pool, notification_id, volunteer_id).await?;
    Ok(Json(notification))
}
