use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::NotificationKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub volunteer_id: String,
    pub event_id: Option<String>,
    pub organization_id: Option<String>,
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}
