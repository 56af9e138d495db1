use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::error;

use vm_common::api::ValidationError;
use vm_common::db::{
    AnalyticsError, ApplicationStorageError, AttendanceStorageError, DbPoolError,
    EventStorageError, MigrationError, NotificationStorageError, OrganizationStorageError,
    RecommendationStorageError, SearchError, VolunteerStorageError,
};
use vm_common::matching::ScheduleError;
use vm_common::workflow::{CheckinError, TransitionError};

tokio::task_local! {
    static REQUEST_ID: String;
}

fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .replace(['\n', '\r'], " ");

    cleaned = cleaned
        .split_whitespace()
        .map(|token| {
            if token.contains("://") {
                "[redacted-url]".to_string()
            } else if let Some((base, _)) = token.split_once('?') {
                if base.is_empty() {
                    "[redacted-query]".to_string()
                } else {
                    format!("{base}?[redacted]")
                }
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
        cleaned.push_str("...");
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("too many requests: {0}")]
    TooManyRequests(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        error!(
            code,
            status = %status,
            request_id = request_id.as_deref().unwrap_or(""),
            error = %self,
            "api_error"
        );

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::TooManyRequests(_) => "too_many_requests",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Database(_) => "database_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Unauthorized(_) => Cow::Borrowed("unauthorized"),
            ApiError::Forbidden(_) => Cow::Borrowed("forbidden"),
            ApiError::NotFound(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::Conflict(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::TooManyRequests(_) => Cow::Borrowed("too many requests"),
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Database(_) | ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Storage errors whose only variants are pool/postgres failures.
macro_rules! database_only {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(value: $ty) -> Self {
                    ApiError::Database(value.to_string())
                }
            }
        )*
    };
}

database_only!(AnalyticsError, SearchError, DbPoolError, MigrationError);

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

impl From<TransitionError> for ApiError {
    fn from(value: TransitionError) -> Self {
        ApiError::Conflict(value.to_string())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

impl From<CheckinError> for ApiError {
    fn from(value: CheckinError) -> Self {
        match value {
            CheckinError::EventOver => ApiError::Conflict(value.to_string()),
            CheckinError::Expired | CheckinError::Invalid(_) => {
                ApiError::BadRequest(value.to_string())
            }
            CheckinError::Signing(_) => ApiError::Internal(value.to_string()),
        }
    }
}

impl From<VolunteerStorageError> for ApiError {
    fn from(value: VolunteerStorageError) -> Self {
        match value {
            VolunteerStorageError::MissingActor => {
                ApiError::BadRequest("volunteer id is required".into())
            }
            VolunteerStorageError::AlreadyExists(_) => {
                ApiError::Conflict("volunteer profile already exists".into())
            }
            VolunteerStorageError::NotFound(id) => {
                ApiError::NotFound(format!("volunteer not found: {id}"))
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<OrganizationStorageError> for ApiError {
    fn from(value: OrganizationStorageError) -> Self {
        match value {
            OrganizationStorageError::MissingActor => {
                ApiError::BadRequest("organization id is required".into())
            }
            OrganizationStorageError::AlreadyExists(_) => {
                ApiError::Conflict("organization profile already exists".into())
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<EventStorageError> for ApiError {
    fn from(value: EventStorageError) -> Self {
        match value {
            EventStorageError::NotFound(id) => ApiError::NotFound(format!("event not found: {id}")),
            EventStorageError::OrganizationMissing(_) => ApiError::Conflict(
                "create the organization profile before posting events".into(),
            ),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<ApplicationStorageError> for ApiError {
    fn from(value: ApplicationStorageError) -> Self {
        match value {
            ApplicationStorageError::MissingActor => {
                ApiError::BadRequest("volunteer id is required".into())
            }
            ApplicationStorageError::MissingReference => {
                ApiError::NotFound("event or volunteer profile not found".into())
            }
            ApplicationStorageError::NotRegistered { .. } => ApiError::NotFound(value.to_string()),
            ApplicationStorageError::Transition(err) => err.into(),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<RecommendationStorageError> for ApiError {
    fn from(value: RecommendationStorageError) -> Self {
        match value {
            RecommendationStorageError::Volunteers(err) => err.into(),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<NotificationStorageError> for ApiError {
    fn from(value: NotificationStorageError) -> Self {
        match value {
            NotificationStorageError::NotFound(_) => ApiError::NotFound(value.to_string()),
            NotificationStorageError::NotRecipient(_) => ApiError::Forbidden(value.to_string()),
            other => ApiError::Database(other.to_string()),
        }
    }
}

impl From<AttendanceStorageError> for ApiError {
    fn from(value: AttendanceStorageError) -> Self {
        match value {
            AttendanceStorageError::EventNotFound(_) => ApiError::NotFound(value.to_string()),
            AttendanceStorageError::NotOwner(_) => ApiError::Forbidden(value.to_string()),
            AttendanceStorageError::NotAccepted(_) | AttendanceStorageError::AlreadyCompleted(_) => {
                ApiError::Conflict(value.to_string())
            }
            other => ApiError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;
    use vm_common::workflow::ApplicationStatus;

    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let err = ApiError::Internal("boom".into());
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["request_id"], "req-123");
    }

    #[tokio::test]
    async fn database_details_stay_private() {
        let (status, json) = body_json(ApiError::Database("relation vm.events missing".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "database_error");
        assert_eq!(json["message"], "internal server error");
    }

    #[tokio::test]
    async fn workflow_errors_map_to_conflict() {
        let err: ApiError = ApplicationStorageError::Transition(TransitionError::AlreadyDecided(
            ApplicationStatus::Rejected,
        ))
        .into();
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "application was already rejected");

        let full: ApiError = TransitionError::CapacityReached {
            accepted: 3,
            needed: 3,
        }
        .into();
        assert!(matches!(full, ApiError::Conflict(_)));
    }

    #[test]
    fn checkin_errors_map_by_cause() {
        assert!(matches!(
            ApiError::from(CheckinError::EventOver),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(CheckinError::Expired),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(NotificationStorageError::NotRecipient(7)),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn sanitize_redacts_urls_and_paths() {
        let cleaned = sanitize_message("failed at postgres://u:p@db/x reading /etc/passwd");
        assert!(!cleaned.contains("postgres://"));
        assert!(cleaned.contains("[redacted-url]"));
        assert!(cleaned.contains("[redacted-path]"));
        assert_eq!(sanitize_message("\n"), "unexpected error");
        assert_eq!(sanitize_message("C:\\data\\vm.log"), "[redacted-path]");
        assert_eq!(sanitize_message("   "), "unexpected error");
    }
}
