pub mod analytics;
pub mod applications;
pub mod attendance;
pub mod events;
pub mod migrations;
pub mod notifications;
pub mod organizations;
pub mod pool;
pub mod recommendations;
pub mod search;
pub mod util;
pub mod volunteers;

pub use analytics::{AnalyticsError, organization_analytics};
pub use applications::{
    ApplicationStorageError, DecisionResult, apply_to_event, application_status,
    decide_application, list_applicants, list_upcoming_events_for_volunteer,
};
pub use attendance::{
    AttendanceStorageError, list_certificates, list_participations, record_scan,
};
pub use events::{
    EventStorageError, delete_event, get_event, insert_event, list_events_by_organization,
    list_events_for_rematch, update_event,
};
pub use migrations::{MigrationError, run_migrations};
pub use notifications::{
    NotificationStorageError, insert_notification, list_notifications, mark_notification_read,
};
pub use organizations::{OrganizationStorageError, create_organization, get_organization};
pub use pool::{DbPoolError, PgPool, create_pool_from_url, create_pool_from_url_checked};
pub use recommendations::{
    MatchingRun, RecommendationInsert, RecommendationStorageError, StoredRecommendation,
    latest_recommendations, recommend_and_store, recommended_events_for_volunteer,
    store_recommendation,
};
pub use search::{SearchError, search};
pub use volunteers::{
    VolunteerStorageError, create_volunteer, get_volunteer, list_volunteers_for_matching,
    update_volunteer,
};

/// Trimmed actor id, or `None` when the caller identity is blank.
pub fn validated_actor(actor: &str) -> Option<&str> {
    let actor = actor.trim();
    (!actor.is_empty()).then_some(actor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validated_actor_trims_and_rejects_blank() {
        assert_eq!(validated_actor("  user-1 "), Some("user-1"));
        assert_eq!(validated_actor("   "), None);
    }
}
