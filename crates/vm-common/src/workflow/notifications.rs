use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

use super::application::Decision;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, IntoStaticStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// Application accepted or rejected.
    Event,
    /// Picked by the recommender for a new event.
    Match,
    Certificate,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// A notification ready to be stored for one volunteer.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub volunteer_id: String,
    pub event_id: Option<String>,
    pub organization_id: Option<String>,
    pub kind: NotificationKind,
    pub message: String,
}

impl NotificationDraft {
    pub fn decision(
        decision: Decision,
        volunteer_id: &str,
        event_id: &str,
        organization_id: &str,
        event_title: &str,
    ) -> Self {
        let message = match decision {
            Decision::Accept => {
                format!("Your request has been accepted for the event '{event_title}'.")
            }
            Decision::Reject => format!(
                "We appreciate your interest. Unfortunately, your request for the event \
                 '{event_title}' was not accepted."
            ),
        };

        Self {
            volunteer_id: volunteer_id.to_string(),
            event_id: Some(event_id.to_string()),
            organization_id: Some(organization_id.to_string()),
            kind: NotificationKind::Event,
            message,
        }
    }

    pub fn recommended(
        volunteer_id: &str,
        event_id: &str,
        organization_id: &str,
        event_title: &str,
    ) -> Self {
        Self {
            volunteer_id: volunteer_id.to_string(),
            event_id: Some(event_id.to_string()),
            organization_id: Some(organization_id.to_string()),
            kind: NotificationKind::Match,
            message: format!("You have been recommended for the event '{event_title}'."),
        }
    }

    pub fn certificate(
        volunteer_id: &str,
        event_id: &str,
        organization_id: &str,
        event_title: &str,
        hours: f64,
    ) -> Self {
        Self {
            volunteer_id: volunteer_id.to_string(),
            event_id: Some(event_id.to_string()),
            organization_id: Some(organization_id.to_string()),
            kind: NotificationKind::Certificate,
            message: format!(
                "Thank you for volunteering at '{event_title}'. Your certificate for {hours:.2} hours is ready."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_messages_use_event_title() {
        let accepted = NotificationDraft::decision(Decision::Accept, "v1", "e1", "o1", "Food Drive");
        assert_eq!(
            accepted.message,
            "Your request has been accepted for the event 'Food Drive'."
        );
        assert_eq!(accepted.kind, NotificationKind::Event);

        let rejected = NotificationDraft::decision(Decision::Reject, "v1", "e1", "o1", "Food Drive");
        assert_eq!(
            rejected.message,
            "We appreciate your interest. Unfortunately, your request for the event 'Food Drive' was not accepted."
        );
    }

    #[test]
    fn certificate_message_formats_hours() {
        let draft = NotificationDraft::certificate("v1", "e1", "o1", "Beach Cleanup", 2.5);
        assert!(draft.message.contains("2.50 hours"));
        assert_eq!(draft.kind.as_str(), "certificate");
    }

    #[test]
    fn kinds_parse_from_storage() {
        assert_eq!("match".parse::<NotificationKind>(), Ok(NotificationKind::Match));
        assert!("reminder".parse::<NotificationKind>().is_err());
    }
}
