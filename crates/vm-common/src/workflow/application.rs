use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};
use thiserror::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    IntoStaticStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationStatus {
    Registered,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> ApplicationStatus {
        match self {
            Decision::Accept => ApplicationStatus::Accepted,
            Decision::Reject => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("application was already {}", .0.as_str())]
    AlreadyDecided(ApplicationStatus),
    #[error("event already has {accepted} of {needed} volunteers accepted")]
    CapacityReached { accepted: u32, needed: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Status moved; the caller persists it and notifies the volunteer.
    Changed(ApplicationStatus),
    /// Same decision repeated; nothing to write or send.
    Unchanged(ApplicationStatus),
}

/// Validate an organization's decision on a registration.
///
/// `accepted_count` is the number of volunteers already accepted for the
/// event, excluding this one.
pub fn decide(
    current: ApplicationStatus,
    decision: Decision,
    accepted_count: u32,
    volunteers_needed: Option<u32>,
) -> Result<DecisionOutcome, TransitionError> {
    let target = decision.target_status();

    if current == target {
        return Ok(DecisionOutcome::Unchanged(current));
    }
    if current != ApplicationStatus::Registered {
        return Err(TransitionError::AlreadyDecided(current));
    }

    if decision == Decision::Accept {
        if let Some(needed) = volunteers_needed.filter(|n| *n > 0) {
            if accepted_count >= needed {
                return Err(TransitionError::CapacityReached {
                    accepted: accepted_count,
                    needed,
                });
            }
        }
    }

    Ok(DecisionOutcome::Changed(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_can_be_accepted_or_rejected() {
        assert_eq!(
            decide(ApplicationStatus::Registered, Decision::Accept, 0, Some(2)),
            Ok(DecisionOutcome::Changed(ApplicationStatus::Accepted))
        );
        assert_eq!(
            decide(ApplicationStatus::Registered, Decision::Reject, 5, Some(2)),
            Ok(DecisionOutcome::Changed(ApplicationStatus::Rejected))
        );
    }

    #[test]
    fn repeating_a_decision_is_a_no_op() {
        assert_eq!(
            decide(ApplicationStatus::Accepted, Decision::Accept, 3, Some(3)),
            Ok(DecisionOutcome::Unchanged(ApplicationStatus::Accepted))
        );
    }

    #[test]
    fn reversing_a_decision_conflicts() {
        let err = decide(ApplicationStatus::Rejected, Decision::Accept, 0, None).unwrap_err();
        assert_eq!(err, TransitionError::AlreadyDecided(ApplicationStatus::Rejected));
        assert_eq!(err.to_string(), "application was already rejected");
    }

    #[test]
    fn accepting_past_capacity_is_refused() {
        let err = decide(ApplicationStatus::Registered, Decision::Accept, 2, Some(2)).unwrap_err();
        assert_eq!(
            err,
            TransitionError::CapacityReached {
                accepted: 2,
                needed: 2
            }
        );
        // no declared capacity
        assert!(decide(ApplicationStatus::Registered, Decision::Accept, 40, None).is_ok());
        assert!(decide(ApplicationStatus::Registered, Decision::Accept, 40, Some(0)).is_ok());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ApplicationStatus::Registered,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<ApplicationStatus>(), Ok(status));
            assert_eq!(status.as_ref(), status.as_str());
        }
        assert!("pending".parse::<ApplicationStatus>().is_err());
    }
}
