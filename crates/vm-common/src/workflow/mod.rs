pub mod application;
pub mod attendance;
pub mod notifications;

pub use application::{ApplicationStatus, Decision, DecisionOutcome, TransitionError, decide};
pub use attendance::{
    AttendanceState, CheckinClaims, CheckinError, ScanAction, contributed_hours, issue_checkin_token,
    next_scan_action, verify_checkin_token,
};
pub use notifications::{NotificationDraft, NotificationKind};
