use chrono::{DateTime, Duration, NaiveDate, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Event;

/// Audience stamped on check-in tokens so login tokens signed with the same
/// secret are never accepted at the scanner.
pub const CHECKIN_AUDIENCE: &str = "vm-checkin";
const UNDATED_VALIDITY_DAYS: i64 = 7;
const MAX_SHIFT_HOURS: f64 = 24.0;

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("event has already ended")]
    EventOver,
    #[error("check-in token expired")]
    Expired,
    #[error("invalid check-in token: {0}")]
    Invalid(String),
    #[error("failed to sign check-in token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// What the volunteer's QR code carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinClaims {
    /// Volunteer id.
    pub sub: String,
    pub event_id: String,
    pub title: String,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub venue: Option<String>,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl CheckinClaims {
    pub fn volunteer_id(&self) -> &str {
        &self.sub
    }
}

/// Tokens stay valid through the day after the event; undated events get a
/// fixed window from issue time.
fn expires_at(event: &Event, now: DateTime<Utc>) -> DateTime<Utc> {
    match event.date {
        Some(date) => (date + Duration::days(2))
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(now),
        None => now + Duration::days(UNDATED_VALIDITY_DAYS),
    }
}

pub fn issue_checkin_token(
    secret: &[u8],
    event: &Event,
    volunteer_id: &str,
    now: DateTime<Utc>,
) -> Result<String, CheckinError> {
    let exp = expires_at(event, now);
    if exp <= now {
        return Err(CheckinError::EventOver);
    }

    let claims = CheckinClaims {
        sub: volunteer_id.to_string(),
        event_id: event.id.clone(),
        title: event.title.clone(),
        date: event.date,
        time_slot: event.time_slot.clone(),
        venue: event.venue.clone(),
        aud: CHECKIN_AUDIENCE.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(CheckinError::Signing)
}

pub fn verify_checkin_token(secret: &[u8], token: &str) -> Result<CheckinClaims, CheckinError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[CHECKIN_AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "sub", "aud"]);

    decode::<CheckinClaims>(token.trim(), &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => CheckinError::Expired,
            _ => CheckinError::Invalid(err.to_string()),
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceState {
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
    AlreadyCompleted,
}

/// First scan checks in, second checks out, anything after is rejected.
pub fn next_scan_action(state: Option<&AttendanceState>) -> ScanAction {
    match state {
        None
        | Some(AttendanceState {
            checked_in_at: None,
            ..
        }) => ScanAction::CheckIn,
        Some(AttendanceState {
            checked_out_at: None,
            ..
        }) => ScanAction::CheckOut,
        Some(_) => ScanAction::AlreadyCompleted,
    }
}

/// Elapsed hours between scans, rounded to two decimals and clamped to a
/// single day.
pub fn contributed_hours(checked_in_at: DateTime<Utc>, checked_out_at: DateTime<Utc>) -> f64 {
    let seconds = (checked_out_at - checked_in_at).num_seconds() as f64;
    let hours = (seconds / 3600.0 * 100.0).round() / 100.0;
    hours.clamp(0.0, MAX_SHIFT_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"checkin-test-secret";

    fn event(date: Option<NaiveDate>) -> Event {
        Event {
            id: "evt-1".into(),
            organization_id: "org-1".into(),
            title: "Beach Cleanup".into(),
            venue: Some("Marina Beach".into()),
            date,
            time_slot: Some("9AM-12PM".into()),
            ..Event::default()
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let now = Utc::now();
        let date = (now + Duration::days(3)).date_naive();
        let token = issue_checkin_token(SECRET, &event(Some(date)), "vol-7", now).unwrap();

        let claims = verify_checkin_token(SECRET, &token).unwrap();
        assert_eq!(claims.volunteer_id(), "vol-7");
        assert_eq!(claims.event_id, "evt-1");
        assert_eq!(claims.date, Some(date));
        assert_eq!(claims.venue.as_deref(), Some("Marina Beach"));
        assert_eq!(
            claims.exp,
            (date + Duration::days(2))
                .and_hms_opt(0, 0, 0)
                .unwrap()
                .and_utc()
                .timestamp()
        );
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let now = Utc::now();
        let token = issue_checkin_token(SECRET, &event(None), "vol-7", now).unwrap();
        let err = verify_checkin_token(b"other-secret", &token).unwrap_err();
        assert!(matches!(err, CheckinError::Invalid(_)));
    }

    #[test]
    fn stale_undated_token_is_expired() {
        let issued = Utc::now() - Duration::days(30);
        let token = issue_checkin_token(SECRET, &event(None), "vol-7", issued).unwrap();
        let err = verify_checkin_token(SECRET, &token).unwrap_err();
        assert!(matches!(err, CheckinError::Expired));
    }

    #[test]
    fn no_token_for_finished_event() {
        let now = Utc::now();
        let long_ago = (now - Duration::days(10)).date_naive();
        let err = issue_checkin_token(SECRET, &event(Some(long_ago)), "vol-7", now).unwrap_err();
        assert!(matches!(err, CheckinError::EventOver));
    }

    #[test]
    fn scans_alternate_between_in_and_out() {
        let now = Utc::now();
        assert_eq!(next_scan_action(None), ScanAction::CheckIn);
        assert_eq!(
            next_scan_action(Some(&AttendanceState::default())),
            ScanAction::CheckIn
        );

        let checked_in = AttendanceState {
            checked_in_at: Some(now),
            checked_out_at: None,
        };
        assert_eq!(next_scan_action(Some(&checked_in)), ScanAction::CheckOut);

        let done = AttendanceState {
            checked_in_at: Some(now),
            checked_out_at: Some(now),
        };
        assert_eq!(next_scan_action(Some(&done)), ScanAction::AlreadyCompleted);
    }

    #[test]
    fn hours_are_rounded_and_clamped() {
        let start = Utc::now();
        assert_eq!(contributed_hours(start, start + Duration::minutes(150)), 2.5);
        assert_eq!(contributed_hours(start, start + Duration::minutes(20)), 0.33);
        assert_eq!(contributed_hours(start, start - Duration::minutes(5)), 0.0);
        assert_eq!(contributed_hours(start, start + Duration::hours(30)), 24.0);
    }
}
