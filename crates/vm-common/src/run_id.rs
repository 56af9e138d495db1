//! ULID based identifiers.
//!
//! Every recommendation run gets its own ULID so that repeated runs for the
//! same event stay distinguishable and the latest one sorts last. Event ids
//! use the same scheme.

use once_cell::sync::Lazy;
use ulid::Ulid;

static PROCESS_RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Identifier shared by everything this process does; logged at startup.
pub fn process() -> &'static str {
    &PROCESS_RUN_ID
}

/// A fresh, time-ordered identifier (26 chars, URL safe).
pub fn generate() -> String {
    Ulid::new().to_string()
}
