use serde::{Deserialize, Serialize};

use super::ValidationError;
use crate::{Event, Organization};

const MAX_QUERY_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

const fn default_limit() -> i64 {
    20
}

impl SearchQuery {
    /// Trimmed search term.
    pub fn term(&self) -> Result<String, ValidationError> {
        let term = self.q.trim();
        if term.is_empty() {
            return Err(ValidationError::Missing("q"));
        }
        if term.chars().count() > MAX_QUERY_LEN {
            return Err(ValidationError::invalid(
                "q",
                format!("must be at most {MAX_QUERY_LEN} characters"),
            ));
        }
        Ok(term.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub events: Vec<Event>,
    pub organizations: Vec<Organization>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(q: &str) -> SearchQuery {
        SearchQuery {
            q: q.into(),
            limit: 20,
            offset: 0,
        }
    }

    #[test]
    fn trims_and_requires_term() {
        assert_eq!(query("  beach ").term().unwrap(), "beach");
        assert_eq!(query("   ").term(), Err(ValidationError::Missing("q")));
        assert!(query(&"x".repeat(101)).term().is_err());
    }
}
