pub mod availability;
pub mod location;
pub mod pipeline;
pub mod schedule;
pub mod scoring;
pub mod similarity;
pub mod skills;
pub mod weights;

pub use pipeline::{MatchingEngine, RankedVolunteer, Recommendation};
pub use schedule::{
    ScheduleConfig, ScheduleError, ScheduleRequest, ScheduleSuggestion, suggest_schedule,
};
pub use scoring::{FactorScore, MatchScore, MatchingConfig, VolunteerScorer};
pub use weights::{DEFAULT_WEIGHTS, MatchWeights};
