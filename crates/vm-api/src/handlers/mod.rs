pub mod analytics;
pub mod applications;
pub mod attendance;
pub mod events;
pub mod health;
pub mod notifications;
pub mod pagination;
pub mod profiles;
pub mod recommendations;
pub mod schedule;
pub mod search;
pub mod volunteer;
