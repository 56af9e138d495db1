use std::time::Instant;

use chrono::{NaiveDate, Utc};
use clap::Parser;
use dotenvy::dotenv;
use thiserror::Error;
use tracing::{info, warn};
use vm_common::Event;
use vm_common::db::{
    DbPoolError, EventStorageError, PgPool, RecommendationStorageError, VolunteerStorageError,
    create_pool_from_url_checked, get_event, list_events_for_rematch,
    list_volunteers_for_matching, store_recommendation,
};
use vm_common::logging::init_logging;
use vm_common::matching::MatchingEngine;

#[derive(Debug, Error)]
enum RematchError {
    #[error(transparent)]
    Pool(#[from] DbPoolError),
    #[error(transparent)]
    Events(#[from] EventStorageError),
    #[error(transparent)]
    Volunteers(#[from] VolunteerStorageError),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("{failed} of {total} events could not be re-matched")]
    Incomplete { failed: usize, total: usize },
}

#[derive(Debug, Parser)]
#[command(
    name = "vm-rematch",
    about = "Recompute volunteer recommendations for upcoming events"
)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    db_url: String,

    /// Re-match a single event, even if it is already in the past
    #[arg(long)]
    event_id: Option<String>,

    /// Earliest event date to include (default: today, UTC)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Rank and log without storing runs or sending notifications
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RematchSummary {
    events: usize,
    recommended: usize,
    notified: u64,
    failed: usize,
}

fn resolve_from(from: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    from.unwrap_or(today)
}

fn finish(summary: &RematchSummary) -> Result<(), RematchError> {
    if summary.failed > 0 {
        return Err(RematchError::Incomplete {
            failed: summary.failed,
            total: summary.events,
        });
    }
    Ok(())
}

async fn load_events(pool: &PgPool, args: &Cli) -> Result<Vec<Event>, RematchError> {
    match args.event_id.as_deref() {
        Some(id) => {
            let event = get_event(pool, id)
                .await?
                .ok_or_else(|| RematchError::EventNotFound(id.to_string()))?;
            Ok(vec![event])
        }
        None => {
            let from = resolve_from(args.from, Utc::now().date_naive());
            Ok(list_events_for_rematch(pool, from).await?)
        }
    }
}

async fn store(
    pool: &PgPool,
    engine: &MatchingEngine,
    event: &Event,
    volunteers: &[vm_common::Volunteer],
    dry_run: bool,
) -> Result<(usize, u64), RecommendationStorageError> {
    let started = Instant::now();
    let recommendation = engine.recommend(event, volunteers);
    let kept = recommendation.top.len();

    if dry_run {
        for ranked in &recommendation.top {
            info!(
                event_id = %event.id,
                rank = ranked.rank,
                volunteer_id = %ranked.volunteer_id,
                score = ranked.score.total,
                "dry run pick"
            );
        }
        return Ok((kept, 0));
    }

    let stored = store_recommendation(pool, &recommendation, event).await?;
    info!(
        event_id = %event.id,
        match_run_id = %recommendation.match_run_id,
        kept,
        notified = stored.notified,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "re-matched event"
    );
    Ok((kept, stored.notified))
}

async fn run() -> Result<(), RematchError> {
    dotenv().ok();
    init_logging(env!("CARGO_PKG_NAME"));

    let args = Cli::parse();
    let pool = create_pool_from_url_checked(&args.db_url).await?;
    let engine = MatchingEngine::default();

    let events = load_events(&pool, &args).await?;
    let volunteers = list_volunteers_for_matching(&pool).await?;
    info!(
        events = events.len(),
        volunteers = volunteers.len(),
        dry_run = args.dry_run,
        run_id = vm_common::run_id::process(),
        "starting rematch"
    );

    let mut summary = RematchSummary {
        events: events.len(),
        ..RematchSummary::default()
    };
    for event in &events {
        match store(&pool, &engine, event, &volunteers, args.dry_run).await {
            Ok((kept, notified)) => {
                summary.recommended += kept;
                summary.notified += notified;
            }
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "rematch failed for event");
                summary.failed += 1;
            }
        }
    }

    info!(
        events = summary.events,
        recommended = summary.recommended,
        notified = summary.notified,
        failed = summary.failed,
        "rematch finished"
    );
    finish(&summary)
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "vm-rematch failed");
        eprintln!("vm-rematch failed: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_defaults_to_today() {
        assert_eq!(resolve_from(None, date(2024, 6, 3)), date(2024, 6, 3));
        assert_eq!(
            resolve_from(Some(date(2024, 1, 1)), date(2024, 6, 3)),
            date(2024, 1, 1)
        );
    }

    #[test]
    fn any_failure_fails_the_run() {
        let ok = RematchSummary {
            events: 3,
            recommended: 9,
            notified: 4,
            failed: 0,
        };
        assert!(finish(&ok).is_ok());

        let partial = RematchSummary { failed: 1, ..ok };
        let err = finish(&partial).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 events could not be re-matched");
    }

    #[test]
    fn cli_parses_single_event_dry_run() {
        let cli = Cli::try_parse_from([
            "vm-rematch",
            "--db-url",
            "postgres://localhost/vm",
            "--event-id",
            "01HZX",
            "--from",
            "2024-06-01",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.event_id.as_deref(), Some("01HZX"));
        assert_eq!(cli.from, Some(date(2024, 6, 1)));
        assert!(cli.dry_run);
    }
}
