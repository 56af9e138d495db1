use thiserror::Error;
use tracing::{info, instrument};

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "profiles and events",
        sql: r#"
CREATE SEQUENCE IF NOT EXISTS vm.volunteer_display_seq;
CREATE SEQUENCE IF NOT EXISTS vm.organization_display_seq;

CREATE TABLE IF NOT EXISTS vm.volunteers (
    id TEXT PRIMARY KEY,
    display_id TEXT NOT NULL UNIQUE
        DEFAULT 'U' || lpad(nextval('vm.volunteer_display_seq')::text, 3, '0'),
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    location TEXT,
    skills TEXT[] NOT NULL DEFAULT '{}',
    interests TEXT[] NOT NULL DEFAULT '{}',
    available_days TEXT[] NOT NULL DEFAULT '{}',
    available_times TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS vm.organizations (
    id TEXT PRIMARY KEY,
    display_id TEXT NOT NULL UNIQUE
        DEFAULT 'ORG' || lpad(nextval('vm.organization_display_seq')::text, 3, '0'),
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT,
    location TEXT,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS vm.events (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES vm.organizations(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    image_url TEXT,
    venue TEXT,
    city TEXT,
    skills TEXT[] NOT NULL DEFAULT '{}',
    interests TEXT[] NOT NULL DEFAULT '{}',
    volunteers_needed INTEGER CHECK (volunteers_needed IS NULL OR volunteers_needed > 0),
    event_date DATE,
    time_slot TEXT,
    contact_name TEXT,
    contact_info TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_events_organization
    ON vm.events(organization_id, event_date);
"#,
    },
    Migration {
        id: 2,
        description: "applications, recommendations, notifications",
        sql: r#"
CREATE TABLE IF NOT EXISTS vm.event_applications (
    event_id TEXT NOT NULL REFERENCES vm.events(id) ON DELETE CASCADE,
    volunteer_id TEXT NOT NULL REFERENCES vm.volunteers(id) ON DELETE CASCADE,
    status TEXT NOT NULL DEFAULT 'registered'
        CHECK (status IN ('registered', 'accepted', 'rejected')),
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    decided_at TIMESTAMPTZ,
    PRIMARY KEY (event_id, volunteer_id)
);

CREATE INDEX IF NOT EXISTS idx_event_applications_volunteer
    ON vm.event_applications(volunteer_id, status);

CREATE TABLE IF NOT EXISTS vm.recommended_matches (
    id BIGSERIAL PRIMARY KEY,
    event_id TEXT NOT NULL REFERENCES vm.events(id) ON DELETE CASCADE,
    volunteer_id TEXT NOT NULL REFERENCES vm.volunteers(id) ON DELETE CASCADE,
    rank INTEGER NOT NULL CHECK (rank > 0),
    score DOUBLE PRECISION NOT NULL CHECK (score >= 0),
    score_breakdown JSONB,
    match_run_id TEXT NOT NULL,
    engine_version TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (match_run_id, event_id, volunteer_id)
);

CREATE INDEX IF NOT EXISTS idx_recommended_matches_event
    ON vm.recommended_matches(event_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_recommended_matches_volunteer
    ON vm.recommended_matches(volunteer_id);

CREATE TABLE IF NOT EXISTS vm.notifications (
    id BIGSERIAL PRIMARY KEY,
    volunteer_id TEXT NOT NULL REFERENCES vm.volunteers(id) ON DELETE CASCADE,
    event_id TEXT REFERENCES vm.events(id) ON DELETE SET NULL,
    organization_id TEXT REFERENCES vm.organizations(id) ON DELETE SET NULL,
    kind TEXT NOT NULL CHECK (kind IN ('event', 'match', 'certificate')),
    message TEXT NOT NULL,
    read BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_notifications_volunteer
    ON vm.notifications(volunteer_id, created_at DESC);
"#,
    },
    Migration {
        id: 3,
        description: "attendance and certificates",
        sql: r#"
CREATE TABLE IF NOT EXISTS vm.attendance (
    event_id TEXT NOT NULL REFERENCES vm.events(id) ON DELETE CASCADE,
    volunteer_id TEXT NOT NULL REFERENCES vm.volunteers(id) ON DELETE CASCADE,
    checked_in_at TIMESTAMPTZ NOT NULL,
    checked_out_at TIMESTAMPTZ,
    hours_contributed DOUBLE PRECISION
        CHECK (hours_contributed IS NULL OR (hours_contributed >= 0 AND hours_contributed <= 24)),
    scanned_by TEXT NOT NULL,
    PRIMARY KEY (event_id, volunteer_id)
);

CREATE TABLE IF NOT EXISTS vm.certificates (
    id BIGSERIAL PRIMARY KEY,
    volunteer_id TEXT NOT NULL REFERENCES vm.volunteers(id) ON DELETE CASCADE,
    event_id TEXT NOT NULL REFERENCES vm.events(id) ON DELETE CASCADE,
    issue_date DATE NOT NULL DEFAULT CURRENT_DATE,
    volunteer_hours DOUBLE PRECISION NOT NULL,
    skills TEXT[] NOT NULL DEFAULT '{}',
    UNIQUE (volunteer_id, event_id)
);
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS vm;
             CREATE TABLE IF NOT EXISTS vm.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM vm.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO vm.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}
