use anyhow::Result;
use sqlx::PgPool;

use crate::telemetry::{self};
use crate::telemetry::ops::init::Phase as InitPhase;

pub async fn run(pool: &PgPool) -> Result<()> {
    let log = telemetry::init();
    let _g = log.root_span().entered();

    // Apply any pending migrations (idempotent)
    let _s = log.span(&InitPhase::Migrate).entered();
    sqlx::migrate!().run(pool).await?;

    log.info("✅ Database initialized");
    Ok(())
}
