use anyhow::Result;
use clap::{Args, Subcommand};
use sqlx::PgPool;
use uuid::Uuid;

use crate::telemetry::{self};
use crate::telemetry::ops::jobs::Phase as JobsPhase;

mod db;
pub mod types;

/// careerscan jobs ls
#[derive(Args)]
pub struct JobsCmd {
    #[command(subcommand)]
    pub cmd: JobsSub,
}

#[derive(Subcommand)]
pub enum JobsSub {
    // list stored listings, newest first
    Ls {
        #[arg(long)]
        company: Option<Uuid>,
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

pub async fn run(pool: &PgPool, args: JobsCmd) -> Result<()> {
    match args.cmd {
        JobsSub::Ls { company, limit } => ls_jobs(pool, company, limit).await,
    }
}

fn deadline(row: &types::JobRow) -> String {
    match row.due_date {
        Some(d) => format!("due {}", d),
        None => "rolling".to_string(),
    }
}

async fn ls_jobs(pool: &PgPool, company: Option<Uuid>, limit: i64) -> Result<()> {
    let log = telemetry::jobs();
    let _g = log.root_span_kv([("company", format!("{:?}", company)), ("limit", limit.to_string())]).entered();
    let _s = log.span(&JobsPhase::List).entered();
    let jobs = db::list_jobs(pool, company, limit.max(1)).await?;
    log.info(format!("🎓 Listings: {}", jobs.len()));
    for row in &jobs {
        log.info(format!(
            "[{}] {} — {} | {} | {} | posted {} | visa={} rate={:?}",
            row.job_id, row.company_name, row.title, row.location, deadline(row), row.post_date, row.visa_sponsorship, row.acceptance_rate
        ));
    }
    if telemetry::config::json_mode() {
        let list = types::JobList { total: jobs.len(), jobs };
        log.result(&list)?;
    }
    Ok(())
}
