use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;
use url::Url;
use uuid::Uuid;

use crate::telemetry::{self};
use crate::telemetry::ops::company::Phase as CompanyPhase;

mod db;
pub mod types;

/// careerscan company add/page/ls
#[derive(Args)]
pub struct CompanyCmd {
    #[command(subcommand)]
    pub cmd: CompanySub,
}

#[derive(Subcommand)]
pub enum CompanySub {
    // register a company (plan-only by default; use --apply to write)
    Add {
        name: String,
        #[arg(long)]
        website: Option<String>,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // record an explicit career-page URL for a company
    Page {
        company_id: Uuid,
        url: String,
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    // list companies and their career pages
    Ls,
}

pub async fn run(pool: &PgPool, args: CompanyCmd) -> Result<()> {
    let log = telemetry::company();
    let _g = log.root_span().entered();
    match args.cmd {
        CompanySub::Add { name, website, apply } => add_company(pool, name, website, apply).await?,
        CompanySub::Page { company_id, url, apply } => add_page(pool, company_id, url, apply).await?,
        CompanySub::Ls => ls_companies(pool).await?,
    }
    Ok(())
}

/// Only http(s) URLs with a host are accepted.
fn checked_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(raw.to_string()),
        _ => bail!("Invalid URL: {}", raw),
    }
}

fn checked_name(raw: &str) -> Result<String> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() { bail!("Company name must not be empty"); }
    Ok(name)
}

async fn add_company(pool: &PgPool, name: String, website: Option<String>, apply: bool) -> Result<()> {
    let log = telemetry::company();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("name", name.clone()),
        ("website", format!("{:?}", website)),
    ]).entered();

    // friendly errors before DB I/O
    let name = checked_name(&name)?;
    let website = website.as_deref().map(checked_url).transpose()?;

    if !apply {
        let _s = log.span(&CompanyPhase::Plan).entered();
        log.info(format!("📝 Company plan — add name={} website={:?}", name, website));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::CompanyAddPlan { action: "add", name, website };
            log.plan(&plan)?;
        }
        return Ok(());
    }
    let _s = log.span(&CompanyPhase::Add).entered();
    let (company_id, inserted) = db::upsert_company(pool, &name, website.as_deref()).await?;
    if inserted { log.info(format!("➕ Company added: {}", company_id)); } else { log.info(format!("♻️ Company updated: {}", company_id)); }
    if telemetry::config::json_mode() {
        let result = types::CompanyAddResult { inserted, company_id, name };
        log.result(&result)?;
    }
    Ok(())
}

async fn add_page(pool: &PgPool, company_id: Uuid, url: String, apply: bool) -> Result<()> {
    let log = telemetry::company();
    let _g = log.root_span_kv([
        ("mode", if apply { "apply".to_string() } else { "plan".to_string() }),
        ("company_id", company_id.to_string()),
        ("url", url.clone()),
    ]).entered();

    let url = checked_url(&url)?;
    let Some(name) = db::company_name(pool, company_id).await? else {
        bail!("Unknown company: {}", company_id);
    };

    if !apply {
        let _s = log.span(&CompanyPhase::Plan).entered();
        log.info(format!("📝 Career page plan — {} ({}) url={}", name, company_id, url));
        log.info("   Use --apply to execute.");
        if telemetry::config::json_mode() {
            let plan = types::CareerPagePlan { action: "page", company_id, url };
            log.plan(&plan)?;
        }
        return Ok(());
    }
    let _s = log.span(&CompanyPhase::Page).entered();
    let inserted = db::insert_career_page(pool, company_id, &url).await?;
    if inserted { log.info("➕ Career page added"); } else { log.info("↩️ Career page already recorded"); }
    if telemetry::config::json_mode() {
        let result = types::CareerPageResult { inserted, company_id, url };
        log.result(&result)?;
    }
    Ok(())
}

async fn ls_companies(pool: &PgPool) -> Result<()> {
    let log = telemetry::company();
    let _g = log.root_span().entered();
    let _s = log.span(&CompanyPhase::List).entered();
    let companies = db::list_companies(pool).await?;
    log.info("🏢 Companies:");
    for row in &companies {
        log.info(format!("[{}] {} website={:?} added_at={}", row.company_id, row.name, row.website, row.added_at));
        for page in &row.career_pages { log.info(format!("    page {}", page)); }
    }
    if telemetry::config::json_mode() {
        let list = types::CompanyList { companies };
        log.result(&list)?;
    }
    Ok(())
}
