use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use sqlx::PgPool;
use tracing::Instrument;
use uuid::Uuid;

use crate::telemetry::{self};
use crate::telemetry::emit::Meta;
use crate::telemetry::ops::scan::Phase as ScanPhase;
use crate::util::time::today;

pub mod config;
pub mod db;
pub mod enrich;
pub mod extractor;
pub mod fetch;
pub mod normalize;
pub mod store;
pub mod targets;
pub mod types;
pub mod write;

use self::config::ScanConfig;
use self::enrich::Enricher;
use self::fetch::{fetch_page, HttpPageSource, PageSource};
use self::store::JobStore;
use self::targets::{resolve, CompanyDirectory};
use self::types::{ScanPlan, ScanRequest, ScanSummary, StepOutcome, Target, TargetSummary};

/// careerscan scan: fetch, extract and store internship postings
#[derive(Args)]
pub struct ScanCmd {
    /// Restrict to these company ids (repeatable). Omit to scan every company.
    #[arg(long = "company")]
    pub company: Vec<Uuid>,
    /// Geographies; the first one is the fallback location (repeatable)
    #[arg(long = "geo")]
    pub geo: Vec<String>,
    /// Request body form: {"companyIds":[...],"geographies":[...]}
    #[arg(long)]
    pub request: Option<String>,
    #[arg(long, default_value_t = false)]
    pub apply: bool,
    #[arg(long, default_value_t = 10)]
    pub plan_limit: usize,
}

impl ScanCmd {
    /// The request body (if any) with flag values appended.
    pub fn scan_request(&self) -> Result<ScanRequest> {
        let mut req = match &self.request {
            Some(body) => serde_json::from_str::<ScanRequest>(body).context("malformed --request body")?,
            None => ScanRequest::default(),
        };
        if !self.company.is_empty() {
            req.company_ids.get_or_insert_with(Vec::new).extend(self.company.iter().copied());
        }
        if !self.geo.is_empty() {
            req.geographies.get_or_insert_with(Vec::new).extend(self.geo.iter().cloned());
        }
        Ok(req)
    }
}

pub async fn run(pool: &PgPool, args: ScanCmd) -> Result<()> {
    let log = telemetry::scan();
    let t0 = Instant::now();

    let req = match args.scan_request() {
        Ok(req) => req,
        Err(e) => {
            if telemetry::config::json_mode() { log.failure(&e)?; }
            return Err(e);
        }
    };
    let run_id = Uuid::new_v4();
    let root = log.root_span_kv([
        ("run_id", run_id.to_string()),
        ("apply", args.apply.to_string()),
        ("plan_limit", args.plan_limit.to_string()),
        ("companies", format!("{:?}", req.company_ids)),
        ("geographies", format!("{:?}", req.geographies)),
    ]);

    let cfg = ScanConfig::from_env();
    let dir = db::PgDirectory::new(pool.clone());
    let store = db::PgJobStore::new(pool.clone());
    let pages = HttpPageSource::new(&cfg)?;
    let scanner = Scanner::new(&dir, &pages, &store, cfg);

    if !args.apply {
        let targets = scanner.targets(&req).instrument(root).await?;
        if telemetry::config::json_mode() {
            let plan = ScanPlan { targets: targets.len(), sample_targets: targets.iter().take(args.plan_limit).cloned().collect() };
            log.plan(&plan)?;
        } else {
            log.info(format!("📝 Scan plan — targets={}", targets.len()));
            for t in targets.iter().take(args.plan_limit) { log.info(format!("  {} {} ({})", t.company_id, t.url, t.company_name)); }
            if targets.len() > args.plan_limit { log.info(format!("  ... ({} more)", targets.len() - args.plan_limit)); }
            log.info("   Use --apply to execute.");
        }
        return Ok(());
    }

    let summary = scanner.run_scan(&req).instrument(root).await?;
    if telemetry::config::json_mode() {
        log.result_with_meta(&summary, Meta::for_run(run_id, t0))?;
    }
    Ok(())
}

/// One scan pass over resolved targets, processed strictly in sequence.
pub struct Scanner<'a> {
    dir: &'a dyn CompanyDirectory,
    pages: &'a dyn PageSource,
    store: &'a dyn JobStore,
    enricher: Enricher,
    cfg: ScanConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(dir: &'a dyn CompanyDirectory, pages: &'a dyn PageSource, store: &'a dyn JobStore, cfg: ScanConfig) -> Self {
        let enricher = Enricher::with_default_sources(cfg.enrich_timeout);
        Self { dir, pages, store, enricher, cfg }
    }

    pub async fn targets(&self, req: &ScanRequest) -> Result<Vec<Target>> {
        let log = telemetry::scan();
        resolve(self.dir, req.company_ids.as_deref())
            .instrument(log.span(&ScanPhase::Resolve))
            .await
            .context("resolving scan targets")
    }

    /// The `runScan` surface. An empty target list is a successful no-op;
    /// per-target trouble only shows up in the counts.
    pub async fn run_scan(&self, req: &ScanRequest) -> Result<ScanSummary> {
        let log = telemetry::scan();
        let targets = self.targets(req).await?;
        if targets.is_empty() {
            log.info("No companies or career pages found");
            return Ok(ScanSummary::default());
        }

        let default_geo = req.geographies.as_ref().and_then(|g| g.first()).map(String::as_str);
        let scan_date = today();
        let mut summary = ScanSummary::default();
        let mut total_failed = 0usize;

        for target in &targets {
            let span = log.span_kv(&ScanPhase::Target, [("company", target.company_name.clone()), ("url", target.url.clone())]);
            let t = self.scan_target(target, default_geo, scan_date).instrument(span).await;
            log.target_summary(&target.company_name, &target.url, t.found, t.inserted, t.skipped, t.failed);
            summary.total_inserted += t.inserted;
            summary.total_skipped += t.skipped;
            total_failed += t.failed;
            summary.per_target.push(t);
        }
        summary.companies_processed = targets.len();

        log.totals(summary.companies_processed, summary.total_inserted, summary.total_skipped, total_failed);
        Ok(summary)
    }

    async fn scan_target(&self, target: &Target, default_geo: Option<&str>, scan_date: NaiveDate) -> TargetSummary {
        let log = telemetry::scan();
        let mut out = TargetSummary { company_id: target.company_id, url: target.url.clone(), ..TargetSummary::default() };

        let fetched = fetch_page(self.pages, &target.url, self.cfg.fetch_timeout)
            .instrument(log.span(&ScanPhase::Fetch))
            .await;
        out.fetch = fetched.label();
        let page = match fetched {
            StepOutcome::Found(page) => page,
            StepOutcome::Empty => return out,
            StepOutcome::Failed(reason) => {
                log.warn_kv("fetch failed", [("url", target.url.clone()), ("reason", reason)]);
                return out;
            }
        };

        let postings = {
            let _s = log.span(&ScanPhase::Extract).entered();
            match extractor::extract(&page, &self.cfg) {
                StepOutcome::Found(found) => {
                    log.info_kv("extracted", [("source", found.source.to_string()), ("postings", found.postings.len().to_string())]);
                    found.postings
                }
                StepOutcome::Empty => Vec::new(),
                StepOutcome::Failed(reason) => {
                    log.warn_kv("extraction failed", [("url", page.url.clone()), ("reason", reason)]);
                    Vec::new()
                }
            }
        };
        out.found = postings.len();
        if postings.is_empty() {
            return out;
        }

        let mut jobs = Vec::with_capacity(postings.len());
        for raw in &postings {
            let mut job = normalize::normalize(raw, &page.html, default_geo, scan_date);
            let rate = self
                .enricher
                .acceptance_rate(self.pages, &raw.description_text, &job.url)
                .instrument(log.span(&ScanPhase::Enrich))
                .await;
            job.set_acceptance_rate(rate.found());
            jobs.push(job);
        }

        let counts = write::persist(self.store, target.company_id, jobs)
            .instrument(log.span(&ScanPhase::Persist))
            .await;
        out.inserted = counts.inserted;
        out.skipped = counts.skipped;
        out.failed = counts.failed;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::fetch::mock::StaticPages;
    use crate::scan::store::mock::MemoryJobStore;
    use crate::scan::targets::mock::MemoryDirectory;

    const CAREERS: &str = r#"<html><head><script type="application/ld+json">
        {"@context":"https://schema.org","@type":"JobPosting","title":"Platform Engineering Intern",
         "description":"Build internal tooling.","datePosted":"2026-02-01"}
        </script></head><body><h1>Careers</h1></body></html>"#;

    fn cmd(request: Option<&str>, geo: &[&str]) -> ScanCmd {
        ScanCmd {
            company: vec![],
            geo: geo.iter().map(|g| g.to_string()).collect(),
            request: request.map(str::to_string),
            apply: true,
            plan_limit: 10,
        }
    }

    #[tokio::test]
    async fn linked_data_posting_is_stored_once() {
        let dir = MemoryDirectory::default().company("Example", Some("https://example.com"));
        let pages = StaticPages::new().with("https://example.com/careers", CAREERS);
        let store = MemoryJobStore::new();
        let scanner = Scanner::new(&dir, &pages, &store, ScanConfig::default());

        let first = scanner.run_scan(&ScanRequest::default()).await.unwrap();
        assert_eq!(first.total_inserted, 1);
        assert_eq!(first.companies_processed, 1);

        let records = store.records();
        assert_eq!(records.len(), 1);
        let job = &records[0].job;
        assert_eq!(job.title, "Platform Engineering Intern");
        assert_eq!(job.due_date, None);
        assert!(job.is_rolling());
        assert_eq!(job.post_date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(job.location, "Location not specified");

        let second = scanner.run_scan(&ScanRequest::default()).await.unwrap();
        assert_eq!(second.total_inserted, 0);
        assert_eq!(second.total_skipped, 1);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_target_does_not_stop_the_pass() {
        let dir = MemoryDirectory::default()
            .company("Initech", None)
            .company("Example", Some("https://example.com"));
        let pages = StaticPages::new().with("https://example.com/careers", CAREERS);
        let store = MemoryJobStore::new();
        let scanner = Scanner::new(&dir, &pages, &store, ScanConfig::default());

        let req = cmd(None, &["Canada"]).scan_request().unwrap();
        let got = scanner.run_scan(&req).await.unwrap();
        assert_eq!(got.companies_processed, 2);
        assert_eq!(got.total_inserted, 1);
        assert_eq!(got.per_target[0].fetch, "failed");
        assert_eq!(got.per_target[1].fetch, "found");
        assert_eq!(store.records()[0].job.location, "Canada");
    }

    #[tokio::test]
    async fn timed_out_target_counts_nothing_and_the_pass_continues() {
        let dir = MemoryDirectory::default()
            .company("Initech", None)
            .company("Example", Some("https://example.com"));
        let pages = StaticPages::new()
            .timing_out("https://initech.com/careers")
            .timing_out("https://initech.com/jobs")
            .timing_out("https://initech.com/careers/en-us")
            .with("https://example.com/careers", CAREERS);
        let store = MemoryJobStore::new();
        let scanner = Scanner::new(&dir, &pages, &store, ScanConfig::default());

        let got = scanner.run_scan(&ScanRequest::default()).await.unwrap();
        assert_eq!(got.companies_processed, 2);
        assert_eq!(got.per_target[0].fetch, "failed");
        assert_eq!(got.per_target[0].found, 0);
        assert_eq!(got.per_target[0].inserted, 0);
        assert_eq!(got.per_target[1].fetch, "found");
        assert_eq!(got.total_inserted, 1);
    }

    #[tokio::test]
    async fn no_targets_is_a_no_op() {
        let dir = MemoryDirectory::default();
        let pages = StaticPages::new();
        let store = MemoryJobStore::new();
        let scanner = Scanner::new(&dir, &pages, &store, ScanConfig::default());
        let got = scanner.run_scan(&ScanRequest::default()).await.unwrap();
        assert_eq!(got, ScanSummary::default());
        assert!(pages.calls().is_empty());
    }

    #[test]
    fn request_body_and_flags_merge() {
        let id = Uuid::new_v4();
        let mut c = cmd(Some(&format!(r#"{{"companyIds":["{id}"]}}"#)), &["Remote"]);
        let req = c.scan_request().unwrap();
        assert_eq!(req.company_ids, Some(vec![id]));
        assert_eq!(req.geographies, Some(vec!["Remote".to_string()]));

        c.request = Some("{not json".into());
        assert!(c.scan_request().is_err());
    }
}
