use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use super::fetch::PageSource;
use super::types::StepOutcome;

static RATE_LABELLED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)acceptance\s*rate[:\s]*(\d+(?:\.\d+)?)\s*%").unwrap());
static RATE_PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*%\s*acceptance").unwrap());
static RATE_OUT_OF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*out\s*of\s*(\d[\d,]*)\s*applicants").unwrap());
static RATE_SELECTED_FROM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*selected\s*from\s*(\d[\d,]*)").unwrap());

fn number(s: &str) -> Option<f64> {
    s.replace(',', "").parse::<f64>().ok()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Explicit rate or applicant ratio stated in free text.
pub fn rate_from_text(text: &str) -> Option<f64> {
    for re in [&RATE_LABELLED, &RATE_PERCENT] {
        if let Some(rate) = re.captures(text).and_then(|c| number(&c[1])) {
            if rate > 0.0 && rate <= 100.0 {
                return Some(round2(rate));
            }
        }
    }
    for re in [&RATE_OUT_OF, &RATE_SELECTED_FROM] {
        if let Some(c) = re.captures(text) {
            let (Some(selected), Some(applicants)) = (number(&c[1]), number(&c[2])) else { continue };
            if selected > 0.0 && selected <= applicants {
                return Some(round2(selected / applicants * 100.0));
            }
        }
    }
    None
}

/// A secondary page that may state an acceptance rate for a posting.
#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn handles(&self, url: &str) -> bool;
    async fn lookup(&self, pages: &dyn PageSource, url: &str, timeout: Duration) -> StepOutcome<f64>;
}

/// Professional-network job pages (`linkedin.com/jobs/...`).
pub struct ProfessionalNetwork;

#[async_trait]
impl RateSource for ProfessionalNetwork {
    fn name(&self) -> &'static str { "linkedin" }

    fn handles(&self, url: &str) -> bool {
        url.to_lowercase().contains("linkedin.com/jobs")
    }

    async fn lookup(&self, pages: &dyn PageSource, url: &str, timeout: Duration) -> StepOutcome<f64> {
        match pages.get(url, timeout).await {
            Ok(html) => match rate_from_text(&html) {
                Some(rate) => StepOutcome::Found(rate),
                None => StepOutcome::Empty,
            },
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }
}

pub struct Enricher {
    sources: Vec<Box<dyn RateSource>>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(sources: Vec<Box<dyn RateSource>>, timeout: Duration) -> Self {
        Self { sources, timeout }
    }

    pub fn with_default_sources(timeout: Duration) -> Self {
        Self::new(vec![Box::new(ProfessionalNetwork)], timeout)
    }

    /// Description first; then at most one secondary lookup. Never fails.
    pub async fn acceptance_rate(&self, pages: &dyn PageSource, description: &str, url: &str) -> StepOutcome<f64> {
        if let Some(rate) = rate_from_text(description) {
            return StepOutcome::Found(rate);
        }
        let Some(source) = self.sources.iter().find(|s| s.handles(url)) else {
            return StepOutcome::Empty;
        };
        let outcome = source.lookup(pages, url, self.timeout).await;
        if let StepOutcome::Failed(reason) = &outcome {
            tracing::debug!(source = source.name(), %url, %reason, "acceptance-rate lookup failed");
        }
        outcome
    }
}
