use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::scan::normalize::html_to_text;
use crate::scan::types::RawPosting;
use crate::util::time::parse_posting_date;

/// Third-party job boards whose embedded state blob we know how to read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vendor {
    Workday,
    Greenhouse,
}

impl Vendor {
    /// Recognize a board by a substring of the URL that served the page.
    pub fn detect(url: &str) -> Option<Vendor> {
        let url = url.to_lowercase();
        if url.contains("workday.com") || url.contains("myworkdayjobs.com") {
            Some(Vendor::Workday)
        } else if url.contains("greenhouse.io") {
            Some(Vendor::Greenhouse)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Vendor::Workday => "workday",
            Vendor::Greenhouse => "greenhouse",
        }
    }

    /// Parse the vendor payload. Missing or malformed payloads are errors for
    /// the caller to log; they never abort the scan.
    pub fn extract(&self, html: &str, page_url: &str) -> Result<Vec<RawPosting>, String> {
        match self {
            Vendor::Workday => workday(html, page_url),
            Vendor::Greenhouse => greenhouse(html, page_url),
        }
    }
}

// ---------------------------------------------------------------------------
// Workday: `window.__INITIAL_STATE__ = {...};`
// ---------------------------------------------------------------------------

static WORKDAY_STATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"window\.__INITIAL_STATE__\s*=\s*").unwrap());

#[derive(Deserialize)]
struct WorkdayState {
    #[serde(default, rename = "jobPostings")]
    job_postings: Vec<WorkdayJob>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct WorkdayJob {
    title: Option<String>,
    description: Option<String>,
    posted_on: Option<String>,
    end_date: Option<String>,
    location: Option<Value>,
    external_url: Option<String>,
}

fn workday(html: &str, page_url: &str) -> Result<Vec<RawPosting>, String> {
    let start = WORKDAY_STATE.find(html).ok_or("no __INITIAL_STATE__ blob")?.end();
    // The blob is followed by more script; read exactly one JSON value.
    let state: WorkdayState = serde_json::Deserializer::from_str(&html[start..])
        .into_iter::<WorkdayState>()
        .next()
        .ok_or("empty __INITIAL_STATE__ blob")?
        .map_err(|e| format!("workday state: {e}"))?;

    Ok(state
        .job_postings
        .into_iter()
        .filter_map(|job| {
            let title = job.title.filter(|t| !t.trim().is_empty())?;
            let location = match job.location {
                Some(Value::String(s)) => Some(s),
                Some(other) => other.get("name").and_then(Value::as_str).map(str::to_string),
                None => None,
            };
            Some(RawPosting {
                title,
                description_text: job.description.as_deref().map(html_to_text).unwrap_or_default(),
                posted_at: job.posted_on.as_deref().and_then(parse_posting_date),
                valid_through: job.end_date.as_deref().and_then(parse_posting_date),
                raw_location_text: location,
                source_url: job.external_url.unwrap_or_else(|| page_url.to_string()),
                context: String::new(),
            })
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Greenhouse: `<script id="initial-state">{...}</script>`
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GreenhouseState {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GreenhouseJob {
    title: Option<String>,
    content: Option<String>,
    updated_at: Option<String>,
    location: Option<GreenhouseLocation>,
    absolute_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GreenhouseLocation {
    name: Option<String>,
}

fn greenhouse(html: &str, page_url: &str) -> Result<Vec<RawPosting>, String> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse("script#initial-state").map_err(|e| format!("{e:?}"))?;
    let raw = doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or("no initial-state script")?;
    let state: GreenhouseState = serde_json::from_str(raw.trim()).map_err(|e| format!("greenhouse state: {e}"))?;

    Ok(state
        .jobs
        .into_iter()
        .filter_map(|job| {
            let title = job.title.filter(|t| !t.trim().is_empty())?;
            Some(RawPosting {
                title,
                description_text: job.content.as_deref().map(html_to_text).unwrap_or_default(),
                posted_at: job.updated_at.as_deref().and_then(parse_posting_date),
                // Greenhouse boards publish no deadline
                valid_through: None,
                raw_location_text: job.location.and_then(|l| l.name),
                source_url: job.absolute_url.unwrap_or_else(|| page_url.to_string()),
                context: String::new(),
            })
        })
        .collect())
}
