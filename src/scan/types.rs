use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (company, URL) pair scheduled for a single scan pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Target {
    pub company_id: Uuid,
    pub company_name: String,
    pub url: String,
}

/// Extractor output before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawPosting {
    pub title: String,
    pub description_text: String,
    pub posted_at: Option<NaiveDate>,
    pub valid_through: Option<NaiveDate>,
    pub raw_location_text: Option<String>,
    pub source_url: String,
    /// Markup of the HTML fragment the posting came from; empty for structured sources.
    pub context: String,
}

/// A posting ready to persist.
///
/// `is_rolling` is derived from `due_date` so the two can never disagree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NormalizedJob {
    pub title: String,
    pub description: String,
    pub post_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub acceptance_rate: Option<f64>,
    pub key_skills: Vec<String>,
    pub visa_sponsorship: bool,
    pub location: String,
    pub term: Option<String>,
    pub url: String,
}

impl NormalizedJob {
    pub fn is_rolling(&self) -> bool { self.due_date.is_none() }

    /// Keeps the (0, 100] invariant; anything else is dropped to None.
    pub fn set_acceptance_rate(&mut self, rate: Option<f64>) {
        self.acceptance_rate = rate.filter(|r| *r > 0.0 && *r <= 100.0);
    }
}

/// Uniqueness key of a stored listing: (company, title, url-or-empty).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub company_id: Uuid,
    pub title: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredJobRecord {
    pub company_id: Uuid,
    pub job: NormalizedJob,
}

impl StoredJobRecord {
    pub fn key(&self) -> JobKey {
        JobKey { company_id: self.company_id, title: self.job.title.clone(), url: self.job.url.clone() }
    }
}

/// Outcome of one pipeline sub-step, inspected explicitly by the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome<T> {
    Found(T),
    Empty,
    Failed(String),
}

impl<T> StepOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            StepOutcome::Found(v) => Some(v),
            StepOutcome::Empty | StepOutcome::Failed(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StepOutcome::Found(_) => "found",
            StepOutcome::Empty => "empty",
            StepOutcome::Failed(_) => "failed",
        }
    }
}

/// Request body form of the scan invocation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default)]
    pub company_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub geographies: Option<Vec<String>>,
}

// Plan envelope types
#[derive(Serialize)]
pub struct ScanPlan { pub targets: usize, pub sample_targets: Vec<Target> }

// Apply/result envelope types
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TargetSummary {
    pub company_id: Uuid,
    pub url: String,
    pub fetch: &'static str,
    pub found: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_inserted: usize,
    pub total_skipped: usize,
    pub companies_processed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_target: Vec<TargetSummary>,
}
